//! Named parameter storage shared by the model implementations.
//!
//! A [`ParameterSet`] mirrors a PyTorch state dict: trainable tensors and
//! non-trainable buffers under dotted names. Layer helpers register the
//! tensors a layer owns with their shapes and initial values.

use std::collections::BTreeSet;

use ndarray::{ArrayD, IxDyn};
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use ndarray_rand::RandomExt;

use crate::error::{HubError, HubResult};
use crate::weights::WeightBundle;

/// Differences between a model's parameters and a bundle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StateDictDiff {
    /// Names the model declares but the bundle lacks
    pub missing_keys: Vec<String>,
    /// Names the bundle carries but the model does not declare
    pub unexpected_keys: Vec<String>,
    /// `(key, expected_shape, loaded_shape)` for names present in both
    pub shape_mismatches: Vec<(String, Vec<usize>, Vec<usize>)>,
}

impl StateDictDiff {
    /// Returns true if the bundle can be loaded as-is
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_keys.is_empty()
            && self.unexpected_keys.is_empty()
            && self.shape_mismatches.is_empty()
    }

    /// Convert the first class of difference into an error
    ///
    /// # Errors
    ///
    /// Returns `MissingKeys`, then `UnexpectedKeys`, then `ShapeMismatch`,
    /// whichever is non-empty first.
    pub fn into_result(self) -> HubResult<()> {
        if !self.missing_keys.is_empty() {
            return Err(HubError::missing_keys(self.missing_keys));
        }
        if !self.unexpected_keys.is_empty() {
            return Err(HubError::unexpected_keys(self.unexpected_keys));
        }
        if let Some((key, expected, actual)) = self.shape_mismatches.into_iter().next() {
            return Err(HubError::ShapeMismatch { key, expected, actual });
        }
        Ok(())
    }
}

/// Named tensors owned by a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    tensors: WeightBundle,
    buffers: BTreeSet<String>,
}

impl ParameterSet {
    /// Create an empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a tensor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors.get(name)
    }

    /// Number of named tensors, buffers included
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether no tensors are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Tensor names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Whether `name` is a non-trainable buffer
    #[must_use]
    pub fn is_buffer(&self, name: &str) -> bool {
        self.buffers.contains(name)
    }

    /// Borrow all tensors as a bundle
    #[must_use]
    pub fn as_bundle(&self) -> &WeightBundle {
        &self.tensors
    }

    /// Copy all tensors into a new bundle
    #[must_use]
    pub fn state_dict(&self) -> WeightBundle {
        self.tensors.clone()
    }

    /// Element count over trainable tensors
    #[must_use]
    pub fn num_params(&self) -> usize {
        self.tensors
            .iter()
            .filter(|(name, _)| !self.buffers.contains(name.as_str()))
            .map(|(_, tensor)| tensor.len())
            .sum()
    }

    /// Compare against a bundle without modifying anything
    #[must_use]
    pub fn diff(&self, bundle: &WeightBundle) -> StateDictDiff {
        let mut diff = StateDictDiff::default();

        for (key, expected) in &self.tensors {
            match bundle.get(key) {
                None => diff.missing_keys.push(key.clone()),
                Some(actual) if actual.shape() != expected.shape() => {
                    diff.shape_mismatches.push((
                        key.clone(),
                        expected.shape().to_vec(),
                        actual.shape().to_vec(),
                    ));
                }
                Some(_) => {}
            }
        }

        diff.unexpected_keys = bundle
            .keys()
            .filter(|key| !self.tensors.contains_key(*key))
            .cloned()
            .collect();

        diff
    }

    /// Replace every tensor with the bundle's
    ///
    /// The bundle must match exactly; on error nothing is modified.
    ///
    /// # Errors
    ///
    /// Returns `MissingKeys`, `UnexpectedKeys` or `ShapeMismatch`.
    pub fn load(&mut self, bundle: WeightBundle) -> HubResult<()> {
        self.diff(&bundle).into_result()?;
        self.tensors = bundle;
        Ok(())
    }

    /// Overwrite a registered buffer
    pub(crate) fn set_buffer(&mut self, name: &str, value: ArrayD<f32>) -> HubResult<()> {
        let slot = match self.tensors.get_mut(name) {
            Some(slot) if self.buffers.contains(name) => slot,
            _ => return Err(HubError::invalid_input(format!("No buffer named '{name}'"))),
        };
        if slot.shape() != value.shape() {
            return Err(HubError::shape_mismatch(name, slot.shape(), value.shape()));
        }
        *slot = value;
        Ok(())
    }

    /// Trainable tensor drawn from U(-1/sqrt(fan_in), 1/sqrt(fan_in))
    pub(crate) fn uniform(&mut self, name: String, shape: &[usize], fan_in: usize) -> &mut Self {
        let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
        let tensor = ArrayD::random(IxDyn(shape), Uniform::new(-bound, bound));
        self.tensors.insert(name, tensor);
        self
    }

    /// Trainable tensor filled with `value`
    pub(crate) fn constant(&mut self, name: String, shape: &[usize], value: f32) -> &mut Self {
        self.tensors.insert(name, ArrayD::from_elem(IxDyn(shape), value));
        self
    }

    /// Non-trainable tensor filled with `value`
    pub(crate) fn buffer(&mut self, name: String, shape: &[usize], value: f32) -> &mut Self {
        self.tensors.insert(name.clone(), ArrayD::from_elem(IxDyn(shape), value));
        self.buffers.insert(name);
        self
    }

    pub(crate) fn linear(&mut self, prefix: &str, input: usize, output: usize, bias: bool) -> &mut Self {
        self.uniform(format!("{prefix}.weight"), &[output, input], input);
        if bias {
            self.uniform(format!("{prefix}.bias"), &[output], input);
        }
        self
    }

    pub(crate) fn conv1d(
        &mut self,
        prefix: &str,
        input: usize,
        output: usize,
        kernel: usize,
        bias: bool,
    ) -> &mut Self {
        let fan_in = input * kernel;
        self.uniform(format!("{prefix}.weight"), &[output, input, kernel], fan_in);
        if bias {
            self.uniform(format!("{prefix}.bias"), &[output], fan_in);
        }
        self
    }

    pub(crate) fn batch_norm(&mut self, prefix: &str, features: usize) -> &mut Self {
        self.constant(format!("{prefix}.weight"), &[features], 1.0)
            .constant(format!("{prefix}.bias"), &[features], 0.0)
            .buffer(format!("{prefix}.running_mean"), &[features], 0.0)
            .buffer(format!("{prefix}.running_var"), &[features], 1.0)
            .buffer(format!("{prefix}.num_batches_tracked"), &[], 0.0)
    }

    pub(crate) fn embedding(&mut self, prefix: &str, count: usize, dims: usize) -> &mut Self {
        let tensor = ArrayD::random(IxDyn(&[count, dims]), StandardNormal);
        self.tensors.insert(format!("{prefix}.weight"), tensor);
        self
    }

    pub(crate) fn gru(&mut self, prefix: &str, input: usize, hidden: usize, bidirectional: bool) -> &mut Self {
        self.recurrent(prefix, "_l0", 3, input, hidden);
        if bidirectional {
            self.recurrent(prefix, "_l0_reverse", 3, input, hidden);
        }
        self
    }

    pub(crate) fn gru_cell(&mut self, prefix: &str, input: usize, hidden: usize) -> &mut Self {
        self.recurrent(prefix, "", 3, input, hidden)
    }

    pub(crate) fn lstm_cell(&mut self, prefix: &str, input: usize, hidden: usize) -> &mut Self {
        self.recurrent(prefix, "", 4, input, hidden)
    }

    // Gate weights of GRU (3 gates) and LSTM (4 gates) layers.
    fn recurrent(&mut self, prefix: &str, suffix: &str, gates: usize, input: usize, hidden: usize) -> &mut Self {
        let rows = gates * hidden;
        self.uniform(format!("{prefix}.weight_ih{suffix}"), &[rows, input], hidden)
            .uniform(format!("{prefix}.weight_hh{suffix}"), &[rows, hidden], hidden)
            .uniform(format!("{prefix}.bias_ih{suffix}"), &[rows], hidden)
            .uniform(format!("{prefix}.bias_hh{suffix}"), &[rows], hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr0;

    fn small_set() -> ParameterSet {
        let mut params = ParameterSet::new();
        params.linear("fc", 4, 2, true).batch_norm("bn", 2);
        params
    }

    #[test]
    fn test_layer_shapes() {
        let params = small_set();
        assert_eq!(params.get("fc.weight").unwrap().shape(), &[2, 4]);
        assert_eq!(params.get("fc.bias").unwrap().shape(), &[2]);
        assert_eq!(params.get("bn.num_batches_tracked").unwrap().ndim(), 0);
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn test_num_params_skips_buffers() {
        let params = small_set();
        assert!(params.is_buffer("bn.running_var"));
        assert!(!params.is_buffer("bn.weight"));
        // fc: 8 + 2, bn affine: 2 + 2
        assert_eq!(params.num_params(), 14);
    }

    #[test]
    fn test_uniform_init_within_bound() {
        let mut params = ParameterSet::new();
        params.linear("fc", 16, 8, false);
        let bound = 0.25;
        assert!(params.get("fc.weight").unwrap().iter().all(|v| v.abs() <= bound));
    }

    #[test]
    fn test_recurrent_shapes() {
        let mut params = ParameterSet::new();
        params.gru("rnn", 10, 6, true).lstm_cell("cell", 6, 4);

        assert_eq!(params.get("rnn.weight_ih_l0").unwrap().shape(), &[18, 10]);
        assert_eq!(params.get("rnn.weight_hh_l0_reverse").unwrap().shape(), &[18, 6]);
        assert_eq!(params.get("cell.weight_ih").unwrap().shape(), &[16, 6]);
        assert_eq!(params.get("cell.bias_hh").unwrap().shape(), &[16]);
    }

    #[test]
    fn test_diff_reports_every_mismatch() {
        let params = small_set();
        let mut bundle = params.state_dict();
        bundle.remove("fc.bias");
        bundle.insert("extra".to_string(), arr0(1.0f32).into_dyn());
        bundle.insert("fc.weight".to_string(), ArrayD::zeros(IxDyn(&[4, 2])));

        let diff = params.diff(&bundle);
        assert_eq!(diff.missing_keys, vec!["fc.bias".to_string()]);
        assert_eq!(diff.unexpected_keys, vec!["extra".to_string()]);
        assert_eq!(
            diff.shape_mismatches,
            vec![("fc.weight".to_string(), vec![2, 4], vec![4, 2])]
        );
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_failed_load_leaves_parameters_untouched() {
        let mut params = small_set();
        let before = params.clone();

        let mut bundle = params.state_dict();
        bundle.remove("bn.running_mean");
        let err = params.load(bundle).unwrap_err();

        assert_eq!(err, HubError::missing_keys(vec!["bn.running_mean".to_string()]));
        assert_eq!(params, before);
    }

    #[test]
    fn test_shape_mismatch_error() {
        let mut params = small_set();
        let mut bundle = params.state_dict();
        bundle.insert("bn.weight".to_string(), ArrayD::zeros(IxDyn(&[3])));

        assert_eq!(
            params.load(bundle),
            Err(HubError::shape_mismatch("bn.weight", &[2], &[3]))
        );
    }

    #[test]
    fn test_exact_load_replaces_values() {
        let mut params = small_set();
        let mut bundle = params.state_dict();
        bundle.insert("fc.bias".to_string(), ndarray::arr1(&[7.0f32, 8.0]).into_dyn());

        params.load(bundle.clone()).unwrap();
        assert_eq!(params.as_bundle(), &bundle);
    }

    #[test]
    fn test_set_buffer() {
        let mut params = small_set();
        params.set_buffer("bn.num_batches_tracked", arr0(5.0f32).into_dyn()).unwrap();
        assert_eq!(params.get("bn.num_batches_tracked").unwrap(), &arr0(5.0f32).into_dyn());

        assert!(params.set_buffer("fc.weight", arr0(1.0f32).into_dyn()).is_err());
        assert!(params.set_buffer("bn.running_mean", arr0(1.0f32).into_dyn()).is_err());
    }
}
