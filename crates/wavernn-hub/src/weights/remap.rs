//! Architecture-specific rewrites applied to a bundle before loading.

use ndarray::ArrayD;

use crate::error::{HubError, HubResult};
use crate::weights::WeightBundle;

#[derive(Debug, Clone, PartialEq)]
enum RemapOp {
    Rename { from: String, to: String },
    Insert { key: String, value: ArrayD<f32> },
}

/// Ordered list of key rewrites
///
/// ```
/// use ndarray::arr0;
/// use wavernn_hub::weights::{KeyRemap, WeightBundle};
///
/// let mut bundle = WeightBundle::new();
/// bundle.insert("r".to_string(), arr0(2.0f32).into_dyn());
///
/// let remapped = KeyRemap::new()
///     .rename("r", "decoder.r")
///     .insert("stop_threshold", arr0(-3.4f32).into_dyn())
///     .apply(bundle)?;
///
/// assert!(remapped.contains_key("decoder.r"));
/// assert!(!remapped.contains_key("r"));
/// # Ok::<(), wavernn_hub::HubError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyRemap {
    ops: Vec<RemapOp>,
}

impl KeyRemap {
    /// Create an empty remap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the value stored under `from` to `to`
    ///
    /// Applying fails if `from` is absent.
    #[must_use]
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.ops.push(RemapOp::Rename {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Store `value` under `key`, replacing whatever the bundle held
    #[must_use]
    pub fn insert(mut self, key: impl Into<String>, value: ArrayD<f32>) -> Self {
        self.ops.push(RemapOp::Insert {
            key: key.into(),
            value,
        });
        self
    }

    /// Whether no rewrites are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the rewrites in order
    ///
    /// # Errors
    ///
    /// Returns `MissingKeys` if a renamed key is not in the bundle.
    pub fn apply(&self, mut bundle: WeightBundle) -> HubResult<WeightBundle> {
        for op in &self.ops {
            match op {
                RemapOp::Rename { from, to } => {
                    let value = bundle
                        .remove(from)
                        .ok_or_else(|| HubError::missing_keys(vec![from.clone()]))?;
                    tracing::debug!("Remapping '{}' -> '{}'", from, to);
                    bundle.insert(to.clone(), value);
                }
                RemapOp::Insert { key, value } => {
                    if bundle.insert(key.clone(), value.clone()).is_some() {
                        tracing::debug!("Overriding downloaded '{}'", key);
                    }
                }
            }
        }
        Ok(bundle)
    }
}
