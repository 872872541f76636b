//! Model architectures served by the hub
//!
//! Each model owns a [`ParameterSet`] whose names and shapes follow the
//! checkpoints it loads. Construction gives fresh values; pretrained weights
//! are applied through [`PretrainedModel::load_state_dict`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, HubResult};
use crate::weights::{KeyRemap, WeightBundle};

pub mod layout;
pub mod tacotron;
pub mod wavernn;

pub use layout::{ParameterSet, StateDictDiff};
pub use tacotron::{Tacotron, TacotronConfig};
pub use wavernn::{WaveRnn, WaveRnnConfig};

/// Architectures with published weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// WaveRNN vocoder
    WaveRnn,
    /// Tacotron text-to-spectrogram model
    Tacotron,
}

impl ModelKind {
    /// Every model the hub serves
    pub const ALL: [Self; 2] = [Self::WaveRnn, Self::Tacotron];

    /// Name used in URLs and local paths
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WaveRnn => "wavernn",
            Self::Tacotron => "tacotron",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| HubError::invalid_input(format!("Unknown model '{s}'")))
    }
}

/// A model that can receive pretrained weights
pub trait PretrainedModel: Send + Sync + std::fmt::Debug {
    /// Which architecture this is
    fn kind(&self) -> ModelKind;

    /// The model's named tensors
    fn parameters(&self) -> &ParameterSet;

    /// Mutable access for loading
    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Rewrites turning a downloaded bundle into this model's key layout
    fn pretrained_remap(&self) -> KeyRemap {
        KeyRemap::new()
    }

    /// Replace all parameters with `bundle`
    ///
    /// # Errors
    ///
    /// Returns `MissingKeys`, `UnexpectedKeys` or `ShapeMismatch` if the
    /// bundle does not match the model exactly. Nothing is modified then.
    fn load_state_dict(&mut self, bundle: WeightBundle) -> HubResult<()> {
        self.parameters_mut().load(bundle)
    }

    /// Copy of all named tensors
    fn state_dict(&self) -> WeightBundle {
        self.parameters().state_dict()
    }

    /// Trainable element count
    fn num_params(&self) -> usize {
        self.parameters().num_params()
    }

    /// Training step stored in the checkpoint
    fn step(&self) -> u64 {
        self.parameters()
            .get("step")
            .and_then(|step| step.iter().next().copied())
            .map_or(0, |step| step.max(0.0) as u64)
    }
}
