//! # WaveRNN Hub
//!
//! Entry points for the pretrained WaveRNN vocoder and Tacotron TTS model.
//!
//! ## Features
//!
//! - One immutable hyperparameter store shared by every model
//! - Model factories that download the latest published weights on request
//! - PyTorch checkpoint and safetensors weight files, key remapping and strict loading
//! - Text front end turning text or ARPAbet into Tacotron symbol ids
//!
//! ## Example
//!
//! ```rust,no_run
//! use wavernn_hub::{hparams, tacotron, text_to_sequence_converter, wave_rnn};
//!
//! fn main() -> wavernn_hub::HubResult<()> {
//!     let vocoder = wave_rnn(true)?;
//!     let tts = tacotron(true)?;
//!     let to_ids = text_to_sequence_converter();
//!
//!     let ids = to_ids("Hello, world!", hparams().tts_cleaner_names)?;
//!     println!("{} symbols, vocoder mode {}, r = {}", ids.len(), vocoder.mode(), tts.r());
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod hparams;
pub mod hub;
pub mod models;
pub mod text;
pub mod weights;

// Re-export main types for convenience
pub use config::HubConfig;
pub use error::{HubError, HubResult};
pub use hparams::{hparams, HyperParameters, VocoderMode};
pub use hub::Hub;
pub use models::{ModelKind, PretrainedModel, Tacotron, TacotronConfig, WaveRnn, WaveRnnConfig};
pub use text::{sequence_to_text, text_to_sequence, TextToSequence};
pub use weights::{KeyRemap, WeightBundle, WeightFetcher};

/// Version information for the wavernn-hub crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WaveRNN vocoder from the default hub
///
/// # Errors
///
/// See [`Hub::wave_rnn`].
pub fn wave_rnn(pretrained: bool) -> HubResult<WaveRnn> {
    Hub::new(HubConfig::default())?.wave_rnn(pretrained)
}

/// Tacotron from the default hub
///
/// # Errors
///
/// See [`Hub::tacotron`].
pub fn tacotron(pretrained: bool) -> HubResult<Tacotron> {
    Hub::new(HubConfig::default())?.tacotron(pretrained)
}

/// The text-to-symbol-ids conversion used by the Tacotron encoder
#[must_use]
pub fn text_to_sequence_converter() -> TextToSequence {
    text_to_sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_is_text_to_sequence() {
        let convert = text_to_sequence_converter();
        assert_eq!(
            convert("Hello", &["english_cleaners"]).unwrap(),
            text_to_sequence("Hello", &["english_cleaners"]).unwrap()
        );
    }

    #[test]
    fn test_fresh_factories() {
        assert_eq!(wave_rnn(false).unwrap().kind(), ModelKind::WaveRnn);
        assert_eq!(tacotron(false).unwrap().kind(), ModelKind::Tacotron);
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
