//! Factories returning models, optionally loaded with pretrained weights.

use tracing::{info, warn};

use crate::config::HubConfig;
use crate::error::HubResult;
use crate::hparams::hparams;
use crate::models::{PretrainedModel, Tacotron, WaveRnn};
use crate::weights::WeightFetcher;

/// Model factories bound to one weight source
///
/// A hub keeps no state between calls: every pretrained request downloads
/// the weights again.
#[derive(Debug, Clone)]
pub struct Hub {
    fetcher: WeightFetcher,
}

impl Hub {
    /// Create a hub for the given configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid, or
    /// `NetworkError` if the HTTP client cannot be initialised.
    pub fn new(config: HubConfig) -> HubResult<Self> {
        Ok(Self {
            fetcher: WeightFetcher::new(config)?,
        })
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        self.fetcher.config()
    }

    /// Fetcher used for pretrained weights
    #[must_use]
    pub fn fetcher(&self) -> &WeightFetcher {
        &self.fetcher
    }

    /// WaveRNN vocoder built from the hyperparameter store
    ///
    /// # Errors
    ///
    /// With `pretrained`, any fetch error, or a key/shape mismatch between
    /// the download and the model.
    pub fn wave_rnn(&self, pretrained: bool) -> HubResult<WaveRnn> {
        self.build(WaveRnn::from_hparams(hparams()), pretrained)
    }

    /// Tacotron built from the hyperparameter store
    ///
    /// Pretrained checkpoints have `r` moved to `decoder.r` and their
    /// `stop_threshold` replaced by the store's value.
    ///
    /// # Errors
    ///
    /// With `pretrained`, any fetch error, `MissingKeys` if the download
    /// lacks `r`, or a key/shape mismatch.
    pub fn tacotron(&self, pretrained: bool) -> HubResult<Tacotron> {
        self.build(Tacotron::from_hparams(hparams()), pretrained)
    }

    fn build<M: PretrainedModel>(&self, mut model: M, pretrained: bool) -> HubResult<M> {
        if !pretrained {
            info!("Created {} with fresh parameters", model.kind());
            return Ok(model);
        }

        let kind = model.kind();
        let bundle = self.fetcher.fetch(kind)?;
        let bundle = model.pretrained_remap().apply(bundle)?;

        if let Err(e) = model.load_state_dict(bundle) {
            warn!("Pretrained weights for {} do not fit the model: {}", kind, e);
            return Err(e);
        }

        info!(
            "Created pretrained {} (step {}, {} parameters)",
            kind,
            model.step(),
            model.num_params()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    // Port 1 on loopback refuses connections, so any download attempt fails.
    fn offline_hub() -> Hub {
        Hub::new(HubConfig::default().with_base_url("http://127.0.0.1:1/pretrained")).unwrap()
    }

    #[test]
    fn test_fresh_models_skip_network() {
        let hub = offline_hub();

        let vocoder = hub.wave_rnn(false).unwrap();
        assert_eq!(vocoder.kind(), ModelKind::WaveRnn);
        assert_eq!(vocoder.step(), 0);

        let tts = hub.tacotron(false).unwrap();
        assert_eq!(tts.r(), 1);
    }

    #[test]
    fn test_pretrained_fails_without_host() {
        let hub = offline_hub();
        let err = hub.wave_rnn(true).unwrap_err();
        assert!(err.is_retriable());
        assert_eq!(err.category(), "network");
    }

    #[test]
    fn test_config_accessors() {
        let hub = offline_hub();
        assert_eq!(hub.config().base_url, "http://127.0.0.1:1/pretrained");
        assert_eq!(hub.fetcher().config(), hub.config());
    }
}
