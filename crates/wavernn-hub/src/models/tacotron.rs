//! Tacotron parameter layout.
//!
//! Published checkpoints predate the decoder owning the reduction factor and
//! store it at the top level as `r`; [`Tacotron::pretrained_remap`] moves it to
//! `decoder.r` and pins `stop_threshold` to the configured value.

use ndarray::arr0;
use serde::Serialize;

use crate::error::{HubError, HubResult};
use crate::hparams::HyperParameters;
use crate::models::{ModelKind, ParameterSet, PretrainedModel};
use crate::weights::KeyRemap;

/// Largest reduction factor the decoder's projection supports
pub const MAX_R: usize = 20;

const PRENET_FC1_DIMS: usize = 256;
const PRENET_FC2_DIMS: usize = 128;
const POSTNET_PROJ_DIMS: usize = 256;
const LSA_FILTERS: usize = 32;
const LSA_KERNEL: usize = 31;

/// Constructor arguments of the TTS model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TacotronConfig {
    /// Symbol embedding width
    pub embed_dims: usize,
    /// Vocabulary size
    pub num_chars: usize,
    /// Encoder CBHG width
    pub encoder_dims: usize,
    /// Decoder width
    pub decoder_dims: usize,
    /// Mel bands produced per frame
    pub n_mels: usize,
    /// Width of the linear-spectrogram output
    pub fft_bins: usize,
    /// Postnet CBHG width
    pub postnet_dims: usize,
    /// Encoder conv bank size
    pub encoder_k: usize,
    /// Decoder LSTM width
    pub lstm_dims: usize,
    /// Postnet conv bank size
    pub postnet_k: usize,
    /// Highway layers per CBHG
    pub num_highways: usize,
    /// Dropout probability
    pub dropout: f32,
    /// Generation stop threshold
    pub stop_threshold: f32,
}

impl TacotronConfig {
    /// Project the hyperparameter store onto the constructor arguments
    ///
    /// The vocabulary size is the length of the symbol table. `fft_bins`
    /// receives `num_mels`, matching the published checkpoints.
    #[must_use]
    pub fn from_hparams(hp: &HyperParameters) -> Self {
        Self {
            embed_dims: hp.tts_embed_dims,
            num_chars: crate::text::symbols().len(),
            encoder_dims: hp.tts_encoder_dims,
            decoder_dims: hp.tts_decoder_dims,
            n_mels: hp.num_mels,
            fft_bins: hp.num_mels,
            postnet_dims: hp.tts_postnet_dims,
            encoder_k: hp.tts_encoder_k,
            lstm_dims: hp.tts_lstm_dims,
            postnet_k: hp.tts_postnet_k,
            num_highways: hp.tts_num_highways,
            dropout: hp.tts_dropout,
            stop_threshold: hp.tts_stop_threshold,
        }
    }
}

/// Tacotron text-to-spectrogram model
#[derive(Debug, Clone)]
pub struct Tacotron {
    config: TacotronConfig,
    params: ParameterSet,
}

impl Tacotron {
    /// Build the model with freshly initialised parameters
    #[must_use]
    pub fn new(config: TacotronConfig) -> Self {
        let params = build_layout(&config);
        tracing::debug!(
            "Constructed Tacotron ({} symbols, {} tensors)",
            config.num_chars,
            params.len()
        );
        Self { config, params }
    }

    /// Build the model from the hyperparameter store
    #[must_use]
    pub fn from_hparams(hp: &HyperParameters) -> Self {
        Self::new(TacotronConfig::from_hparams(hp))
    }

    /// Constructor arguments
    #[must_use]
    pub fn config(&self) -> &TacotronConfig {
        &self.config
    }

    /// Current reduction factor (frames per decoder step)
    #[must_use]
    pub fn r(&self) -> usize {
        self.scalar("decoder.r") as usize
    }

    /// Change the reduction factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `1 <= r <= MAX_R`.
    pub fn set_r(&mut self, r: usize) -> HubResult<()> {
        if !(1..=MAX_R).contains(&r) {
            return Err(HubError::invalid_input(format!(
                "Reduction factor must be between 1 and {MAX_R}, got {r}"
            )));
        }
        self.params.set_buffer("decoder.r", arr0(r as f32).into_dyn())
    }

    /// Stop threshold stored with the parameters
    #[must_use]
    pub fn stop_threshold(&self) -> f32 {
        self.scalar("stop_threshold")
    }

    fn scalar(&self, name: &str) -> f32 {
        self.params
            .get(name)
            .and_then(|value| value.iter().next().copied())
            .unwrap_or_default()
    }
}

impl PretrainedModel for Tacotron {
    fn kind(&self) -> ModelKind {
        ModelKind::Tacotron
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn pretrained_remap(&self) -> KeyRemap {
        KeyRemap::new()
            .rename("r", "decoder.r")
            .insert("stop_threshold", arr0(self.config.stop_threshold).into_dyn())
    }
}

fn build_layout(config: &TacotronConfig) -> ParameterSet {
    let mut params = ParameterSet::new();
    let decoder = config.decoder_dims;
    let lstm = config.lstm_dims;

    // Encoder
    params
        .embedding("encoder.embedding", config.num_chars, config.embed_dims)
        .linear("encoder.pre_net.fc1", config.embed_dims, PRENET_FC1_DIMS, true)
        .linear("encoder.pre_net.fc2", PRENET_FC1_DIMS, PRENET_FC2_DIMS, true);
    cbhg(
        &mut params,
        "encoder.cbhg",
        config.encoder_k,
        config.encoder_dims,
        config.encoder_dims,
        [config.encoder_dims, config.encoder_dims],
        config.num_highways,
    );
    params.linear("encoder_proj", decoder, decoder, false);

    // Decoder
    params
        .buffer("decoder.r".to_string(), &[], 1.0)
        .linear("decoder.prenet.fc1", config.n_mels, PRENET_FC1_DIMS, true)
        .linear("decoder.prenet.fc2", PRENET_FC1_DIMS, PRENET_FC2_DIMS, true)
        .conv1d("decoder.attn_net.conv", 2, LSA_FILTERS, LSA_KERNEL, true)
        .linear("decoder.attn_net.L", LSA_FILTERS, decoder, false)
        .linear("decoder.attn_net.W", decoder, decoder, true)
        .linear("decoder.attn_net.v", decoder, 1, false)
        .gru_cell("decoder.attn_rnn", decoder + decoder / 2, decoder)
        .linear("decoder.rnn_input", 2 * decoder, lstm, true)
        .lstm_cell("decoder.res_rnn1", lstm, lstm)
        .lstm_cell("decoder.res_rnn2", lstm, lstm)
        .linear("decoder.mel_proj", lstm, config.n_mels * MAX_R, false)
        .linear("decoder.stop_proj", decoder + lstm, 1, true);

    // Postnet
    cbhg(
        &mut params,
        "postnet",
        config.postnet_k,
        config.n_mels,
        config.postnet_dims,
        [POSTNET_PROJ_DIMS, config.fft_bins],
        config.num_highways,
    );
    params
        .linear("post_proj", config.postnet_dims * 2, config.fft_bins, false)
        .buffer("step".to_string(), &[1], 0.0)
        .buffer("stop_threshold".to_string(), &[], config.stop_threshold);

    params
}

// Conv bank, projections, highways and a bidirectional GRU.
fn cbhg(
    params: &mut ParameterSet,
    prefix: &str,
    bank_size: usize,
    in_channels: usize,
    channels: usize,
    proj_channels: [usize; 2],
    num_highways: usize,
) {
    for (index, kernel) in (1..=bank_size).enumerate() {
        batch_norm_conv(params, &format!("{prefix}.conv1d_bank.{index}"), in_channels, channels, kernel);
    }
    batch_norm_conv(params, &format!("{prefix}.conv_project1"), bank_size * channels, proj_channels[0], 3);
    batch_norm_conv(params, &format!("{prefix}.conv_project2"), proj_channels[0], proj_channels[1], 3);

    if proj_channels[1] != channels {
        params.linear(&format!("{prefix}.pre_highway"), proj_channels[1], channels, false);
    }

    for index in 0..num_highways {
        let highway = format!("{prefix}.highways.{index}");
        params
            .linear(&format!("{highway}.W1"), channels, channels, true)
            .linear(&format!("{highway}.W2"), channels, channels, true);
    }

    params.gru(&format!("{prefix}.rnn"), channels, channels, true);
}

fn batch_norm_conv(params: &mut ParameterSet, prefix: &str, input: usize, output: usize, kernel: usize) {
    params
        .conv1d(&format!("{prefix}.conv"), input, output, kernel, false)
        .batch_norm(&format!("{prefix}.bnorm"), output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hparams::hparams;

    #[test]
    fn test_config_from_hparams() {
        let config = TacotronConfig::from_hparams(hparams());
        assert_eq!(config.num_chars, crate::text::symbols().len());
        assert_eq!(config.fft_bins, hparams().num_mels);
        assert_eq!(config.encoder_k, 16);
        assert!((config.stop_threshold - -3.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_layout_shapes() {
        let model = Tacotron::from_hparams(hparams());
        let params = model.parameters();

        assert_eq!(params.get("encoder.embedding.weight").unwrap().shape(), &[148, 256]);
        assert_eq!(params.get("encoder.cbhg.conv1d_bank.15.conv.weight").unwrap().shape(), &[128, 128, 16]);
        assert_eq!(params.get("encoder.cbhg.conv_project1.conv.weight").unwrap().shape(), &[128, 2048, 3]);
        assert_eq!(params.get("encoder.cbhg.rnn.weight_ih_l0_reverse").unwrap().shape(), &[384, 128]);
        assert!(params.get("encoder.cbhg.pre_highway.weight").is_none());
        assert_eq!(params.get("decoder.attn_rnn.weight_ih").unwrap().shape(), &[768, 384]);
        assert_eq!(params.get("decoder.mel_proj.weight").unwrap().shape(), &[1600, 512]);
        assert_eq!(params.get("decoder.stop_proj.weight").unwrap().shape(), &[1, 768]);
        assert_eq!(params.get("postnet.pre_highway.weight").unwrap().shape(), &[128, 80]);
        assert_eq!(params.get("post_proj.weight").unwrap().shape(), &[80, 256]);
        assert_eq!(params.get("decoder.r").unwrap().ndim(), 0);
    }

    #[test]
    fn test_fresh_buffers() {
        let model = Tacotron::from_hparams(hparams());
        assert_eq!(model.r(), 1);
        assert_eq!(model.step(), 0);
        assert!((model.stop_threshold() - hparams().tts_stop_threshold).abs() < f32::EPSILON);
        assert!(model.parameters().is_buffer("decoder.r"));
        assert!(model.parameters().is_buffer("stop_threshold"));
    }

    #[test]
    fn test_set_r_bounds() {
        let mut model = Tacotron::from_hparams(hparams());
        model.set_r(7).unwrap();
        assert_eq!(model.r(), 7);

        assert!(matches!(model.set_r(0), Err(HubError::InvalidInput { .. })));
        assert!(matches!(model.set_r(MAX_R + 1), Err(HubError::InvalidInput { .. })));
        assert_eq!(model.r(), 7);
    }

    #[test]
    fn test_pretrained_remap() {
        let model = Tacotron::from_hparams(hparams());
        let mut checkpoint = model.state_dict();
        let r = checkpoint.remove("decoder.r").unwrap();
        checkpoint.insert("r".to_string(), r);
        checkpoint.insert("stop_threshold".to_string(), arr0(0.0f32).into_dyn());

        let remapped = model.pretrained_remap().apply(checkpoint).unwrap();
        assert!(model.parameters().diff(&remapped).is_empty());
        assert_eq!(remapped["stop_threshold"], arr0(-3.4f32).into_dyn());
    }
}
