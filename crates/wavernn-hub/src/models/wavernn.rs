//! WaveRNN vocoder parameter layout.

use serde::Serialize;

use crate::hparams::{HyperParameters, VocoderMode};
use crate::models::{ModelKind, ParameterSet, PretrainedModel};

/// Number of output classes when sampling from a mixture of logistics
pub const MOL_CLASSES: usize = 30;

/// Constructor arguments of the vocoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveRnnConfig {
    /// GRU width
    pub rnn_dims: usize,
    /// Fully connected width
    pub fc_dims: usize,
    /// Bit depth; sets the class count in RAW mode
    pub bits: u32,
    /// Resnet input padding
    pub pad: usize,
    /// Upsampling factor per stage
    pub upsample_factors: Vec<usize>,
    /// Mel bands of the conditioning input
    pub feat_dims: usize,
    /// Mel resnet width
    pub compute_dims: usize,
    /// Mel resnet output width
    pub res_out_dims: usize,
    /// Residual blocks in the mel resnet
    pub res_blocks: usize,
    /// Hop length in samples
    pub hop_length: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Output mode
    pub mode: VocoderMode,
}

impl WaveRnnConfig {
    /// Project the hyperparameter store onto the constructor arguments
    #[must_use]
    pub fn from_hparams(hp: &HyperParameters) -> Self {
        Self {
            rnn_dims: hp.voc_rnn_dims,
            fc_dims: hp.voc_fc_dims,
            bits: hp.bits,
            pad: hp.voc_pad,
            upsample_factors: hp.voc_upsample_factors.to_vec(),
            feat_dims: hp.num_mels,
            compute_dims: hp.voc_compute_dims,
            res_out_dims: hp.voc_res_out_dims,
            res_blocks: hp.voc_res_blocks,
            hop_length: hp.hop_length,
            sample_rate: hp.sample_rate,
            mode: hp.voc_mode,
        }
    }

    /// Width of the auxiliary conditioning slices
    #[must_use]
    pub const fn aux_dims(&self) -> usize {
        self.res_out_dims / 4
    }

    /// Size of the output layer
    #[must_use]
    pub fn n_classes(&self) -> usize {
        match self.mode {
            VocoderMode::Mol => MOL_CLASSES,
            VocoderMode::Raw => 1usize << self.bits,
        }
    }
}

/// WaveRNN vocoder
#[derive(Debug, Clone)]
pub struct WaveRnn {
    config: WaveRnnConfig,
    params: ParameterSet,
}

impl WaveRnn {
    /// Build the vocoder with freshly initialised parameters
    #[must_use]
    pub fn new(config: WaveRnnConfig) -> Self {
        let params = build_layout(&config);
        tracing::debug!(
            "Constructed WaveRNN ({} mode, {} tensors)",
            config.mode,
            params.len()
        );
        Self { config, params }
    }

    /// Build the vocoder from the hyperparameter store
    #[must_use]
    pub fn from_hparams(hp: &HyperParameters) -> Self {
        Self::new(WaveRnnConfig::from_hparams(hp))
    }

    /// Constructor arguments
    #[must_use]
    pub fn config(&self) -> &WaveRnnConfig {
        &self.config
    }

    /// Output mode
    #[must_use]
    pub fn mode(&self) -> VocoderMode {
        self.config.mode
    }

    /// Size of the output layer
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.config.n_classes()
    }
}

impl PretrainedModel for WaveRnn {
    fn kind(&self) -> ModelKind {
        ModelKind::WaveRnn
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }
}

fn build_layout(config: &WaveRnnConfig) -> ParameterSet {
    let mut params = ParameterSet::new();
    let aux = config.aux_dims();
    let kernel = config.pad * 2 + 1;
    let compute = config.compute_dims;

    // Mel resnet
    params
        .conv1d("upsample.resnet.conv_in", config.feat_dims, compute, kernel, false)
        .batch_norm("upsample.resnet.batch_norm", compute);
    for block in 0..config.res_blocks {
        let prefix = format!("upsample.resnet.layers.{block}");
        params
            .conv1d(&format!("{prefix}.conv1"), compute, compute, 1, false)
            .conv1d(&format!("{prefix}.conv2"), compute, compute, 1, false)
            .batch_norm(&format!("{prefix}.batch_norm1"), compute)
            .batch_norm(&format!("{prefix}.batch_norm2"), compute);
    }
    params.conv1d("upsample.resnet.conv_out", compute, config.res_out_dims, 1, true);

    // Stretch layers hold no weights, so convs sit at odd indices
    for (stage, scale) in config.upsample_factors.iter().enumerate() {
        let width = scale * 2 + 1;
        params.constant(
            format!("upsample.up_layers.{}.weight", stage * 2 + 1),
            &[1, 1, 1, width],
            1.0 / width as f32,
        );
    }

    params
        .linear("I", config.feat_dims + aux + 1, config.rnn_dims, true)
        .gru("rnn1", config.rnn_dims, config.rnn_dims, false)
        .gru("rnn2", config.rnn_dims + aux, config.rnn_dims, false)
        .linear("fc1", config.rnn_dims + aux, config.fc_dims, true)
        .linear("fc2", config.fc_dims + aux, config.fc_dims, true)
        .linear("fc3", config.fc_dims, config.n_classes(), true)
        .buffer("step".to_string(), &[1], 0.0);

    params
}
