//! Hyperparameters shared by the vocoder and the TTS model.
//!
//! The store is a single `static` value: every accessor hands out the same
//! `&'static` reference and nothing mutates it after the process starts.

use serde::Serialize;

/// Output distribution of the vocoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VocoderMode {
    /// Softmax over the raw quantized bits
    Raw,
    /// Sample from a mixture of logistics
    Mol,
}

impl VocoderMode {
    /// Get the mode name as used in checkpoints
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::Mol => "MOL",
        }
    }
}

impl std::fmt::Display for VocoderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One phase of the progressive Tacotron training schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingPhase {
    /// Reduction factor (frames per decoder step)
    pub r: usize,
    /// Learning rate
    pub lr: f64,
    /// Step at which this phase ends
    pub step: u64,
    /// Batch size
    pub batch_size: usize,
}

/// Hyperparameter record for both architectures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HyperParameters {
    // Settings for all models
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// FFT size
    pub n_fft: usize,
    /// Number of FFT bins (`n_fft / 2 + 1`)
    pub fft_bins: usize,
    /// Number of mel bands
    pub num_mels: usize,
    /// Hop length in samples (12.5ms)
    pub hop_length: usize,
    /// Window length in samples (50ms)
    pub win_length: usize,
    /// Lowest mel filter frequency
    pub fmin: u32,
    /// Spectrogram floor in dB
    pub min_level_db: i32,
    /// Reference level in dB
    pub ref_level_db: i32,
    /// Bit depth of the quantized signal
    pub bits: u32,
    /// Whether mu-law companding is applied
    pub mu_law: bool,
    /// Whether each wav is normalised to its peak
    pub peak_norm: bool,

    // Vocoder model
    /// Vocoder output mode
    pub voc_mode: VocoderMode,
    /// Upsampling factors; their product must equal `hop_length`
    pub voc_upsample_factors: &'static [usize],
    /// GRU width
    pub voc_rnn_dims: usize,
    /// Fully connected width
    pub voc_fc_dims: usize,
    /// Mel residual network width
    pub voc_compute_dims: usize,
    /// Mel residual network output width
    pub voc_res_out_dims: usize,
    /// Number of residual blocks
    pub voc_res_blocks: usize,

    // Vocoder training
    /// Batch size
    pub voc_batch_size: usize,
    /// Learning rate
    pub voc_lr: f64,
    /// Steps between checkpoints
    pub voc_checkpoint_every: u64,
    /// Samples generated at each checkpoint
    pub voc_gen_at_checkpoint: usize,
    /// Total training steps
    pub voc_total_steps: u64,
    /// Held-out test samples
    pub voc_test_samples: usize,
    /// Input padding so the resnet sees wider than the input
    pub voc_pad: usize,
    /// Training sequence length, a multiple of `hop_length`
    pub voc_seq_len: usize,
    /// Gradient clipping norm, `None` to disable
    pub voc_clip_grad_norm: Option<f32>,

    // Vocoder generation
    /// Batched single-utterance generation
    pub voc_gen_batched: bool,
    /// Samples generated per batch entry
    pub voc_target: usize,
    /// Crossfade samples between batch entries
    pub voc_overlap: usize,

    // TTS model
    /// Grapheme/phoneme embedding width
    pub tts_embed_dims: usize,
    /// Encoder width
    pub tts_encoder_dims: usize,
    /// Decoder width
    pub tts_decoder_dims: usize,
    /// Postnet width
    pub tts_postnet_dims: usize,
    /// Encoder conv bank size
    pub tts_encoder_k: usize,
    /// Decoder LSTM width
    pub tts_lstm_dims: usize,
    /// Postnet conv bank size
    pub tts_postnet_k: usize,
    /// Highway layers per CBHG
    pub tts_num_highways: usize,
    /// Dropout probability
    pub tts_dropout: f32,
    /// Text cleaners applied before symbol lookup
    pub tts_cleaner_names: &'static [&'static str],
    /// Generation stops at the first frame with all values below this
    pub tts_stop_threshold: f32,

    // TTS training
    /// Progressive training schedule
    pub tts_schedule: &'static [TrainingPhase],
    /// Longest spectrogram kept for training
    pub tts_max_mel_len: usize,
    /// Bin spectrogram lengths in the data loader
    pub tts_bin_lengths: bool,
}

const HOP_LENGTH: usize = 275;
const N_FFT: usize = 2048;

static HPARAMS: HyperParameters = HyperParameters {
    sample_rate: 22050,
    n_fft: N_FFT,
    fft_bins: N_FFT / 2 + 1,
    num_mels: 80,
    hop_length: HOP_LENGTH,
    win_length: 1100,
    fmin: 40,
    min_level_db: -100,
    ref_level_db: 20,
    bits: 9,
    mu_law: true,
    peak_norm: false,

    voc_mode: VocoderMode::Mol,
    voc_upsample_factors: &[5, 5, 11],
    voc_rnn_dims: 512,
    voc_fc_dims: 512,
    voc_compute_dims: 128,
    voc_res_out_dims: 128,
    voc_res_blocks: 10,

    voc_batch_size: 32,
    voc_lr: 1e-4,
    voc_checkpoint_every: 25_000,
    voc_gen_at_checkpoint: 5,
    voc_total_steps: 1_000_000,
    voc_test_samples: 50,
    voc_pad: 2,
    voc_seq_len: HOP_LENGTH * 5,
    voc_clip_grad_norm: Some(4.0),

    voc_gen_batched: true,
    voc_target: 11_000,
    voc_overlap: 550,

    tts_embed_dims: 256,
    tts_encoder_dims: 128,
    tts_decoder_dims: 256,
    tts_postnet_dims: 128,
    tts_encoder_k: 16,
    tts_lstm_dims: 512,
    tts_postnet_k: 8,
    tts_num_highways: 4,
    tts_dropout: 0.5,
    tts_cleaner_names: &["english_cleaners"],
    tts_stop_threshold: -3.4,

    tts_schedule: &[
        TrainingPhase { r: 7, lr: 1e-3, step: 10_000, batch_size: 32 },
        TrainingPhase { r: 5, lr: 1e-4, step: 100_000, batch_size: 32 },
        TrainingPhase { r: 2, lr: 1e-4, step: 180_000, batch_size: 16 },
        TrainingPhase { r: 2, lr: 1e-4, step: 350_000, batch_size: 8 },
    ],
    tts_max_mel_len: 1250,
    tts_bin_lengths: true,
};

/// Get the shared hyperparameter store
#[must_use]
pub fn hparams() -> &'static HyperParameters {
    &HPARAMS
}
