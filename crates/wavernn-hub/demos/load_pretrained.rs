//! Load both pretrained models and convert a sentence to symbol ids.
//!
//! Run with `cargo run --example load_pretrained -- [--offline] [--user-cache] [CONFIG.toml]`.
//! `--user-cache` stores the weights in the platform cache directory.
//! `RUST_LOG=debug` shows download URLs, digests and remap steps.

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use wavernn_hub::{hparams, sequence_to_text, text_to_sequence_converter, Hub, HubConfig, PretrainedModel};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let offline = args.iter().any(|arg| arg == "--offline");
    let config = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(path) => HubConfig::from_toml_file(Path::new(path))
            .with_context(|| format!("loading hub config from {path}"))?,
        None => HubConfig::default(),
    };
    let config = if args.iter().any(|arg| arg == "--user-cache") {
        config.with_user_cache_dir()?
    } else {
        config
    };

    let hub = Hub::new(config)?;
    let vocoder = hub.wave_rnn(!offline).context("building WaveRNN")?;
    let tts = hub.tacotron(!offline).context("building Tacotron")?;

    println!(
        "WaveRNN: {} mode, {} classes, {} parameters, step {}",
        vocoder.mode(),
        vocoder.n_classes(),
        vocoder.num_params(),
        vocoder.step()
    );
    println!(
        "Tacotron: r = {}, stop threshold {}, {} parameters, step {}",
        tts.r(),
        tts.stop_threshold(),
        tts.num_params(),
        tts.step()
    );

    let to_ids = text_to_sequence_converter();
    let text = "Scientists at the CERN laboratory say they have discovered a new particle.";
    let ids = to_ids(text, hparams().tts_cleaner_names)?;
    println!("{} symbols: {}", ids.len(), sequence_to_text(&ids));

    Ok(())
}
