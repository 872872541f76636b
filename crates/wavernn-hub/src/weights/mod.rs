//! Pretrained weight retrieval: download, on-disk format, key remapping.

/// Weight bundle type, format detection and codecs
pub mod bundle;
/// Remote download of weight files
pub mod fetcher;
/// Key rewrites applied before loading
pub mod remap;

pub use bundle::{decode_safetensors, decode_torch, encode_safetensors, read_bundle, WeightBundle, WeightFormat};
pub use fetcher::{sha256_hex, WeightFetcher};
pub use remap::KeyRemap;
