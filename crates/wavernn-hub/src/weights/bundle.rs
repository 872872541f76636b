//! In-memory parameter bundles and their on-disk encodings.
//!
//! Published checkpoints are PyTorch zip archives (`torch.save` since 1.6);
//! bundles written by this crate are safetensors. Files are told apart by
//! content, not by name.

use std::collections::BTreeMap;
use std::path::Path;

use candle_core::DType;
use ndarray::{ArrayD, IxDyn};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};

use crate::error::{HubError, HubResult};

/// Parameter name to array mapping, ordered by name
pub type WeightBundle = BTreeMap<String, ArrayD<f32>>;

/// Encodings a weight file may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// safetensors: little-endian header length, then a JSON header
    SafeTensors,
    /// PyTorch zip archive holding `data.pkl` and tensor storages
    TorchZip,
    /// Pre-1.6 PyTorch pickle stream
    TorchLegacy,
}

impl WeightFormat {
    /// Guess the format from the first bytes of a file
    ///
    /// Anything unrecognised is treated as safetensors so that decoding
    /// reports the precise header error.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.get(8) == Some(&b'{') {
            Self::SafeTensors
        } else if bytes.starts_with(b"PK") {
            Self::TorchZip
        } else if bytes.first() == Some(&0x80) {
            Self::TorchLegacy
        } else {
            Self::SafeTensors
        }
    }
}

/// Decode a safetensors byte buffer into a bundle
///
/// Every supported element type is converted to `f32`.
///
/// # Errors
///
/// Returns a deserialization error if the header is corrupt, a tensor's data
/// does not match its shape, or a tensor uses an unsupported element type.
pub fn decode_safetensors(bytes: &[u8]) -> HubResult<WeightBundle> {
    let tensors = SafeTensors::deserialize(bytes)?;

    let mut bundle = WeightBundle::new();
    for (name, view) in tensors.tensors() {
        let values = view_to_f32(&name, &view)?;
        let array = ArrayD::from_shape_vec(IxDyn(view.shape()), values)?;
        bundle.insert(name, array);
    }

    Ok(bundle)
}

/// Encode a bundle as safetensors with `F32` elements
///
/// # Errors
///
/// Returns a deserialization error if safetensors rejects a tensor layout.
pub fn encode_safetensors(bundle: &WeightBundle) -> HubResult<Vec<u8>> {
    let buffers: Vec<(&str, Vec<usize>, Vec<u8>)> = bundle
        .iter()
        .map(|(name, array)| {
            let bytes = array.iter().flat_map(|v| v.to_le_bytes()).collect();
            (name.as_str(), array.shape().to_vec(), bytes)
        })
        .collect();

    let mut views = Vec::with_capacity(buffers.len());
    for (name, shape, bytes) in &buffers {
        views.push((*name, TensorView::new(Dtype::F32, shape.clone(), bytes)?));
    }

    Ok(safetensors::serialize(views, &None)?)
}

/// Read and decode a weight file in any supported format
///
/// # Errors
///
/// Returns a file error if the file cannot be read, or a deserialization
/// error if its content is not a valid bundle. Legacy (non-zip) PyTorch
/// pickles are rejected.
pub fn read_bundle(path: &Path) -> HubResult<WeightBundle> {
    let bytes = std::fs::read(path)
        .map_err(|e| HubError::file(format!("Failed to read {}: {e}", path.display())))?;

    match WeightFormat::detect(&bytes) {
        WeightFormat::SafeTensors => decode_safetensors(&bytes),
        WeightFormat::TorchZip => decode_torch(path),
        WeightFormat::TorchLegacy => Err(HubError::deserialization(format!(
            "{} uses the legacy PyTorch serialization; re-save it with torch >= 1.6",
            path.display()
        ))),
    }
}

/// Decode a PyTorch zip checkpoint holding a flat state dict
///
/// # Errors
///
/// Returns a deserialization error if the archive or its pickle cannot be
/// read, or a tensor cannot be converted to `f32`.
pub fn decode_torch(path: &Path) -> HubResult<WeightBundle> {
    let tensors = candle_core::pickle::read_all(path).map_err(|e| {
        HubError::deserialization(format!("Failed to read torch checkpoint {}: {e}", path.display()))
    })?;

    let mut bundle = WeightBundle::new();
    for (name, tensor) in tensors {
        let shape = tensor.dims().to_vec();
        let values = tensor
            .to_dtype(DType::F32)
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| HubError::deserialization(format!("Tensor '{name}': {e}")))?;
        let array = ArrayD::from_shape_vec(IxDyn(&shape), values)?;
        bundle.insert(name, array);
    }

    Ok(bundle)
}

fn view_to_f32(name: &str, view: &TensorView<'_>) -> HubResult<Vec<f32>> {
    let data = view.data();
    let values = match view.dtype() {
        Dtype::F32 => decode_le::<4>(data, f32::from_le_bytes),
        Dtype::F64 => decode_le::<8>(data, |b| f64::from_le_bytes(b) as f32),
        Dtype::F16 => decode_le::<2>(data, |b| half::f16::from_le_bytes(b).to_f32()),
        Dtype::BF16 => decode_le::<2>(data, |b| half::bf16::from_le_bytes(b).to_f32()),
        Dtype::I64 => decode_le::<8>(data, |b| i64::from_le_bytes(b) as f32),
        Dtype::I32 => decode_le::<4>(data, |b| i32::from_le_bytes(b) as f32),
        Dtype::I16 => decode_le::<2>(data, |b| f32::from(i16::from_le_bytes(b))),
        Dtype::I8 => decode_le::<1>(data, |b| f32::from(i8::from_le_bytes(b))),
        Dtype::U8 => decode_le::<1>(data, |b| f32::from(b[0])),
        Dtype::BOOL => decode_le::<1>(data, |b| if b[0] == 0 { 0.0 } else { 1.0 }),
        other => {
            return Err(HubError::deserialization(format!(
                "Tensor '{name}' has unsupported dtype {other:?}"
            )))
        }
    };
    Ok(values)
}

fn decode_le<const N: usize>(data: &[u8], convert: impl Fn([u8; N]) -> f32) -> Vec<f32> {
    data.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            convert(bytes)
        })
        .collect()
}
