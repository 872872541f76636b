//! Download of pretrained weight files.

use std::io::Write;
use std::path::Path;

use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use crate::models::ModelKind;
use crate::weights::{read_bundle, WeightBundle};

/// Fetches a model's latest weights and decodes them
///
/// Every call downloads again and replaces the local copy. The HTTP client
/// is created on the first download, so a fetcher that never downloads can
/// live inside an async runtime; downloading from one is not supported.
#[derive(Debug, Clone)]
pub struct WeightFetcher {
    config: HubConfig,
    client: OnceCell<reqwest::blocking::Client>,
}

impl WeightFetcher {
    /// Create a fetcher for the given configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn new(config: HubConfig) -> HubResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: OnceCell::new(),
        })
    }

    /// The configuration this fetcher downloads with
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Download, persist and decode the weights of `model`
    ///
    /// # Errors
    ///
    /// - `NetworkError` if the client cannot be built, the request fails or
    ///   the status is not a success
    /// - `ChecksumMismatch` if a digest is configured and does not match
    /// - `FileError` if the local copy cannot be written or read back
    /// - `DeserializationError` if the file is not a valid bundle
    pub fn fetch(&self, model: ModelKind) -> HubResult<WeightBundle> {
        let url = self.config.weights_url(model);
        let path = self.config.weights_path(model);
        info!("Fetching pretrained weights for {}", model);
        debug!("Downloading from: {}", url);

        let bytes = self.download(&url)?;
        let digest = self.verify_digest(model, &bytes)?;
        debug!("Downloaded {} bytes, sha256={}", bytes.len(), digest);

        persist(&path, &bytes)?;
        debug!("Wrote weights to {:?}", path);

        let bundle = read_bundle(&path)?;
        info!("Loaded {} tensors for {}", bundle.len(), model);
        Ok(bundle)
    }

    /// Same as [`WeightFetcher::fetch`], addressing the model by name
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown model name, otherwise the errors
    /// of [`WeightFetcher::fetch`].
    pub fn fetch_by_name(&self, model_name: &str) -> HubResult<WeightBundle> {
        self.fetch(model_name.parse()?)
    }

    fn download(&self, url: &str) -> HubResult<Vec<u8>> {
        let client = self
            .client
            .get_or_try_init(|| reqwest::blocking::Client::builder().build())?;
        let response = client
            .get(url)
            .send()
            .map_err(|e| HubError::network(format!("Failed to download {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Weight download failed with HTTP {}", status);
            return Err(HubError::network(format!("Failed to download {url}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .map_err(|e| HubError::network(format!("Failed to read response body: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn verify_digest(&self, model: ModelKind, bytes: &[u8]) -> HubResult<String> {
        let actual = sha256_hex(bytes);

        if let Some(expected) = self.config.expected_digest(model) {
            if !expected.eq_ignore_ascii_case(&actual) {
                warn!("Rejecting download for {}: digest mismatch", model);
                return Err(HubError::ChecksumMismatch {
                    model: model.as_str().to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        Ok(actual)
    }
}

/// Lowercase hex SHA-256 of `bytes`
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

// Write to a sibling temp file and rename it over `path`, so readers never
// observe a partially written file.
fn persist(path: &Path, bytes: &[u8]) -> HubResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| HubError::file(format!("Weight path {} has no parent", path.display())))?;
    std::fs::create_dir_all(parent)
        .map_err(|e| HubError::file(format!("Failed to create {}: {e}", parent.display())))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| HubError::file(format!("Failed to create temp file in {}: {e}", parent.display())))?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| HubError::file(format!("Failed to write {}: {}", path.display(), e.error)))?;

    Ok(())
}
