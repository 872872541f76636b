//! Where pretrained weights are downloaded from and written to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{HubError, HubResult};
use crate::models::ModelKind;

/// Remote directory holding one sub-directory per model
pub const DEFAULT_BASE_URL: &str = "https://github.com/keitakurita/WaveRNN_Manual/raw/master/pretrained";

/// File name of the latest weights inside each model directory
///
/// The published files are PyTorch zip checkpoints; safetensors files under
/// the same name are accepted as well.
pub const DEFAULT_WEIGHTS_FILE: &str = "latest_weights.pyt";

/// Local directory (under the root) that mirrors the remote layout
pub const PRETRAINED_DIR: &str = "pretrained";

/// Hub configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// URL prefix; the model name and file name are appended
    pub base_url: String,
    /// Directory under which `pretrained/<model>/` is created
    pub root_dir: PathBuf,
    /// Weight file name, both remote and local
    pub file_name: String,
    /// Optional SHA-256 hex digests keyed by model name
    pub expected_sha256: BTreeMap<String, String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            root_dir: PathBuf::from("."),
            file_name: DEFAULT_WEIGHTS_FILE.to_string(),
            expected_sha256: BTreeMap::new(),
        }
    }
}

impl HubConfig {
    /// Parse a configuration from TOML; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the result fails validation.
    pub fn from_toml_str(content: &str) -> HubResult<Self> {
        let mut config: Self = toml::from_str(content)?;
        for digest in config.expected_sha256.values_mut() {
            digest.make_ascii_lowercase();
        }
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> HubResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HubError::configuration(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Set the URL prefix
    #[must_use]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the local root directory
    #[must_use]
    pub fn with_root_dir<P: Into<PathBuf>>(mut self, root_dir: P) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    /// Set the weight file name
    #[must_use]
    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Require downloads for `model` to hash to `sha256_hex`
    #[must_use]
    pub fn with_expected_sha256<S: Into<String>>(mut self, model: ModelKind, sha256_hex: S) -> Self {
        self.expected_sha256
            .insert(model.as_str().to_string(), sha256_hex.into().to_ascii_lowercase());
        self
    }

    /// Root weights in the platform cache directory instead of the working directory
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn with_user_cache_dir(self) -> HubResult<Self> {
        let proj_dirs = ProjectDirs::from("dev", "WaveRNN Hub", "wavernn-hub")
            .ok_or_else(|| HubError::configuration("Failed to determine project directories"))?;

        let cache_dir = proj_dirs.cache_dir().to_path_buf();
        tracing::debug!("Using cross-platform cache directory: {:?}", cache_dir);

        Ok(self.with_root_dir(cache_dir))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or file name is empty, or the file
    /// name contains a path separator.
    pub fn validate(&self) -> HubResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(HubError::configuration("base_url must not be empty"));
        }

        if self.file_name.is_empty() || self.file_name.contains(['/', '\\']) {
            return Err(HubError::configuration(format!(
                "file_name must be a bare file name, got '{}'",
                self.file_name
            )));
        }

        Ok(())
    }

    /// Remote URL of a model's weights
    #[must_use]
    pub fn weights_url(&self, model: ModelKind) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            model.as_str(),
            self.file_name
        )
    }

    /// Local path a model's weights are written to
    #[must_use]
    pub fn weights_path(&self, model: ModelKind) -> PathBuf {
        self.root_dir
            .join(PRETRAINED_DIR)
            .join(model.as_str())
            .join(&self.file_name)
    }

    /// Configured digest for a model, if any
    #[must_use]
    pub fn expected_digest(&self, model: ModelKind) -> Option<&str> {
        self.expected_sha256.get(model.as_str()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locations() {
        let config = HubConfig::default();
        assert_eq!(
            config.weights_url(ModelKind::WaveRnn),
            "https://github.com/keitakurita/WaveRNN_Manual/raw/master/pretrained/wavernn/latest_weights.pyt"
        );
        assert_eq!(
            config.weights_path(ModelKind::Tacotron),
            PathBuf::from("./pretrained/tacotron/latest_weights.pyt")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let config = HubConfig::default().with_base_url("http://localhost:8080/weights/");
        assert_eq!(
            config.weights_url(ModelKind::Tacotron),
            "http://localhost:8080/weights/tacotron/latest_weights.pyt"
        );
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let config = HubConfig::from_toml_str(
            r#"
            base_url = "http://mirror.local/pretrained"

            [expected_sha256]
            wavernn = "abc123"
            "#,
        )
        .expect("Should parse");

        assert_eq!(config.base_url, "http://mirror.local/pretrained");
        assert_eq!(config.file_name, DEFAULT_WEIGHTS_FILE);
        assert_eq!(config.root_dir, PathBuf::from("."));
        assert_eq!(config.expected_digest(ModelKind::WaveRnn), Some("abc123"));
        assert_eq!(config.expected_digest(ModelKind::Tacotron), None);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(HubConfig::from_toml_str("base_url = \"\"").is_err());
        assert!(HubConfig::from_toml_str("file_name = \"../escape.bin\"").is_err());
        assert!(matches!(
            HubConfig::from_toml_str("base_url = 3"),
            Err(HubError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = HubConfig::from_toml_file(&temp_dir.path().join("hub.toml"));
        assert!(matches!(result, Err(HubError::ConfigurationError { .. })));
    }

    #[test]
    fn test_toml_digests_are_lowercased() {
        let config = HubConfig::from_toml_str(
            r#"
            [expected_sha256]
            tacotron = "9BBCBF00AA"
            "#,
        )
        .unwrap();
        assert_eq!(config.expected_digest(ModelKind::Tacotron), Some("9bbcbf00aa"));
    }

    #[test]
    fn test_user_cache_dir() {
        // No home directory in some sandboxes
        if let Ok(config) = HubConfig::default().with_user_cache_dir() {
            assert!(config.root_dir.is_absolute());
            assert!(config
                .weights_path(ModelKind::WaveRnn)
                .starts_with(&config.root_dir));
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
        }
    }

    #[test]
    fn test_expected_sha256_is_lowercased() {
        let config = HubConfig::default().with_expected_sha256(ModelKind::Tacotron, "ABCDEF");
        assert_eq!(config.expected_digest(ModelKind::Tacotron), Some("abcdef"));
    }
}
