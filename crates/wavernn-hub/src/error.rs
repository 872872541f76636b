//! Error types for the WaveRNN hub.

/// Result type alias for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Main error type for fetching and loading pretrained models
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Weight download failed (connection error or non-success status)
    #[error("Network error: {message}")]
    NetworkError {
        /// Error message describing the network issue
        message: String,
    },

    /// Local weight file could not be written or read
    #[error("File I/O error: {message}")]
    FileError {
        /// Error message describing the file operation failure
        message: String,
    },

    /// Weight file is not a readable parameter bundle
    #[error("Deserialization error: {message}")]
    DeserializationError {
        /// Error message describing the decoding failure
        message: String,
    },

    /// A parameter in the bundle has a different shape than the model's
    #[error("Shape mismatch for '{key}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Parameter name
        key: String,
        /// Shape the model declares
        expected: Vec<usize>,
        /// Shape found in the bundle
        actual: Vec<usize>,
    },

    /// The bundle lacks parameters the model expects
    #[error("Missing keys in state dict: {keys:?}")]
    MissingKeys {
        /// Names absent from the bundle
        keys: Vec<String>,
    },

    /// The bundle carries parameters the model does not declare
    #[error("Unexpected keys in state dict: {keys:?}")]
    UnexpectedKeys {
        /// Names the model does not know
        keys: Vec<String>,
    },

    /// Downloaded body does not match the configured digest
    #[error("Checksum mismatch for '{model}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Model name whose download was rejected
        model: String,
        /// Configured SHA-256 hex digest
        expected: String,
        /// SHA-256 hex digest of the received body
        actual: String,
    },

    /// Invalid input error
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl HubError {
    /// Create a new network error
    #[must_use]
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Create a new file error
    #[must_use]
    pub fn file<S: Into<String>>(message: S) -> Self {
        Self::FileError {
            message: message.into(),
        }
    }

    /// Create a new deserialization error
    #[must_use]
    pub fn deserialization<S: Into<String>>(message: S) -> Self {
        Self::DeserializationError {
            message: message.into(),
        }
    }

    /// Create a new shape mismatch error
    #[must_use]
    pub fn shape_mismatch<S: Into<String>>(key: S, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            key: key.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create a new missing keys error
    #[must_use]
    pub fn missing_keys(keys: Vec<String>) -> Self {
        Self::MissingKeys { keys }
    }

    /// Create a new unexpected keys error
    #[must_use]
    pub fn unexpected_keys(keys: Vec<String>) -> Self {
        Self::UnexpectedKeys { keys }
    }

    /// Create a new invalid input error
    #[must_use]
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Check if this error is retriable
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::NetworkError { .. })
    }

    /// Check if this error comes from applying a bundle to a model
    #[must_use]
    pub const fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::MissingKeys { .. } | Self::UnexpectedKeys { .. })
    }

    /// Get the error category for logging
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::NetworkError { .. } => "network",
            Self::FileError { .. } => "file",
            Self::DeserializationError { .. } => "deserialization",
            Self::ShapeMismatch { .. } => "shape",
            Self::MissingKeys { .. } | Self::UnexpectedKeys { .. } => "keys",
            Self::ChecksumMismatch { .. } => "checksum",
            Self::InvalidInput { .. } => "input",
            Self::ConfigurationError { .. } => "configuration",
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        Self::file(err.to_string())
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}

impl From<safetensors::SafeTensorError> for HubError {
    fn from(err: safetensors::SafeTensorError) -> Self {
        Self::deserialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for HubError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::deserialization(format!("Tensor layout error: {err}"))
    }
}

impl From<toml::de::Error> for HubError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(format!("TOML parse error: {err}"))
    }
}
