use std::fmt;

/// Result type for layer operations
pub type Result<T> = std::result::Result<T, LayerError>;

/// Main error type for the crate
#[derive(Debug, Clone, PartialEq)]
pub enum LayerError {
    /// Wrong number of bottom or top blobs handed to a layer
    BlobCount {
        layer: String,
        role: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Forward or backward called before setup
    NotConfigured(String),

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// No constructor registered under this layer type
    UnknownLayerType(String),

    /// IO errors (file operations)
    IoError(String),

    /// Malformed layer configuration
    ConfigError(String),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::BlobCount { layer, role, expected, actual } => {
                write!(f, "{} layer takes {} {} blob(s), got {}", layer, expected, role, actual)
            }
            LayerError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            LayerError::NotConfigured(layer) => {
                write!(f, "{} layer used before setup", layer)
            }
            LayerError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            LayerError::UnknownLayerType(ty) => write!(f, "Unknown layer type: {}", ty),
            LayerError::IoError(msg) => write!(f, "IO error: {}", msg),
            LayerError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for LayerError {}

// Conversion from std::io::Error
impl From<std::io::Error> for LayerError {
    fn from(err: std::io::Error) -> Self {
        LayerError::IoError(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for LayerError {
    fn from(err: serde_json::Error) -> Self {
        LayerError::ConfigError(err.to_string())
    }
}

// Helper functions for common error patterns
impl LayerError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        LayerError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        LayerError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn blob_count<S: Into<String>>(layer: S, role: &'static str, expected: usize, actual: usize) -> Self {
        LayerError::BlobCount {
            layer: layer.into(),
            role,
            expected,
            actual,
        }
    }

    /// True for the errors a host treats as a fatal shape configuration failure
    pub fn is_shape_error(&self) -> bool {
        matches!(self, LayerError::BlobCount { .. } | LayerError::DimensionMismatch { .. })
    }
}
