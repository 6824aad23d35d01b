//! Error type for the training utilities.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use vmax_core::ConfigError;

/// Errors raised by the training utilities.
#[derive(Debug)]
pub enum TrainError {
    /// No encoder is registered under this name.
    UnknownEncoder {
        /// The rejected name.
        name: String,
    },
    /// A command-line flag is not a recognised boolean literal.
    InvalidBool {
        /// The rejected literal.
        value: String,
    },
    /// A required key is absent from a configuration or metrics map.
    MissingKey {
        /// Dotted path of the key.
        key: String,
    },
    /// A configuration value has the wrong JSON type.
    WrongType {
        /// Dotted path of the key.
        key: String,
        /// Expected JSON type.
        expected: &'static str,
    },
    /// The observation configuration was rejected.
    Config(ConfigError),
    /// Reading or writing a file failed.
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A value could not be serialized.
    Serialize {
        /// Serializer message.
        reason: String,
    },
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEncoder { name } => write!(f, "unknown encoder: {name}"),
            Self::InvalidBool { value } => {
                write!(f, "boolean value expected, got '{value}'")
            }
            Self::MissingKey { key } => write!(f, "missing key '{key}'"),
            Self::WrongType { key, expected } => {
                write!(f, "key '{key}' must be {expected}")
            }
            Self::Config(e) => write!(f, "observation config: {e}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Serialize { reason } => write!(f, "serialization failed: {reason}"),
        }
    }
}

impl Error for TrainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for TrainError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
