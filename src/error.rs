//! Error types for muestreo operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;
use std::path::Path;

/// Main error type for muestreo operations.
///
/// Covers configuration rejection (degenerate probabilities, bad size
/// sequences), dataset problems (parse failures, missing label levels),
/// and persistence failures (cache misses, I/O).
///
/// # Examples
///
/// ```
/// use muestreo::error::MuestreoError;
///
/// let err = MuestreoError::InvalidParameter {
///     param: "relevance".to_string(),
///     value: "0.7".to_string(),
///     constraint: "[0, 0.5)".to_string(),
/// };
/// assert!(err.to_string().contains("relevance"));
/// ```
#[derive(Debug)]
pub enum MuestreoError {
    /// Invalid configuration parameter value.
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Relevance/interaction offsets pushed a Bernoulli parameter outside [0, 1].
    DegenerateProbability {
        /// The offending success probability
        probability: f64,
        /// Configured relevance
        relevance: f64,
        /// Configured interaction
        interaction: f64,
    },

    /// A label level has no training rows, so the trainer cannot fit it.
    MissingLabelLevel {
        /// Level name
        level: String,
    },

    /// Cached artifact was requested but is not on disk.
    CacheMiss {
        /// Path that was probed
        path: String,
    },

    /// Raw dataset text could not be parsed.
    Parse {
        /// 1-based line number in the source text
        line: usize,
        /// Error description
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for MuestreoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuestreoError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter: {param} = {value}, expected {constraint}"
                )
            }
            MuestreoError::DegenerateProbability {
                probability,
                relevance,
                interaction,
            } => {
                write!(
                    f,
                    "Degenerate success probability {probability} (relevance = {relevance}, interaction = {interaction}), must lie in [0, 1]"
                )
            }
            MuestreoError::MissingLabelLevel { level } => {
                write!(f, "Label level {level:?} has no training rows")
            }
            MuestreoError::CacheMiss { path } => {
                write!(f, "Cached artifact not found at {path}")
            }
            MuestreoError::Parse { line, message } => {
                write!(f, "Parse error at line {line}: {message}")
            }
            MuestreoError::Io(e) => write!(f, "I/O error: {e}"),
            MuestreoError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            MuestreoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for MuestreoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MuestreoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MuestreoError {
    fn from(err: std::io::Error) -> Self {
        MuestreoError::Io(err)
    }
}

impl From<serde_json::Error> for MuestreoError {
    fn from(err: serde_json::Error) -> Self {
        MuestreoError::Serialization(err.to_string())
    }
}

impl From<&str> for MuestreoError {
    fn from(msg: &str) -> Self {
        MuestreoError::Other(msg.to_string())
    }
}

impl From<String> for MuestreoError {
    fn from(msg: String) -> Self {
        MuestreoError::Other(msg)
    }
}

impl MuestreoError {
    /// Create an invalid-parameter error with descriptive context.
    #[must_use]
    pub fn invalid_parameter(param: &str, value: impl fmt::Display, constraint: &str) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create a cache-miss error for a path.
    #[must_use]
    pub fn cache_miss(path: &Path) -> Self {
        Self::CacheMiss {
            path: path.display().to_string(),
        }
    }

    /// Create an empty input error.
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::Other(format!("empty input: {context}"))
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, MuestreoError>;
