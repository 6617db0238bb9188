//! Error types for profile generation

use thiserror::Error;

use crate::config::ValidationError;

/// Errors that abort a profile build.
///
/// Configuration and graph consistency errors are raised before anything
/// is rendered or written, so a failed build never leaves a partial request
/// behind.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Invalid or contradictory parameter value
    #[error("Configuration error in '{parameter}': {message}")]
    Configuration { parameter: String, message: String },

    /// The built graph violates a topology invariant
    #[error("Graph consistency error: {0}")]
    GraphConsistency(String),

    /// Failure reported by the renderer or the output sink
    #[error("External service error: {0}")]
    ExternalService(String),
}

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;

impl ProfileError {
    pub fn configuration(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ProfileError::Configuration {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for ProfileError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidParameter { parameter, message } => {
                ProfileError::Configuration { parameter, message }
            }
        }
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::ExternalService(format!("JSON serialization failed: {}", err))
    }
}

impl From<serde_yaml::Error> for ProfileError {
    fn from(err: serde_yaml::Error) -> Self {
        ProfileError::ExternalService(format!("YAML serialization failed: {}", err))
    }
}
