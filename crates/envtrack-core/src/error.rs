//! Error types for envtrack

use thiserror::Error;

/// Result type used by the fallible parts of envtrack
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors raised by configuration loading and the edit session.
///
/// The tracking core itself (collection, snapshot, delta and history) never
/// fails; "nothing to undo" is reported as `None`, not as an error.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A value was rejected before it reached the tracking core
    #[error("Validation error: {0}")]
    Validation(String),

    /// The load/persist collaborator reported a failure
    #[error("Store error: {0}")]
    Store(String),
}

impl TrackerError {
    /// Create a new Validation error with context
    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Store error with context
    pub fn store_error(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TrackerError::validation_error("max_depth must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Validation error: max_depth must be greater than 0"
        );

        let err = TrackerError::store_error("registry key is read-only");
        assert_eq!(err.to_string(), "Store error: registry key is read-only");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: TrackerError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, TrackerError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: bad value");
    }
}
