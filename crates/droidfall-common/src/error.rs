//! Error types for Droidfall.

use thiserror::Error;

use crate::ids::AgentId;

/// Top-level error type for Droidfall operations.
#[derive(Debug, Error)]
pub enum DroidfallError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource teardown errors
    #[error("Teardown error: {0}")]
    Teardown(#[from] TeardownError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building agents or validating tuning tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A required parameter was never supplied
    #[error("Missing required parameter `{0}`")]
    MissingParameter(&'static str),

    /// A parameter was supplied with an unusable value
    #[error("Invalid value {value} for parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
        /// What was expected
        reason: &'static str,
    },
}

impl ConfigError {
    /// Shorthand for an [`ConfigError::InvalidParameter`].
    #[must_use]
    pub fn invalid(name: &'static str, value: impl Into<f64>, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
            reason,
        }
    }
}

/// Failures releasing resources held for an agent.
///
/// These are reported and swallowed: teardown always proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeardownError {
    /// The scene graph had no node for the agent
    #[error("No scene node for {0}")]
    UnknownNode(AgentId),

    /// A scene node could not be detached
    #[error("Failed to detach scene node for {agent}: {message}")]
    DetachFailed {
        /// Agent being torn down
        agent: AgentId,
        /// Collaborator message
        message: String,
    },

    /// An audio source could not be disconnected
    #[error("Audio source for {agent} not properly disconnected: {message}")]
    AudioDisconnect {
        /// Agent being torn down
        agent: AgentId,
        /// Collaborator message
        message: String,
    },
}

/// Result type alias for Droidfall operations.
pub type DroidfallResult<T> = Result<T, DroidfallError>;

/// Checks that a parameter is finite.
pub fn require_finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::invalid(name, value, "must be finite"))
    }
}

/// Checks that a parameter is finite and strictly positive.
pub fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = require_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(name, value, "must be greater than zero"))
    }
}
