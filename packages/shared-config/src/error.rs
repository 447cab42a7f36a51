//! Configuration errors

use thiserror::Error;

/// A configuration variable that is absent or unusable
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: String },

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: String, reason: String },

    #[error("{name} is not an absolute URL: {reason}")]
    InvalidUrl { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn missing(name: &str) -> Self {
        Self::Missing {
            name: name.to_string(),
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The offending variable
    pub fn variable(&self) -> &str {
        match self {
            Self::Missing { name } | Self::Invalid { name, .. } | Self::InvalidUrl { name, .. } => {
                name
            }
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
