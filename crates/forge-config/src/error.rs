//! Error types for configuration loading and validation
//!
//! Configuration errors abort the composition pass; each variant names the
//! offending field or value so the failure is actionable.

use std::path::PathBuf;

/// Errors loading or validating configuration documents
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A config file could not be read
    #[error("cannot read config file `{path}`: {source}")]
    Io {
        /// The file that failed to load
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the schema
    #[error("invalid config document: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field holds a value the composer cannot use
    #[error("invalid value `{value}` for `{field}`: {reason}")]
    InvalidValue {
        /// The field path
        field: String,
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Two group definitions share a name
    #[error("duplicate group name `{name}`")]
    DuplicateGroup {
        /// The colliding group name
        name: String,
    },

    /// A username appears twice within one group
    #[error("duplicate user `{user}` in group `{group}`")]
    DuplicateUser {
        /// The group containing the duplicate
        group: String,
        /// The duplicated username
        user: String,
    },

    /// A required parameter had no value and no fallback
    #[error("required parameter `{key}` is unset")]
    MissingParameter {
        /// The parameter key path
        key: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(field: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
