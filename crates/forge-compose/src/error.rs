//! Error types for composition
//!
//! Composition errors are configuration errors: the pass aborts on the first
//! one, and no partial result is usable. Provisioning-time failures (CIDR
//! overlap, quotas, permissions) belong to the external engine and have no
//! representation here.

use forge_config::ConfigError;
use forge_template::{PolicyError, TemplateError};

/// Errors raised while composing resource descriptions
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// A policy name did not resolve against the managed-policy catalog
    #[error("unknown managed policy `{name}`")]
    UnknownManagedPolicy {
        /// The unresolvable policy name
        name: String,
    },

    /// Template-level failure (duplicate or invalid logical id)
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Policy document construction failed
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Configuration document failed validation
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
