//! Parameter lookups with explicit fallback policies
//!
//! Some deployments source config values from a parameter store instead of
//! a JSON file. Historically an unset key was signalled by a magic "dummy"
//! sentinel that callers compared against by hand; here the sentinel is a
//! declared property of the store and the fallback behavior is a named
//! policy, so absence handling is part of the contract.

use std::collections::HashMap;

use crate::error::ConfigError;

/// A source of string-valued parameters, looked up by key path
pub trait ParamStore {
    /// Look up a raw value; `None` means the key is unset
    fn lookup(&self, key: &str) -> Option<String>;
}

/// In-memory parameter store
#[derive(Debug, Clone, Default)]
pub struct StaticParams {
    values: HashMap<String, String>,
    sentinel: Option<String>,
}

impl StaticParams {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a sentinel value the backing store uses to mean "unset"
    ///
    /// A stored value equal to the sentinel is reported as absent.
    #[must_use]
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    /// Insert a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl ParamStore for StaticParams {
    fn lookup(&self, key: &str) -> Option<String> {
        let value = self.values.get(key)?;
        if self.sentinel.as_deref() == Some(value.as_str()) {
            return None;
        }
        Some(value.clone())
    }
}

/// What an absent parameter resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// Use this default value
    Default(String),
    /// Absence is a configuration error
    Required,
}

impl Fallback {
    /// Default-value fallback
    #[inline]
    #[must_use]
    pub fn default_to(value: impl Into<String>) -> Self {
        Self::Default(value.into())
    }
}

/// Resolve a parameter against a store under a fallback policy
///
/// # Errors
/// [`ConfigError::MissingParameter`] when the key is unset (or holds the
/// store's sentinel) and the policy is [`Fallback::Required`].
pub fn resolve(
    store: &dyn ParamStore,
    key: &str,
    fallback: &Fallback,
) -> Result<String, ConfigError> {
    match store.lookup(key) {
        Some(value) => Ok(value),
        None => match fallback {
            Fallback::Default(value) => {
                tracing::debug!(key, default = %value, "parameter unset, using fallback");
                Ok(value.clone())
            }
            Fallback::Required => Err(ConfigError::MissingParameter {
                key: key.to_string(),
            }),
        },
    }
}
