//! Logical ids for addressing resources within a template
//!
//! Provides [`LogicalId`], the alphanumeric identifier a resource is keyed by.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Logical id of a resource within a template
///
/// CloudFormation restricts logical ids to ASCII alphanumerics. Config-derived
/// fragments (zone names, group names) often carry dots and dashes, so
/// [`LogicalId::sanitize`] exists for building ids out of them.
///
/// # Examples
/// - `transitGateway`
/// - `HostedZoneinternalexamplecom` (sanitized from `internal.example.com`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalId(String);

impl LogicalId {
    /// Create a logical id, validating the character set
    ///
    /// # Errors
    /// Returns [`LogicalIdError`] if the id is empty or contains a
    /// non-alphanumeric character.
    pub fn new(id: impl Into<String>) -> Result<Self, LogicalIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(LogicalIdError::Empty);
        }
        if let Some(ch) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(LogicalIdError::InvalidCharacter { id, ch });
        }
        Ok(Self(id))
    }

    /// Build a logical id from an arbitrary fragment, dropping invalid characters
    ///
    /// # Errors
    /// Returns [`LogicalIdError::Empty`] if nothing survives sanitization.
    pub fn sanitize(fragment: &str) -> Result<Self, LogicalIdError> {
        let id: String = fragment.chars().filter(char::is_ascii_alphanumeric).collect();
        if id.is_empty() {
            return Err(LogicalIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LogicalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LogicalId {
    type Err = LogicalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Errors constructing a [`LogicalId`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicalIdError {
    /// Id was empty (or empty after sanitization)
    #[error("logical id is empty")]
    Empty,

    /// Id contains a character outside `[A-Za-z0-9]`
    #[error("logical id `{id}` contains invalid character `{ch}`")]
    InvalidCharacter {
        /// The offending id
        id: String,
        /// The first invalid character
        ch: char,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric() {
        let id = LogicalId::new("transitGateway1").unwrap();
        assert_eq!(id.as_str(), "transitGateway1");
    }

    #[test]
    fn rejects_punctuation() {
        let err = LogicalId::new("tgw-share").unwrap_err();
        assert!(matches!(err, LogicalIdError::InvalidCharacter { ch: '-', .. }));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(LogicalId::new("").unwrap_err(), LogicalIdError::Empty);
    }

    #[test]
    fn sanitize_strips_dots() {
        let id = LogicalId::sanitize("HostedZone_internal.example.com").unwrap();
        assert_eq!(id.as_str(), "HostedZoneinternalexamplecom");
    }

    #[test]
    fn sanitize_of_punctuation_only_is_empty() {
        assert_eq!(LogicalId::sanitize("..-_").unwrap_err(), LogicalIdError::Empty);
    }
}
