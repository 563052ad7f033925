//! Group configuration document
//!
//! An ordered sequence of group definitions: group name, allowed source IP
//! ranges, attached managed policy names, and member usernames.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::load_file;

/// One group definition from the configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDef {
    /// Group name; used as a resource-name fragment
    #[serde(rename = "groupName")]
    pub group_name: String,

    /// CIDR ranges members may assume the group role from
    #[serde(rename = "srcIp", default)]
    pub src_ip: Vec<String>,

    /// Provider-managed policy names to attach to the group
    #[serde(default)]
    pub policies: Vec<String>,

    /// Member usernames, one user resource each
    #[serde(rename = "userNames", default)]
    pub user_names: Vec<String>,
}

impl GroupDef {
    /// Validate this definition's invariants
    ///
    /// # Errors
    /// - group name empty or not usable as a resource-name fragment
    /// - duplicate username within the group
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name_fragment("groupName", &self.group_name)?;
        let mut seen = HashSet::new();
        for user in &self.user_names {
            validate_name_fragment("userNames", user)?;
            if !seen.insert(user.as_str()) {
                return Err(ConfigError::DuplicateUser {
                    group: self.group_name.clone(),
                    user: user.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The full group configuration document, in input order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupConfig {
    /// Group definitions in document order
    pub groups: Vec<GroupDef>,
}

impl GroupConfig {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    /// Parse errors and invariant violations, including duplicate group
    /// names across definitions.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a file
    ///
    /// # Errors
    /// I/O, parse, and validation failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = load_file(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded group config");
        Self::from_json_str(&contents)
    }

    /// Validate all definitions and cross-definition invariants
    ///
    /// # Errors
    /// First violation found, in document order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for group in &self.groups {
            group.validate()?;
            if !names.insert(group.group_name.as_str()) {
                return Err(ConfigError::DuplicateGroup {
                    name: group.group_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of group definitions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the document defines no groups
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate definitions in document order
    pub fn iter(&self) -> impl Iterator<Item = &GroupDef> {
        self.groups.iter()
    }
}

/// A name usable as a resource-name fragment: alphanumerics plus `_` and `-`
pub(crate) fn validate_name_fragment(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::invalid(field, value, "must not be empty"));
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
    {
        return Err(ConfigError::invalid(
            field,
            value,
            format!("invalid character `{ch}`"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"[
        {
            "groupName": "Admins",
            "srcIp": ["10.0.0.0/8"],
            "policies": ["ReadOnlyAccess"],
            "userNames": ["alice", "bob"]
        },
        {
            "groupName": "Operators",
            "srcIp": [],
            "policies": [],
            "userNames": []
        }
    ]"#;

    #[test]
    fn parses_document_in_order() {
        let config = GroupConfig::from_json_str(DOC).unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.groups[0].group_name, "Admins");
        assert_eq!(config.groups[0].user_names, vec!["alice", "bob"]);
        assert!(config.groups[1].user_names.is_empty());
    }

    #[test]
    fn missing_optional_sequences_default_to_empty() {
        let config = GroupConfig::from_json_str(r#"[{ "groupName": "Solo" }]"#).unwrap();
        assert!(config.groups[0].src_ip.is_empty());
        assert!(config.groups[0].policies.is_empty());
    }

    #[test]
    fn duplicate_group_name_is_rejected() {
        let doc = r#"[{ "groupName": "Admins" }, { "groupName": "Admins" }]"#;
        let err = GroupConfig::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateGroup { name } if name == "Admins"));
    }

    #[test]
    fn duplicate_user_within_group_is_rejected() {
        let doc = r#"[{ "groupName": "Admins", "userNames": ["alice", "alice"] }]"#;
        let err = GroupConfig::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateUser { user, .. } if user == "alice"));
    }

    #[test]
    fn group_name_must_be_a_name_fragment() {
        let doc = r#"[{ "groupName": "bad name" }]"#;
        assert!(matches!(
            GroupConfig::from_json_str(doc),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
