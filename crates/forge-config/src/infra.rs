//! Infrastructure configuration document
//!
//! One record driving the network composer: name prefix, BGP ASN, transit
//! gateway and (optional) VPC CIDR blocks, trusted accounts, and optional
//! DNS zone names and resolver source IPs. Absent optional fields skip the
//! dependent resources; they are never errors.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::groups::validate_name_fragment;
use crate::load_file;

/// The infrastructure definition document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraDef {
    /// Prefix applied to resource names and tags
    #[serde(rename = "namePrefix")]
    pub name_prefix: String,

    /// Amazon-side BGP ASN for the transit gateway
    #[serde(rename = "bgpAsn")]
    pub bgp_asn: u32,

    /// VPC CIDR block; absent means no VPC, attachment, or DNS resources
    #[serde(rename = "vpcCidr", default, skip_serializing_if = "Option::is_none")]
    pub vpc_cidr: Option<String>,

    /// Transit gateway CIDR block
    #[serde(rename = "tgwCidr")]
    pub tgw_cidr: String,

    /// Account ids granted access to the transit gateway
    #[serde(rename = "trustAccounts", default)]
    pub trust_accounts: Vec<String>,

    /// Private DNS zone names; `zoneName` (singular) is accepted as an alias
    #[serde(rename = "zoneNames", alias = "zoneName", default, deserialize_with = "one_or_many")]
    pub zone_names: Vec<String>,

    /// Source IPs allowed to query the DNS resolver endpoint
    #[serde(rename = "srcIps", default)]
    pub src_ips: Vec<String>,
}

/// Accept either a single string or a sequence of strings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(zone) => vec![zone],
        OneOrMany::Many(zones) => zones,
    })
}

impl InfraDef {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    /// Parse errors and invariant violations.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let def: Self = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    /// Load and validate from a file
    ///
    /// # Errors
    /// I/O, parse, and validation failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = load_file(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded infra config");
        Self::from_json_str(&contents)
    }

    /// Validate local invariants
    ///
    /// CIDR overlap and trusted-account resolution are the provisioning
    /// engine's job; only fields this layer consumes directly are checked.
    ///
    /// # Errors
    /// Name prefix not usable as a resource-name fragment, or a zero ASN.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name_fragment("namePrefix", &self.name_prefix)?;
        if self.bgp_asn == 0 {
            return Err(ConfigError::invalid(
                "bgpAsn",
                "0",
                "ASN 0 is reserved and cannot be assigned",
            ));
        }
        Ok(())
    }

    /// Whether a VPC (and its dependents) will be composed
    #[inline]
    #[must_use]
    pub fn has_vpc(&self) -> bool {
        self.vpc_cidr.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let def = InfraDef::from_json_str(
            r#"{
                "namePrefix": "core",
                "bgpAsn": 65000,
                "vpcCidr": "172.16.0.0/16",
                "tgwCidr": "172.17.0.0/16",
                "trustAccounts": ["111111111111"],
                "zoneNames": ["internal.example.com"],
                "srcIps": ["10.0.0.0/8"]
            }"#,
        )
        .unwrap();
        assert_eq!(def.bgp_asn, 65000);
        assert!(def.has_vpc());
        assert_eq!(def.zone_names, vec!["internal.example.com"]);
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let def = InfraDef::from_json_str(
            r#"{ "namePrefix": "core", "bgpAsn": 65000, "tgwCidr": "172.17.0.0/16" }"#,
        )
        .unwrap();
        assert!(!def.has_vpc());
        assert!(def.zone_names.is_empty());
        assert!(def.src_ips.is_empty());
        assert!(def.trust_accounts.is_empty());
    }

    #[test]
    fn singular_zone_name_variant_is_accepted() {
        let def = InfraDef::from_json_str(
            r#"{
                "namePrefix": "core",
                "bgpAsn": 65000,
                "tgwCidr": "172.17.0.0/16",
                "zoneName": "corp.example.com"
            }"#,
        )
        .unwrap();
        assert_eq!(def.zone_names, vec!["corp.example.com"]);
    }

    #[test]
    fn rejects_unusable_name_prefix() {
        let err = InfraDef::from_json_str(
            r#"{ "namePrefix": "core net", "bgpAsn": 65000, "tgwCidr": "172.17.0.0/16" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "namePrefix"));
    }

    #[test]
    fn rejects_reserved_asn() {
        let err = InfraDef::from_json_str(
            r#"{ "namePrefix": "core", "bgpAsn": 0, "tgwCidr": "172.17.0.0/16" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "bgpAsn"));
    }
}
