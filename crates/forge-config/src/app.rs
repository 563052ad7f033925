//! Application configuration document
//!
//! Parameters for the containerized identity-management service. Earlier
//! revisions hardcoded all of these at composition time; they are surfaced
//! here as a document with defaults reproducing those literals, so a
//! single-environment deployment still works with no config file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::load_file;

/// The application definition document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppDef {
    /// Existing VPC the service deploys into
    #[serde(rename = "vpcId")]
    pub vpc_id: String,

    /// Isolated subnet ids of that VPC
    #[serde(rename = "subnetIds")]
    pub subnet_ids: Vec<String>,

    /// TLS certificate ARN for the load balancer listener
    #[serde(rename = "certificateArn")]
    pub certificate_arn: String,

    /// Service-discovery record name
    pub record: String,

    /// Container image reference, mirrored through the pull-through cache
    #[serde(rename = "containerImage")]
    pub container_image: String,

    /// Repository prefix for the pull-through cache rule
    #[serde(rename = "repoPrefix")]
    pub repo_prefix: String,

    /// Upstream registry mirrored by the cache rule
    #[serde(rename = "upstreamRegistry")]
    pub upstream_registry: String,

    /// Database name
    #[serde(rename = "databaseName")]
    pub database_name: String,

    /// Service-discovery namespace name
    #[serde(rename = "namespaceName")]
    pub namespace_name: String,

    /// Load balancer name
    #[serde(rename = "loadBalancerName")]
    pub load_balancer_name: String,

    /// Container cluster name
    #[serde(rename = "clusterName")]
    pub cluster_name: String,

    /// Service name; also prefixes the log stream
    #[serde(rename = "serviceName")]
    pub service_name: String,

    /// Desired service replica count
    #[serde(rename = "desiredCount")]
    pub desired_count: u32,

    /// Task CPU units
    pub cpu: u32,

    /// Task memory limit in MiB
    #[serde(rename = "memoryMib")]
    pub memory_mib: u32,
}

impl Default for AppDef {
    fn default() -> Self {
        Self {
            vpc_id: "vpc-0123456789abcdefg".to_string(),
            subnet_ids: vec![
                "subnet-0123456789abcdef0".to_string(),
                "subnet-0123456789abcdef1".to_string(),
            ],
            certificate_arn:
                "arn:aws:acm:ap-northeast-1:123456789012:certificate/abcdefgh-0123-ijkl-4567-mnopqrstuvwx"
                    .to_string(),
            record: "cache".to_string(),
            container_image: "keycloak/keycloak:23.0.6".to_string(),
            repo_prefix: "kc-quay".to_string(),
            upstream_registry: "quay.io".to_string(),
            database_name: "kc_db".to_string(),
            namespace_name: "kc-ns".to_string(),
            load_balancer_name: "kc-alb".to_string(),
            cluster_name: "kc-cluster".to_string(),
            service_name: "kc-service".to_string(),
            desired_count: 2,
            cpu: 1024,
            memory_mib: 2048,
        }
    }
}

impl AppDef {
    /// Parse and validate a JSON document; absent fields keep their defaults
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
        tracing::debug!(path = %path.as_ref().display(), "loaded app config");
        Self::from_json_str(&contents)
    }

    /// Validate local invariants
    ///
    /// # Errors
    /// Empty subnet list or a zero replica count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subnet_ids.is_empty() {
            return Err(ConfigError::invalid(
                "subnetIds",
                "[]",
                "the service needs at least one subnet",
            ));
        }
        if self.desired_count == 0 {
            return Err(ConfigError::invalid(
                "desiredCount",
                "0",
                "the service needs at least one replica",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_single_environment_literals() {
        let def = AppDef::default();
        assert_eq!(def.record, "cache");
        assert_eq!(def.repo_prefix, "kc-quay");
        assert_eq!(def.desired_count, 2);
        assert_eq!(def.subnet_ids.len(), 2);
        def.validate().unwrap();
    }

    #[test]
    fn partial_document_overrides_defaults() {
        let def = AppDef::from_json_str(
            r#"{ "vpcId": "vpc-aaaa", "desiredCount": 3 }"#,
        )
        .unwrap();
        assert_eq!(def.vpc_id, "vpc-aaaa");
        assert_eq!(def.desired_count, 3);
        assert_eq!(def.database_name, "kc_db");
    }

    #[test]
    fn rejects_zero_replicas() {
        let err = AppDef::from_json_str(r#"{ "desiredCount": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "desiredCount"));
    }

    #[test]
    fn rejects_empty_subnets() {
        let err = AppDef::from_json_str(r#"{ "subnetIds": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "subnetIds"));
    }
}
