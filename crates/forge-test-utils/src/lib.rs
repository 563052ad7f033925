//! Testing utilities for the StackForge workspace
//!
//! Shared fixtures: configuration documents and policy documents used across
//! crate tests.

#![allow(missing_docs)]

use forge_config::{AppDef, GroupConfig, InfraDef};
use forge_template::{Environment, PolicyDocument};
use serde_json::json;

/// A pinned environment used by most tests
pub fn test_environment() -> Environment {
    Environment::new("111111111111", "ap-northeast-1")
}

/// Two groups: admins with members and a source-IP restriction, and an
/// auditors group with no members.
pub fn sample_group_config() -> GroupConfig {
    GroupConfig::from_json_str(
        r#"[
            {
                "groupName": "Admins",
                "srcIp": ["10.0.0.0/8"],
                "policies": ["ReadOnlyAccess"],
                "userNames": ["alice", "bob"]
            },
            {
                "groupName": "Auditors",
                "policies": ["SecurityAudit"],
                "userNames": []
            }
        ]"#,
    )
    .unwrap()
}

/// The base managed-policy document attached to every group
pub fn sample_base_policy() -> PolicyDocument {
    PolicyDocument::from_json(json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["iam:ChangePassword", "iam:GetUser"],
                "Resource": "*",
            },
            {
                "Effect": "Allow",
                "Action": ["sts:AssumeRole"],
                "Resource": "*",
                "Condition": { "Bool": { "aws:MultiFactorAuthPresent": "true" } },
            },
        ],
    }))
    .unwrap()
}

/// Full infrastructure definition: VPC, one zone, one resolver source range
pub fn sample_infra_def() -> InfraDef {
    InfraDef::from_json_str(
        r#"{
            "namePrefix": "core",
            "bgpAsn": 65000,
            "vpcCidr": "172.16.0.0/16",
            "tgwCidr": "172.16.0.0/16",
            "trustAccounts": ["111111111111"],
            "zoneNames": ["internal.example.com"],
            "srcIps": ["10.0.0.0/8"]
        }"#,
    )
    .unwrap()
}

/// Hub-only infrastructure definition: no VPC, no zones
pub fn infra_def_without_vpc() -> InfraDef {
    InfraDef::from_json_str(
        r#"{
            "namePrefix": "core",
            "bgpAsn": 65000,
            "tgwCidr": "172.17.0.0/16",
            "trustAccounts": ["111111111111", "222222222222"]
        }"#,
    )
    .unwrap()
}

/// Application definition with the single-environment defaults
pub fn sample_app_def() -> AppDef {
    AppDef::default()
}
