//! Resource descriptions
//!
//! A [`Resource`] is one declarative provider resource: a type name plus a
//! JSON property map. Composition produces these; the provisioning engine
//! later reconciles them against the live environment.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::id::LogicalId;

/// A single declarative resource description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// Provider resource type, e.g. `AWS::EC2::TransitGateway`
    #[serde(rename = "Type")]
    pub type_name: String,

    /// Resource properties as a JSON object
    #[serde(rename = "Properties", skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Explicit creation-order dependencies
    #[serde(
        rename = "DependsOn",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_depends_on"
    )]
    pub depends_on: Vec<LogicalId>,
}

fn serialize_depends_on<S>(ids: &[LogicalId], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(ids.iter().map(LogicalId::as_str))
}

impl Resource {
    /// Create a resource with an empty property map
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Map::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set a property, consuming and returning the resource
    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Set a property only when a value is present
    #[must_use]
    pub fn with_opt(self, key: &str, value: Option<Value>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Add an explicit dependency
    #[must_use]
    pub fn depends_on(mut self, id: LogicalId) -> Self {
        self.depends_on.push(id);
        self
    }

    /// Get a property value by key
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Build a CloudFormation tag list: `[{"Key": .., "Value": ..}, ..]`
#[must_use]
pub fn tags(pairs: &[(&str, &str)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(k, v)| json!({ "Key": k, "Value": v }))
            .collect(),
    )
}

/// A single `Name` tag, the most common case
#[inline]
#[must_use]
pub fn name_tag(value: &str) -> Value {
    tags(&[("Name", value)])
}

/// Template output: a value exposed by a deployment unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    /// Output value (usually an intrinsic)
    #[serde(rename = "Value")]
    pub value: Value,

    /// Human-readable description
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    /// Create an output from a value
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Insertion-ordered map of outputs, keyed by output name
pub type OutputMap = IndexMap<String, Output>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_builds_property_map() {
        let res = Resource::new("AWS::EC2::VPC")
            .with("CidrBlock", json!("10.0.0.0/16"))
            .with("EnableDnsSupport", json!(true));
        assert_eq!(res.property("CidrBlock"), Some(&json!("10.0.0.0/16")));
        assert_eq!(res.property("EnableDnsSupport"), Some(&json!(true)));
    }

    #[test]
    fn with_opt_skips_absent() {
        let res = Resource::new("AWS::EC2::VPC").with_opt("CidrBlock", None);
        assert!(res.property("CidrBlock").is_none());
    }

    #[test]
    fn tag_shape() {
        assert_eq!(
            name_tag("core_tgw"),
            json!([{ "Key": "Name", "Value": "core_tgw" }])
        );
    }

    #[test]
    fn serializes_without_empty_sections() {
        let res = Resource::new("AWS::ECS::Cluster");
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value, json!({ "Type": "AWS::ECS::Cluster" }));
    }
}
