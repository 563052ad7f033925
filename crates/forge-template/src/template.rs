//! Templates: insertion-ordered resource graphs
//!
//! A [`Template`] collects resource descriptions under unique logical ids and
//! serializes to provider-native template JSON. Duplicate ids are a hard
//! error: composition must fail rather than silently overwrite.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::id::{LogicalId, LogicalIdError};
use crate::resource::{Output, OutputMap, Resource};

/// An insertion-ordered collection of resources and outputs
///
/// Iteration order is the insertion order, so synthesizing the same
/// configuration twice yields byte-identical JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    resources: IndexMap<LogicalId, Resource>,
    outputs: OutputMap,
}

impl Template {
    /// Create an empty template
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource under a logical id
    ///
    /// Returns the id back for use in intrinsic references.
    ///
    /// # Errors
    /// [`TemplateError::DuplicateLogicalId`] if the id is already taken.
    pub fn add(&mut self, id: LogicalId, resource: Resource) -> Result<LogicalId, TemplateError> {
        if self.resources.contains_key(&id) {
            return Err(TemplateError::DuplicateLogicalId { id: id.to_string() });
        }
        tracing::debug!(id = %id, type_name = %resource.type_name, "adding resource");
        self.resources.insert(id.clone(), resource);
        Ok(id)
    }

    /// Add a resource, constructing the logical id from a string
    ///
    /// # Errors
    /// Propagates id validation failures and duplicate detection.
    pub fn add_named(
        &mut self,
        id: &str,
        resource: Resource,
    ) -> Result<LogicalId, TemplateError> {
        self.add(LogicalId::new(id)?, resource)
    }

    /// Add an output under a name
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) {
        self.outputs.insert(name.into(), output);
    }

    /// Get a resource by logical id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &LogicalId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Number of resources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the template holds no resources
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over `(logical id, resource)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&LogicalId, &Resource)> {
        self.resources.iter()
    }

    /// All resources of a given provider type, in insertion order
    pub fn resources_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = (&'a LogicalId, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.type_name == type_name)
    }

    /// Count resources of a given provider type
    #[must_use]
    pub fn count_of_type(&self, type_name: &str) -> usize {
        self.resources_of_type(type_name).count()
    }

    /// Check that at least one resource of `type_name` carries all of the
    /// given properties (subset match, recursing into objects)
    #[must_use]
    pub fn has_resource_properties(&self, type_name: &str, expected: &Value) -> bool {
        self.resources_of_type(type_name)
            .any(|(_, r)| json_subset(&Value::Object(r.properties.clone()), expected))
    }

    /// Outputs map
    #[inline]
    #[must_use]
    pub fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    /// Serialize to template JSON
    ///
    /// # Errors
    /// [`TemplateError::Serialization`] on serializer failure.
    pub fn to_json(&self) -> Result<Value, TemplateError> {
        let mut resources = Map::new();
        for (id, resource) in &self.resources {
            let value = serde_json::to_value(resource)
                .map_err(|e| TemplateError::Serialization(e.to_string()))?;
            resources.insert(id.to_string(), value);
        }

        let mut root = Map::new();
        root.insert(
            "AWSTemplateFormatVersion".to_string(),
            json!("2010-09-09"),
        );
        root.insert("Resources".to_string(), Value::Object(resources));

        if !self.outputs.is_empty() {
            let mut outputs = Map::new();
            for (name, output) in &self.outputs {
                let value = serde_json::to_value(output)
                    .map_err(|e| TemplateError::Serialization(e.to_string()))?;
                outputs.insert(name.clone(), value);
            }
            root.insert("Outputs".to_string(), Value::Object(outputs));
        }

        Ok(Value::Object(root))
    }
}

/// Check whether `expected` is structurally contained in `actual`
///
/// Objects match when every expected key matches recursively; arrays and
/// scalars must be equal.
#[must_use]
pub fn json_subset(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => e
            .iter()
            .all(|(k, ev)| a.get(k).is_some_and(|av| json_subset(av, ev))),
        _ => actual == expected,
    }
}

/// Errors building or serializing a [`Template`]
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A logical id was used twice
    #[error("duplicate logical id `{id}`")]
    DuplicateLogicalId {
        /// The colliding id
        id: String,
    },

    /// Invalid logical id
    #[error(transparent)]
    InvalidLogicalId(#[from] LogicalIdError),

    /// JSON serialization failed
    #[error("template serialization failed: {0}")]
    Serialization(String),
}
