//! IAM policy documents
//!
//! Typed builders for authorization-policy JSON: permission statements,
//! principals, and trust documents composed from multiple principals.

use serde_json::{json, Map, Value};

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    /// Allow the listed actions
    #[default]
    Allow,
    /// Deny the listed actions
    Deny,
}

impl Effect {
    fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// A principal a statement applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// An identity ARN (user or role); may be a deploy-time reference
    Arn(Value),
    /// A provider service, e.g. `ecs-tasks.amazonaws.com`
    Service(String),
}

impl Principal {
    fn to_json(&self) -> Value {
        match self {
            Self::Arn(arn) => json!({ "AWS": arn }),
            Self::Service(service) => json!({ "Service": service }),
        }
    }
}

/// One policy statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    /// Allow or deny
    pub effect: Effect,
    /// Actions the statement covers
    pub actions: Vec<String>,
    /// Resources the statement covers (ARNs or references)
    pub resources: Vec<Value>,
    /// Principal, for trust statements
    pub principal: Option<Principal>,
    /// Condition block, e.g. `IpAddress`/`aws:SourceIp`
    pub condition: Option<Value>,
}

impl Statement {
    /// New allow statement
    #[inline]
    #[must_use]
    pub fn allow() -> Self {
        Self::default()
    }

    /// Add actions
    #[must_use]
    pub fn actions(mut self, actions: &[&str]) -> Self {
        self.actions.extend(actions.iter().map(ToString::to_string));
        self
    }

    /// Add a resource
    #[must_use]
    pub fn resource(mut self, resource: Value) -> Self {
        self.resources.push(resource);
        self
    }

    /// Set the principal
    #[must_use]
    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Set a condition block
    #[must_use]
    pub fn condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Restrict the statement to requests from the given source ranges
    ///
    /// Shorthand for the `IpAddress`/`aws:SourceIp` condition.
    #[must_use]
    pub fn when_source_ip(self, ranges: &[String]) -> Self {
        self.condition(json!({ "IpAddress": { "aws:SourceIp": ranges } }))
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("Effect".to_string(), json!(self.effect.as_str()));
        if !self.actions.is_empty() {
            map.insert("Action".to_string(), json!(self.actions));
        }
        if !self.resources.is_empty() {
            map.insert("Resource".to_string(), json!(self.resources));
        }
        if let Some(principal) = &self.principal {
            map.insert("Principal".to_string(), principal.to_json());
        }
        if let Some(condition) = &self.condition {
            map.insert("Condition".to_string(), condition.clone());
        }
        Value::Object(map)
    }
}

/// A policy document: a version plus an ordered statement list
///
/// A trust document with zero statements is representable on purpose: a role
/// over an empty member list synthesizes unassumable rather than failing.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    version: String,
    statements: Vec<Statement>,
    /// Verbatim document loaded from JSON, bypassing the typed builder
    verbatim: Option<Value>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyDocument {
    /// Empty document with the current policy language version
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: "2012-10-17".to_string(),
            statements: Vec::new(),
            verbatim: None,
        }
    }

    /// Wrap a provider-native policy JSON document verbatim
    ///
    /// Used for managed policy documents maintained as raw JSON files.
    ///
    /// # Errors
    /// [`PolicyError::NotAnObject`] if the root is not a JSON object,
    /// [`PolicyError::MissingStatement`] if it has no `Statement` key.
    pub fn from_json(document: Value) -> Result<Self, PolicyError> {
        let Some(map) = document.as_object() else {
            return Err(PolicyError::NotAnObject);
        };
        if !map.contains_key("Statement") {
            return Err(PolicyError::MissingStatement);
        }
        Ok(Self {
            version: "2012-10-17".to_string(),
            statements: Vec::new(),
            verbatim: Some(document),
        })
    }

    /// Append a statement
    #[must_use]
    pub fn statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Number of statements (verbatim documents report their own)
    #[must_use]
    pub fn statement_count(&self) -> usize {
        match &self.verbatim {
            Some(doc) => doc
                .get("Statement")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            None => self.statements.len(),
        }
    }

    /// Serialize to policy JSON
    #[must_use]
    pub fn to_json(&self) -> Value {
        if let Some(doc) = &self.verbatim {
            return doc.clone();
        }
        json!({
            "Version": self.version,
            "Statement": self.statements.iter().map(Statement::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Build a trust document from one statement per principal
///
/// Each principal gets its own `sts:AssumeRole` statement so per-principal
/// conditions stay independent.
#[must_use]
pub fn composite_trust(principals: Vec<(Principal, Option<Value>)>) -> PolicyDocument {
    let mut doc = PolicyDocument::new();
    for (principal, condition) in principals {
        let mut statement = Statement::allow()
            .actions(&["sts:AssumeRole"])
            .principal(principal);
        if let Some(condition) = condition {
            statement = statement.condition(condition);
        }
        doc = doc.statement(statement);
    }
    doc
}

/// Errors constructing policy documents
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Document root was not a JSON object
    #[error("policy document root must be a JSON object")]
    NotAnObject,

    /// Document has no `Statement` key
    #[error("policy document has no Statement")]
    MissingStatement,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn statement_serializes_in_policy_shape() {
        let doc = PolicyDocument::new().statement(
            Statement::allow()
                .actions(&["secretsmanager:GetSecretValue"])
                .resource(json!("arn:aws:secretsmanager:*")),
        );
        assert_eq!(
            doc.to_json(),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["secretsmanager:GetSecretValue"],
                    "Resource": ["arn:aws:secretsmanager:*"],
                }],
            })
        );
    }

    #[test]
    fn composite_trust_emits_one_statement_per_principal() {
        let doc = composite_trust(vec![
            (
                Principal::Arn(json!("arn:aws:iam::1:user/alice")),
                Some(json!({ "IpAddress": { "aws:SourceIp": ["10.0.0.0/8"] } })),
            ),
            (Principal::Arn(json!("arn:aws:iam::1:user/bob")), None),
        ]);
        let json = doc.to_json();
        let statements = json["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0]["Principal"]["AWS"], "arn:aws:iam::1:user/alice");
        assert!(statements[1].get("Condition").is_none());
    }

    #[test]
    fn empty_trust_document_is_representable() {
        let doc = composite_trust(Vec::new());
        assert_eq!(doc.statement_count(), 0);
        assert_eq!(doc.to_json()["Statement"], json!([]));
    }

    #[test]
    fn verbatim_document_round_trips() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{ "Effect": "Deny", "Action": "*", "Resource": "*" }],
        });
        let doc = PolicyDocument::from_json(raw.clone()).unwrap();
        assert_eq!(doc.to_json(), raw);
        assert_eq!(doc.statement_count(), 1);
    }

    #[test]
    fn from_json_rejects_non_policy() {
        assert!(matches!(
            PolicyDocument::from_json(json!([1, 2])),
            Err(PolicyError::NotAnObject)
        ));
        assert!(matches!(
            PolicyDocument::from_json(json!({ "Version": "2012-10-17" })),
            Err(PolicyError::MissingStatement)
        ));
    }

    #[test]
    fn service_principal_shape() {
        let statement = Statement::allow()
            .actions(&["sts:AssumeRole"])
            .principal(Principal::Service("ecs-tasks.amazonaws.com".to_string()));
        assert_eq!(
            statement.to_json()["Principal"],
            json!({ "Service": "ecs-tasks.amazonaws.com" })
        );
    }
}
