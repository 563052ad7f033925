//! Deployment stacks and the top-level app
//!
//! A [`Stack`] is one independently deployable unit: a named template bound
//! to a target [`Environment`]. The [`App`] holds sibling stacks and
//! synthesizes them together.

use serde_json::{json, Value};

use crate::id::LogicalId;
use crate::intrinsics::{self, AWS_ACCOUNT_ID, AWS_REGION};
use crate::resource::{Output, Resource};
use crate::template::{Template, TemplateError};

/// Account/region a stack deploys into
///
/// Both fields are optional: an environment-agnostic stack synthesizes with
/// pseudo parameters resolved at deploy time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Target account id
    pub account: Option<String>,
    /// Target region
    pub region: Option<String>,
}

impl Environment {
    /// Environment pinned to an account and region
    #[inline]
    #[must_use]
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            region: Some(region.into()),
        }
    }

    /// Read the default account/region from the process environment
    ///
    /// Uses `FORGE_DEFAULT_ACCOUNT` / `FORGE_DEFAULT_REGION`; unset variables
    /// leave the stack environment-agnostic.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            account: std::env::var("FORGE_DEFAULT_ACCOUNT").ok(),
            region: std::env::var("FORGE_DEFAULT_REGION").ok(),
        }
    }
}

/// One deployable unit: a named template bound to an environment
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    env: Environment,
    template: Template,
}

impl Stack {
    /// Create an empty stack
    #[must_use]
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
            template: Template::new(),
        }
    }

    /// Stack name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target environment
    #[inline]
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// The accumulated template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Add a resource to the stack's template
    ///
    /// # Errors
    /// Propagates [`TemplateError`] (invalid or duplicate logical id).
    pub fn add(&mut self, id: &str, resource: Resource) -> Result<LogicalId, TemplateError> {
        self.template.add_named(id, resource)
    }

    /// Add an output
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) {
        self.template.add_output(name, output);
    }

    /// Account id value: the pinned account, or the pseudo parameter
    #[must_use]
    pub fn account(&self) -> Value {
        match &self.env.account {
            Some(account) => json!(account),
            None => intrinsics::pseudo(AWS_ACCOUNT_ID),
        }
    }

    /// Region value: the pinned region, or the pseudo parameter
    #[must_use]
    pub fn region(&self) -> Value {
        match &self.env.region {
            Some(region) => json!(region),
            None => intrinsics::pseudo(AWS_REGION),
        }
    }

    /// Build an ARN for a resource in this stack's account/region
    ///
    /// Produces an `Fn::Join` so deploy-time references (`Ref`, pseudo
    /// parameters) can appear in the resource segment.
    #[must_use]
    pub fn format_arn(&self, service: &str, resource: Vec<Value>) -> Value {
        let mut parts = vec![
            json!(format!("arn:aws:{service}:")),
            self.region(),
            json!(":"),
            self.account(),
            json!(":"),
        ];
        parts.extend(resource);
        intrinsics::join(parts)
    }

    /// Synthesize the stack to template JSON
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn synth(&self) -> Result<Value, TemplateError> {
        tracing::info!(stack = %self.name, resources = self.template.len(), "synthesizing stack");
        self.template.to_json()
    }
}

/// Top-level assembly of sibling deployable units
#[derive(Debug, Clone, Default)]
pub struct App {
    stacks: Vec<Stack>,
}

impl App {
    /// Create an empty app
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack, returning a mutable handle for composition
    pub fn add_stack(&mut self, stack: Stack) -> &mut Stack {
        self.stacks.push(stack);
        let idx = self.stacks.len() - 1;
        &mut self.stacks[idx]
    }

    /// Stacks in creation order
    #[inline]
    #[must_use]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Look up a stack by name
    #[must_use]
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Synthesize every stack to `(name, template JSON)` pairs
    ///
    /// # Errors
    /// Fails on the first stack that does not serialize.
    pub fn synth(&self) -> Result<Vec<(String, Value)>, TemplateError> {
        self.stacks
            .iter()
            .map(|s| Ok((s.name.clone(), s.synth()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_environment_resolves_literally() {
        let stack = Stack::new("Infra", Environment::new("111111111111", "ap-northeast-1"));
        assert_eq!(stack.account(), json!("111111111111"));
        assert_eq!(stack.region(), json!("ap-northeast-1"));
    }

    #[test]
    fn agnostic_environment_uses_pseudo_parameters() {
        let stack = Stack::new("Infra", Environment::default());
        assert_eq!(stack.account(), json!({ "Ref": "AWS::AccountId" }));
        assert_eq!(stack.region(), json!({ "Ref": "AWS::Region" }));
    }

    #[test]
    fn format_arn_joins_segments() {
        let stack = Stack::new("Infra", Environment::new("111111111111", "ap-northeast-1"));
        let arn = stack.format_arn("ec2", vec![json!("transit-gateway/tgw-123")]);
        assert_eq!(
            arn,
            json!({ "Fn::Join": ["", [
                "arn:aws:ec2:", "ap-northeast-1", ":", "111111111111", ":",
                "transit-gateway/tgw-123"
            ]]})
        );
    }

    #[test]
    fn app_synthesizes_siblings() {
        let mut app = App::new();
        app.add_stack(Stack::new("Identity", Environment::default()));
        app.add_stack(Stack::new("Network", Environment::default()));
        let synthesized = app.synth().unwrap();
        assert_eq!(synthesized.len(), 2);
        assert_eq!(synthesized[0].0, "Identity");
    }
}
