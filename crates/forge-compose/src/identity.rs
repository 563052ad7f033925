//! Identity composer
//!
//! Turns the group configuration document into IAM resources: one group per
//! definition, one user per member, managed policy attachments, and one
//! assumable role per group whose trust policy is the union of the member
//! principals under the group's source-IP condition.

use forge_template::{
    composite_trust, intrinsics, LogicalId, PolicyDocument, Principal, Resource, Stack,
};
use serde_json::{json, Value};

use crate::catalog::PolicyCatalog;
use crate::error::ComposeError;
use crate::topology::{GroupResources, IdentityTopology};
use forge_config::{GroupConfig, GroupDef};

/// Composes identity resources from group definitions
#[derive(Debug, Clone)]
pub struct IdentityComposer {
    catalog: PolicyCatalog,
    /// Name given to the shared base managed policy
    base_policy_name: String,
    /// Elevated-access policy attached to every group role
    role_policy: String,
}

impl Default for IdentityComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityComposer {
    /// Composer with the default catalog and role policy
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: PolicyCatalog::with_defaults(),
            base_policy_name: "IamUserMfaAndSwitchRolePolicy".to_string(),
            role_policy: "PowerUserAccess".to_string(),
        }
    }

    /// Replace the managed-policy catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: PolicyCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Compose all identity resources into `stack`
    ///
    /// Groups are processed in document order. The shared base policy is
    /// created once and attached to every group alongside its named managed
    /// policies.
    ///
    /// # Errors
    /// Unresolvable policy names, duplicate identifiers, and config
    /// violations abort the pass; the stack must then be discarded.
    pub fn compose(
        &self,
        stack: &mut Stack,
        config: &GroupConfig,
        base_policy: &PolicyDocument,
    ) -> Result<IdentityTopology, ComposeError> {
        config.validate()?;

        let base_policy_id = stack.add(
            &sanitize(&self.base_policy_name),
            Resource::new("AWS::IAM::ManagedPolicy")
                .with("ManagedPolicyName", json!(self.base_policy_name))
                .with("PolicyDocument", base_policy.to_json()),
        )?;

        let mut groups = Vec::with_capacity(config.len());
        for def in config.iter() {
            groups.push(self.compose_group(stack, def, &base_policy_id)?);
        }

        tracing::info!(groups = groups.len(), "composed identity resources");
        Ok(IdentityTopology {
            base_policy: base_policy_id,
            groups,
        })
    }

    fn compose_group(
        &self,
        stack: &mut Stack,
        def: &GroupDef,
        base_policy_id: &LogicalId,
    ) -> Result<GroupResources, ComposeError> {
        // Named managed policies resolve first: a bad name must fail before
        // any of the group's resources are described.
        let mut policy_arns: Vec<Value> = def
            .policies
            .iter()
            .map(|name| self.catalog.resolve(name).map(|arn| json!(arn)))
            .collect::<Result<_, _>>()?;
        policy_arns.push(intrinsics::r#ref(base_policy_id));

        let group_id = stack.add(
            &format!("{}Group", sanitize(&def.group_name)),
            Resource::new("AWS::IAM::Group")
                .with("GroupName", json!(format!("{}_G", def.group_name)))
                .with("ManagedPolicyArns", Value::Array(policy_arns)),
        )?;

        let mut users = Vec::with_capacity(def.user_names.len());
        let mut principals = Vec::with_capacity(def.user_names.len());
        for user_name in &def.user_names {
            let user_id = stack.add(
                &format!("{}User", sanitize(user_name)),
                Resource::new("AWS::IAM::User")
                    .with("UserName", json!(user_name))
                    .with("Groups", json!([intrinsics::r#ref(&group_id)]))
                    .with(
                        "LoginProfile",
                        json!({
                            "Password": user_name,
                            "PasswordResetRequired": true,
                        }),
                    ),
            )?;
            // The source-IP condition is attached unconditionally: an empty
            // range list makes the statement unsatisfiable, so a group with
            // no ranges yields a role nobody can assume rather than one
            // assumable from anywhere.
            let condition = json!({ "IpAddress": { "aws:SourceIp": def.src_ip } });
            principals.push((
                Principal::Arn(intrinsics::get_att(&user_id, "Arn")),
                Some(condition),
            ));
            users.push(user_id);
        }

        // Zero members yields a trust policy with zero statements: the role
        // is unassumable but composition must not fail.
        let trust = composite_trust(principals);
        let role_id = stack.add(
            &format!("{}Role", sanitize(&def.group_name)),
            Resource::new("AWS::IAM::Role")
                .with("RoleName", json!(format!("{}_R", def.group_name)))
                .with("AssumeRolePolicyDocument", trust.to_json())
                .with(
                    "ManagedPolicyArns",
                    json!([self.catalog.resolve(&self.role_policy)?]),
                ),
        )?;

        tracing::debug!(
            group = %def.group_name,
            members = users.len(),
            "composed group"
        );
        Ok(GroupResources {
            group: group_id,
            users,
            role: role_id,
        })
    }
}

/// Strip characters a logical id cannot carry
fn sanitize(fragment: &str) -> String {
    fragment
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
