//! StackForge Template System
//!
//! Declarative resource descriptions and the deployable units that carry
//! them.
//!
//! # Core Concepts
//!
//! - [`Resource`]: one provider resource (type name + JSON properties)
//! - [`Template`]: insertion-ordered resource graph with unique logical ids
//! - [`Stack`] / [`App`]: deployable units bound to an [`Environment`]
//! - [`PolicyDocument`]: typed IAM policy/trust documents
//! - [`intrinsics`]: `Ref`, `Fn::GetAtt`, `Fn::Join` JSON constructors
//!
//! # Example
//!
//! ```rust
//! use forge_template::{Environment, Resource, Stack};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), forge_template::TemplateError> {
//! let mut stack = Stack::new("Network", Environment::default());
//! stack.add(
//!     "transitGateway",
//!     Resource::new("AWS::EC2::TransitGateway").with("AmazonSideAsn", json!(65000)),
//! )?;
//! let template = stack.synth()?;
//! assert!(template["Resources"]["transitGateway"].is_object());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod id;
pub mod intrinsics;
mod policy;
mod resource;
mod stack;
mod template;

// Re-exports
pub use id::{LogicalId, LogicalIdError};
pub use policy::{
    composite_trust, Effect, PolicyDocument, PolicyError, Principal, Statement,
};
pub use resource::{name_tag, tags, Output, OutputMap, Resource};
pub use stack::{App, Environment, Stack};
pub use template::{json_subset, Template, TemplateError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stack_synthesis_end_to_end() {
        let mut stack = Stack::new("Network", Environment::new("111111111111", "ap-northeast-1"));
        let tgw = stack
            .add(
                "transitGateway",
                Resource::new("AWS::EC2::TransitGateway")
                    .with("AmazonSideAsn", json!(65000))
                    .with("Tags", name_tag("core_tgw")),
            )
            .unwrap();
        let share_arn = stack.format_arn(
            "ec2",
            vec![json!("transit-gateway/"), intrinsics::r#ref(&tgw)],
        );
        stack
            .add(
                "ResourceShare",
                Resource::new("AWS::RAM::ResourceShare")
                    .with("Name", json!("tgwShare-ram"))
                    .with("ResourceArns", json!([share_arn])),
            )
            .unwrap();
        stack.add_output("transitGatewayId", Output::new(intrinsics::get_att(&tgw, "Id")));

        let template = stack.synth().unwrap();
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(
            template["Resources"]["transitGateway"]["Properties"]["AmazonSideAsn"],
            65000
        );
        assert_eq!(
            template["Outputs"]["transitGatewayId"]["Value"],
            json!({ "Fn::GetAtt": ["transitGateway", "Id"] })
        );
    }

    #[test]
    fn duplicate_resource_fails_the_whole_stack() {
        let mut stack = Stack::new("Identity", Environment::default());
        stack.add("adminsGroup", Resource::new("AWS::IAM::Group")).unwrap();
        assert!(stack.add("adminsGroup", Resource::new("AWS::IAM::Group")).is_err());
    }
}
