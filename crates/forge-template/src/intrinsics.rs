//! CloudFormation intrinsic functions and pseudo parameters
//!
//! Small JSON constructors for the intrinsics templates actually need:
//! `Ref`, `Fn::GetAtt`, `Fn::Join`, `Fn::Select`, and `Fn::GetAZs`.

use crate::id::LogicalId;
use serde_json::{json, Value};

/// Pseudo parameter for the deployment region
pub const AWS_REGION: &str = "AWS::Region";

/// Pseudo parameter for the deployment account id
pub const AWS_ACCOUNT_ID: &str = "AWS::AccountId";

/// `{"Ref": id}` referencing another resource in the template
#[inline]
#[must_use]
pub fn r#ref(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

/// `{"Ref": name}` referencing a pseudo parameter
#[inline]
#[must_use]
pub fn pseudo(name: &str) -> Value {
    json!({ "Ref": name })
}

/// `{"Fn::GetAtt": [id, attribute]}`
#[inline]
#[must_use]
pub fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attribute] })
}

/// `{"Fn::Join": ["", parts]}`
#[inline]
#[must_use]
pub fn join(parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": ["", parts] })
}

/// `{"Fn::Select": [index, list]}`
#[inline]
#[must_use]
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{"Fn::GetAZs": ""}` — availability zones of the current region
#[inline]
#[must_use]
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}
