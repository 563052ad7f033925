//! StackForge Composers
//!
//! Turns validated configuration documents into declarative resource graphs.
//! Three composers cover the deployment: identity (groups, users, roles),
//! network (transit gateway hub, optional VPC and private DNS), and
//! application (the containerized service and its backing resources).
//!
//! # Core Concepts
//!
//! - [`IdentityComposer`] / [`NetworkComposer`] / [`ApplicationComposer`]:
//!   pure functions from config to resources on a [`forge_template::Stack`]
//! - Topology types ([`IdentityTopology`], [`NetworkTopology`],
//!   [`ServiceTopology`]): the logical ids of what was composed
//! - [`PolicyCatalog`]: resolvable provider-managed policy names
//! - [`assembly::compose_all`]: all units as one synthesizable app
//!
//! # Example
//!
//! ```rust
//! use forge_compose::NetworkComposer;
//! use forge_config::InfraDef;
//! use forge_template::{Environment, Stack};
//!
//! # fn main() -> Result<(), forge_compose::ComposeError> {
//! let def = InfraDef::from_json_str(
//!     r#"{ "namePrefix": "core", "bgpAsn": 65000, "tgwCidr": "172.17.0.0/16" }"#,
//! )?;
//! let mut stack = Stack::new("NetworkStack", Environment::default());
//! let topology = NetworkComposer::new().compose(&mut stack, &def)?;
//! assert_eq!(topology.route_tables.len(), 3);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod application;
pub mod assembly;
mod catalog;
mod error;
mod identity;
mod network;
mod topology;

// Re-exports
pub use application::ApplicationComposer;
pub use assembly::{compose_all, AssemblyTopology, ForgeConfig};
pub use catalog::PolicyCatalog;
pub use error::ComposeError;
pub use identity::IdentityComposer;
pub use network::NetworkComposer;
pub use topology::{
    DnsResources, GroupResources, IdentityTopology, NetworkTopology, NetworkTopologyBuilder,
    ServiceTopology, VpcResources,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
