//! StackForge Configuration System
//!
//! Typed configuration documents, loaded explicitly and validated before
//! composition. No process-wide config state: documents are values passed by
//! reference into the composers.
//!
//! # Core Concepts
//!
//! - [`GroupConfig`] / [`GroupDef`]: identity group definitions
//! - [`InfraDef`]: the network infrastructure definition
//! - [`AppDef`]: application service parameters (defaults reproduce the
//!   original single-environment literals)
//! - [`ParamStore`] / [`Fallback`]: parameter lookups with explicit
//!   absence handling
//!
//! # Example
//!
//! ```rust
//! use forge_config::InfraDef;
//!
//! # fn main() -> Result<(), forge_config::ConfigError> {
//! let def = InfraDef::from_json_str(
//!     r#"{ "namePrefix": "core", "bgpAsn": 65000, "tgwCidr": "172.17.0.0/16" }"#,
//! )?;
//! assert!(!def.has_vpc());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod app;
mod error;
mod groups;
mod infra;
mod params;

// Re-exports
pub use app::AppDef;
pub use error::ConfigError;
pub use groups::{GroupConfig, GroupDef};
pub use infra::InfraDef;
pub use params::{resolve, Fallback, ParamStore, StaticParams};

use std::path::Path;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Read a config file to a string, wrapping I/O failures with the path
pub(crate) fn load_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
