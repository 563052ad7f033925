//! Top-level assembly
//!
//! Runs all three composers and assembles their stacks into one [`App`]:
//! `IdentityStack`, `NetworkStack`, and `AppStack` as siblings sharing a
//! target environment.

use forge_template::{App, Environment, PolicyDocument, Stack};

use crate::application::ApplicationComposer;
use crate::error::ComposeError;
use crate::identity::IdentityComposer;
use crate::network::NetworkComposer;
use crate::topology::{IdentityTopology, NetworkTopology, ServiceTopology};
use forge_config::{AppDef, GroupConfig, InfraDef};

/// Everything the assembly needs to compose a full deployment
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    /// Identity group definitions
    pub groups: GroupConfig,
    /// Base managed-policy document shared by all groups
    pub base_policy: PolicyDocument,
    /// Network infrastructure definition
    pub infra: InfraDef,
    /// Application service definition; absent skips the service stack
    pub app: Option<AppDef>,
}

/// What [`compose_all`] produced, alongside the [`App`] itself
#[derive(Debug, Clone)]
pub struct AssemblyTopology {
    /// Identity composer output
    pub identity: IdentityTopology,
    /// Network composer output
    pub network: NetworkTopology,
    /// Application composer output, if a service was configured
    pub service: Option<ServiceTopology>,
}

/// Compose all configured units into a synthesizable [`App`]
///
/// Stacks are composed in a fixed order so repeated runs over the same
/// configuration synthesize identical JSON.
///
/// # Errors
/// The first composer failure aborts the whole assembly; a partially
/// composed app is never returned.
pub fn compose_all(
    env: &Environment,
    config: &ForgeConfig,
) -> Result<(App, AssemblyTopology), ComposeError> {
    let mut app = App::new();

    let identity_stack = app.add_stack(Stack::new("IdentityStack", env.clone()));
    let identity =
        IdentityComposer::new().compose(identity_stack, &config.groups, &config.base_policy)?;

    let network_stack = app.add_stack(Stack::new("NetworkStack", env.clone()));
    let network = NetworkComposer::new().compose(network_stack, &config.infra)?;

    let service = match &config.app {
        Some(def) => {
            let app_stack = app.add_stack(Stack::new("AppStack", env.clone()));
            Some(ApplicationComposer::new().compose(app_stack, def)?)
        }
        None => None,
    };

    tracing::info!(stacks = app.stacks().len(), "assembled deployment");
    Ok((
        app,
        AssemblyTopology {
            identity,
            network,
            service,
        },
    ))
}
