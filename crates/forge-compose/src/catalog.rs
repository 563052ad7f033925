//! Managed-policy catalog
//!
//! Configuration refers to provider-managed policies by bare name. The
//! catalog is the set of names composition will resolve; anything else is a
//! configuration error surfaced before any resource is described.

use std::collections::HashSet;

use crate::error::ComposeError;

/// Registry of resolvable provider-managed policy names
#[derive(Debug, Default, Clone)]
pub struct PolicyCatalog {
    names: HashSet<String>,
}

impl PolicyCatalog {
    /// Create an empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Catalog seeded with the policies the composers attach by default
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register("AdministratorAccess");
        catalog.register("PowerUserAccess");
        catalog.register("ReadOnlyAccess");
        catalog.register("ViewOnlyAccess");
        catalog.register("SecurityAudit");
        catalog.register("IAMUserChangePassword");
        catalog.register("IAMReadOnlyAccess");
        catalog.register("AmazonVPCReadOnlyAccess");
        catalog.register("service-role/AmazonECSTaskExecutionRolePolicy");
        catalog
    }

    /// Register a policy name
    pub fn register(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    /// Check if a name resolves
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of registered names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a policy name to its ARN
    ///
    /// # Errors
    /// [`ComposeError::UnknownManagedPolicy`] naming the failing policy.
    pub fn resolve(&self, name: &str) -> Result<String, ComposeError> {
        if !self.contains(name) {
            return Err(ComposeError::UnknownManagedPolicy {
                name: name.to_string(),
            });
        }
        Ok(format!("arn:aws:iam::aws:policy/{name}"))
    }
}
