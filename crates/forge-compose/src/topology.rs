//! Topology value types
//!
//! Immutable summaries of what a composer produced: the logical ids of the
//! interesting resources, grouped the way the composition branched. Optional
//! sub-resources are accumulated through [`NetworkTopologyBuilder`] and
//! frozen into a [`NetworkTopology`].

use forge_template::LogicalId;
use indexmap::IndexMap;

/// Resources produced for one identity group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResources {
    /// The group resource
    pub group: LogicalId,
    /// One user per member, in document order
    pub users: Vec<LogicalId>,
    /// The group's assumable role
    pub role: LogicalId,
}

/// Everything the identity composer produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityTopology {
    /// The shared base managed policy
    pub base_policy: LogicalId,
    /// Per-group resources, in document order
    pub groups: Vec<GroupResources>,
}

/// VPC-dependent resources of the network topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcResources {
    /// The VPC itself
    pub vpc: LogicalId,
    /// Isolated subnets, one per availability zone
    pub subnets: Vec<LogicalId>,
    /// Flow log delivery bucket
    pub flow_log_bucket: LogicalId,
    /// The flow log
    pub flow_log: LogicalId,
    /// Transit gateway attachment over all subnets
    pub attachment: LogicalId,
    /// GRE connect layered on the attachment
    pub connect: LogicalId,
    /// Route-table associations, keyed by route domain
    pub associations: IndexMap<String, LogicalId>,
}

/// DNS resolution resources (present only when zone names were configured)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResources {
    /// Private hosted zones, in configuration order
    pub zones: Vec<LogicalId>,
    /// Resolver ingress security group
    pub security_group: LogicalId,
    /// Inbound resolver endpoint
    pub resolver_endpoint: LogicalId,
}

/// Everything the network composer produced
///
/// `vpc` and `dns` mirror the conditional branches: a missing VPC CIDR means
/// `vpc == None`, and empty zone names mean `dns == None`. Route tables exist
/// regardless of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTopology {
    /// The transit gateway
    pub transit_gateway: LogicalId,
    /// Cross-account resource share for the gateway
    pub resource_share: LogicalId,
    /// Route tables, keyed by route domain, mandatory domain first
    pub route_tables: IndexMap<String, LogicalId>,
    /// VPC branch, if a CIDR was configured
    pub vpc: Option<VpcResources>,
    /// DNS branch, if zone names were configured
    pub dns: Option<DnsResources>,
}

impl NetworkTopology {
    /// Whether the attachment (and thus the connect) exists
    #[inline]
    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.vpc.is_some()
    }
}

/// Accumulates network topology pieces as composition branches
///
/// The mandatory resources are constructor arguments; only genuinely
/// optional branches are settable afterwards.
#[derive(Debug)]
pub struct NetworkTopologyBuilder {
    transit_gateway: LogicalId,
    resource_share: LogicalId,
    route_tables: IndexMap<String, LogicalId>,
    vpc: Option<VpcResources>,
    dns: Option<DnsResources>,
}

impl NetworkTopologyBuilder {
    /// Start a builder over the mandatory resources
    #[must_use]
    pub fn new(transit_gateway: LogicalId, resource_share: LogicalId) -> Self {
        Self {
            transit_gateway,
            resource_share,
            route_tables: IndexMap::new(),
            vpc: None,
            dns: None,
        }
    }

    /// Record a route table under its domain
    pub fn route_table(&mut self, domain: impl Into<String>, id: LogicalId) -> &mut Self {
        self.route_tables.insert(domain.into(), id);
        self
    }

    /// Record the VPC branch
    pub fn vpc(&mut self, vpc: VpcResources) -> &mut Self {
        self.vpc = Some(vpc);
        self
    }

    /// Record the DNS branch
    pub fn dns(&mut self, dns: DnsResources) -> &mut Self {
        self.dns = Some(dns);
        self
    }

    /// Freeze into an immutable topology
    #[must_use]
    pub fn build(self) -> NetworkTopology {
        NetworkTopology {
            transit_gateway: self.transit_gateway,
            resource_share: self.resource_share,
            route_tables: self.route_tables,
            vpc: self.vpc,
            dns: self.dns,
        }
    }
}

/// Everything the application composer produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTopology {
    /// VPC interface/gateway endpoints, in creation order
    pub endpoints: Vec<LogicalId>,
    /// Registry pull-through cache rule
    pub pull_through_cache: LogicalId,
    /// Load balancer security group
    pub alb_security_group: LogicalId,
    /// The application load balancer
    pub load_balancer: LogicalId,
    /// Database security group
    pub db_security_group: LogicalId,
    /// Generated database credentials secret
    pub db_secret: LogicalId,
    /// The database instance
    pub database: LogicalId,
    /// Private service-discovery namespace
    pub namespace: LogicalId,
    /// Task execution role
    pub execution_role: LogicalId,
    /// Task role
    pub task_role: LogicalId,
    /// Container log group
    pub log_group: LogicalId,
    /// The task definition
    pub task_definition: LogicalId,
    /// Container cluster
    pub cluster: LogicalId,
    /// Service security group
    pub service_security_group: LogicalId,
    /// The load-balanced service
    pub service: LogicalId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn id(s: &str) -> LogicalId {
        LogicalId::from_str(s).unwrap()
    }

    #[test]
    fn builder_without_branches_yields_no_vpc_or_dns() {
        let mut builder =
            NetworkTopologyBuilder::new(id("transitGateway"), id("ResourceShare"));
        builder.route_table("SharedService", id("TGRouteTableSharedService"));
        let topology = builder.build();
        assert!(topology.vpc.is_none());
        assert!(topology.dns.is_none());
        assert!(!topology.has_attachment());
        assert_eq!(topology.route_tables.len(), 1);
    }

    #[test]
    fn route_table_order_is_insertion_order() {
        let mut builder = NetworkTopologyBuilder::new(id("tgw"), id("share"));
        builder.route_table("SharedService", id("a"));
        builder.route_table("Prod", id("b"));
        builder.route_table("Dev", id("c"));
        let topology = builder.build();
        let domains: Vec<_> = topology.route_tables.keys().cloned().collect();
        assert_eq!(domains, vec!["SharedService", "Prod", "Dev"]);
    }
}
