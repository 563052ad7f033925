//! Network composer
//!
//! Composes the transit-gateway hub: the gateway itself, a cross-account
//! resource share, route tables per route domain, and — when a VPC CIDR is
//! configured — the VPC with flow logging, private DNS resolution, and the
//! transit-gateway attachment wiring.

use std::net::Ipv4Addr;

use forge_template::{intrinsics, name_tag, LogicalId, Output, Resource, Stack};
use serde_json::{json, Value};

use crate::error::ComposeError;
use crate::topology::{DnsResources, NetworkTopology, NetworkTopologyBuilder, VpcResources};
use forge_config::{ConfigError, InfraDef};

/// Route domain every deployment gets
const SERVICE_DOMAIN: &str = "SharedService";

/// Composes the network infrastructure from an [`InfraDef`]
#[derive(Debug, Clone)]
pub struct NetworkComposer {
    /// Route domains beyond the mandatory shared-service domain
    extra_route_domains: Vec<String>,
    /// Availability zones to spread subnets across
    max_azs: usize,
    /// Prefix length of derived subnets
    subnet_prefix: u8,
}

impl Default for NetworkComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkComposer {
    /// Composer with the richer route-domain set (`Prod`, `Dev`)
    #[must_use]
    pub fn new() -> Self {
        Self {
            extra_route_domains: vec!["Prod".to_string(), "Dev".to_string()],
            max_azs: 2,
            subnet_prefix: 24,
        }
    }

    /// Replace the extra route domains (the shared-service domain stays)
    #[must_use]
    pub fn with_route_domains(mut self, domains: Vec<String>) -> Self {
        self.extra_route_domains = domains;
        self
    }

    /// Total number of route tables this composer will create
    #[must_use]
    pub fn route_table_count(&self) -> usize {
        1 + self.extra_route_domains.len()
    }

    /// Compose all network resources into `stack`
    ///
    /// Route tables are created before the VPC branch on purpose: their
    /// existence never depends on whether a VPC materializes.
    ///
    /// # Errors
    /// Config violations (including an unparsable VPC CIDR) abort the pass.
    pub fn compose(
        &self,
        stack: &mut Stack,
        def: &InfraDef,
    ) -> Result<NetworkTopology, ComposeError> {
        def.validate()?;
        let prefix = def.name_prefix.as_str();

        let tgw_id = stack.add(
            "transitGateway",
            Resource::new("AWS::EC2::TransitGateway")
                .with("AmazonSideAsn", json!(def.bgp_asn))
                .with("AutoAcceptSharedAttachments", json!("disable"))
                .with("DefaultRouteTableAssociation", json!("disable"))
                .with("DefaultRouteTablePropagation", json!("disable"))
                .with("Description", json!("Transit Gateway"))
                .with("DnsSupport", json!("enable"))
                .with("VpnEcmpSupport", json!("enable"))
                .with("MulticastSupport", json!("disable"))
                .with("TransitGatewayCidrBlocks", json!([def.tgw_cidr]))
                .with("Tags", name_tag(&format!("{prefix}_tgw"))),
        )?;

        let share_arn = stack.format_arn(
            "ec2",
            vec![json!("transit-gateway/"), intrinsics::r#ref(&tgw_id)],
        );
        let share_id = stack.add(
            "ResourceShare",
            Resource::new("AWS::RAM::ResourceShare")
                .with("Name", json!("tgwShare-ram"))
                .with("ResourceArns", json!([share_arn]))
                .with("Principals", json!(def.trust_accounts)),
        )?;

        let mut topology = NetworkTopologyBuilder::new(tgw_id.clone(), share_id);
        let mut route_table_ids = Vec::with_capacity(self.route_table_count());
        for domain in self.domains() {
            let id = stack.add(
                &format!("TGRouteTable{domain}"),
                Resource::new("AWS::EC2::TransitGatewayRouteTable")
                    .with("TransitGatewayId", intrinsics::r#ref(&tgw_id))
                    .with("Tags", name_tag(&format!("{prefix}_{domain}RouteDomain"))),
            )?;
            topology.route_table(domain.clone(), id.clone());
            route_table_ids.push((domain, id));
        }

        if let Some(vpc_cidr) = &def.vpc_cidr {
            let vpc = self.compose_vpc(stack, def, vpc_cidr, &tgw_id, &route_table_ids)?;
            if !def.zone_names.is_empty() {
                let dns = self.compose_dns(stack, def, &vpc)?;
                topology.dns(dns);
            }
            stack.add_output("vpcId", Output::new(intrinsics::r#ref(&vpc.vpc)));
            stack.add_output(
                "transitGatewayId",
                Output::new(intrinsics::get_att(&tgw_id, "Id")),
            );
            topology.vpc(vpc);
        }

        let topology = topology.build();
        tracing::info!(
            route_tables = topology.route_tables.len(),
            vpc = topology.vpc.is_some(),
            dns = topology.dns.is_some(),
            "composed network resources"
        );
        Ok(topology)
    }

    fn domains(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(SERVICE_DOMAIN.to_string()).chain(self.extra_route_domains.iter().cloned())
    }

    fn compose_vpc(
        &self,
        stack: &mut Stack,
        def: &InfraDef,
        vpc_cidr: &str,
        tgw_id: &LogicalId,
        route_tables: &[(String, LogicalId)],
    ) -> Result<VpcResources, ComposeError> {
        let prefix = def.name_prefix.as_str();

        let vpc_id = stack.add(
            "vpc",
            Resource::new("AWS::EC2::VPC")
                .with("CidrBlock", json!(vpc_cidr))
                .with("EnableDnsHostnames", json!(true))
                .with("EnableDnsSupport", json!(true))
                .with("Tags", name_tag(&format!("{prefix}_vpc"))),
        )?;

        // Isolated subnets: one derived block per availability zone, no
        // internet gateway and no public IPs.
        let blocks = subnet_blocks(vpc_cidr, self.subnet_prefix, self.max_azs)?;
        let mut subnet_ids = Vec::with_capacity(blocks.len());
        for (az, block) in blocks.iter().enumerate() {
            let id = stack.add(
                &format!("vpcIsolatedSubnet{az}"),
                Resource::new("AWS::EC2::Subnet")
                    .with("VpcId", intrinsics::r#ref(&vpc_id))
                    .with("CidrBlock", json!(block))
                    .with(
                        "AvailabilityZone",
                        intrinsics::select(az, intrinsics::get_azs()),
                    )
                    .with("MapPublicIpOnLaunch", json!(false))
                    .with("Tags", name_tag(&format!("{prefix}_isolated_{az}"))),
            )?;
            subnet_ids.push(id);
        }

        let bucket_id = stack.add("FlowLogsBucket", Resource::new("AWS::S3::Bucket"))?;
        let flow_log_id = stack.add(
            "FlowLogsToS3",
            Resource::new("AWS::EC2::FlowLog")
                .with("ResourceId", intrinsics::r#ref(&vpc_id))
                .with("ResourceType", json!("VPC"))
                .with("TrafficType", json!("ALL"))
                .with("LogDestinationType", json!("s3"))
                .with("LogDestination", intrinsics::get_att(&bucket_id, "Arn")),
        )?;

        let subnet_refs: Vec<Value> = subnet_ids.iter().map(intrinsics::r#ref).collect();
        let attachment_id = stack.add(
            "transitGatewayAttachment",
            Resource::new("AWS::EC2::TransitGatewayAttachment")
                .with("TransitGatewayId", intrinsics::r#ref(tgw_id))
                .with("VpcId", intrinsics::r#ref(&vpc_id))
                .with("SubnetIds", Value::Array(subnet_refs)),
        )?;

        let connect_id = stack.add(
            "transitGatewayConnect",
            Resource::new("AWS::EC2::TransitGatewayConnect")
                .with("Options", json!({ "Protocol": "gre" }))
                .with(
                    "TransportTransitGatewayAttachmentId",
                    intrinsics::r#ref(&attachment_id),
                )
                .with("Tags", name_tag(&format!("{prefix}_connect"))),
        )?;

        let mut associations = indexmap::IndexMap::new();
        for (domain, table_id) in route_tables {
            let id = stack.add(
                &format!("tgwRtbAssociation{domain}"),
                Resource::new("AWS::EC2::TransitGatewayRouteTableAssociation")
                    .with(
                        "TransitGatewayAttachmentId",
                        intrinsics::r#ref(&attachment_id),
                    )
                    .with("TransitGatewayRouteTableId", intrinsics::r#ref(table_id)),
            )?;
            associations.insert(domain.clone(), id);
        }

        Ok(VpcResources {
            vpc: vpc_id,
            subnets: subnet_ids,
            flow_log_bucket: bucket_id,
            flow_log: flow_log_id,
            attachment: attachment_id,
            connect: connect_id,
            associations,
        })
    }

    fn compose_dns(
        &self,
        stack: &mut Stack,
        def: &InfraDef,
        vpc: &VpcResources,
    ) -> Result<DnsResources, ComposeError> {
        let prefix = def.name_prefix.as_str();
        let region = stack.region();

        let mut zone_ids = Vec::with_capacity(def.zone_names.len());
        for zone in &def.zone_names {
            let fragment: String = zone.chars().filter(char::is_ascii_alphanumeric).collect();
            let id = stack.add(
                &format!("HostedZone{fragment}"),
                Resource::new("AWS::Route53::HostedZone")
                    .with("Name", json!(zone))
                    .with(
                        "VPCs",
                        json!([{
                            "VPCId": intrinsics::r#ref(&vpc.vpc),
                            "VPCRegion": region,
                        }]),
                    ),
            )?;
            zone_ids.push(id);
        }

        let mut ingress = Vec::with_capacity(def.src_ips.len() * 2);
        for src_ip in &def.src_ips {
            for protocol in ["tcp", "udp"] {
                ingress.push(json!({
                    "CidrIp": src_ip,
                    "IpProtocol": protocol,
                    "FromPort": 53,
                    "ToPort": 53,
                    "Description": format!("Allow {} 53", protocol.to_uppercase()),
                }));
            }
        }
        let sg_id = stack.add(
            "route53InboundSG",
            Resource::new("AWS::EC2::SecurityGroup")
                .with("GroupDescription", json!("Allow access to the DNS"))
                .with("VpcId", intrinsics::r#ref(&vpc.vpc))
                .with(
                    "SecurityGroupEgress",
                    json!([{ "CidrIp": "0.0.0.0/0", "IpProtocol": "-1" }]),
                )
                .with("SecurityGroupIngress", Value::Array(ingress)),
        )?;

        let ip_addresses: Vec<Value> = vpc
            .subnets
            .iter()
            .map(|subnet| json!({ "SubnetId": intrinsics::r#ref(subnet) }))
            .collect();
        let resolver_id = stack.add(
            "resolverEndpoint",
            Resource::new("AWS::Route53Resolver::ResolverEndpoint")
                .with("Direction", json!("INBOUND"))
                .with("Name", json!(format!("{prefix}_endpoint")))
                .with("IpAddresses", Value::Array(ip_addresses))
                .with("SecurityGroupIds", json!([intrinsics::get_att(&sg_id, "GroupId")])),
        )?;

        Ok(DnsResources {
            zones: zone_ids,
            security_group: sg_id,
            resolver_endpoint: resolver_id,
        })
    }
}

/// Carve `count` subnet blocks of `new_prefix` length out of a CIDR
///
/// # Errors
/// Invalid CIDR syntax, a prefix longer than the subnet prefix, or a block
/// too small to hold `count` subnets.
fn subnet_blocks(cidr: &str, new_prefix: u8, count: usize) -> Result<Vec<String>, ComposeError> {
    let invalid = |reason: &str| {
        ComposeError::Config(ConfigError::invalid("vpcCidr", cidr, reason.to_string()))
    };

    let (addr_str, len_str) = cidr.split_once('/').ok_or_else(|| invalid("missing `/`"))?;
    let addr: Ipv4Addr = addr_str
        .parse()
        .map_err(|_| invalid("not an IPv4 address"))?;
    let len: u8 = len_str.parse().map_err(|_| invalid("bad prefix length"))?;
    if len > 32 {
        return Err(invalid("prefix length exceeds 32"));
    }
    if new_prefix < len {
        return Err(invalid("block is smaller than one subnet"));
    }

    let available = 1u64 << (new_prefix - len).min(63);
    if (count as u64) > available {
        return Err(invalid("not enough room for the requested subnets"));
    }

    let base = u32::from(addr) & prefix_mask(len);
    let step = 1u32 << (32 - new_prefix);
    Ok((0..count)
        .map(|i| {
            let subnet = Ipv4Addr::from(base + (i as u32) * step);
            format!("{subnet}/{new_prefix}")
        })
        .collect())
}

fn prefix_mask(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - len)
    }
}
