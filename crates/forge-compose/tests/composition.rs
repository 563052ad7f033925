//! End-to-end composition tests over realistic configuration documents

use forge_compose::{compose_all, ForgeConfig, IdentityComposer, NetworkComposer};
use forge_config::InfraDef;
use forge_template::Stack;
use forge_test_utils::{
    infra_def_without_vpc, sample_app_def, sample_base_policy, sample_group_config,
    sample_infra_def, test_environment,
};
use serde_json::json;

fn full_config() -> ForgeConfig {
    ForgeConfig {
        groups: sample_group_config(),
        base_policy: sample_base_policy(),
        infra: sample_infra_def(),
        app: Some(sample_app_def()),
    }
}

#[test]
fn hub_only_definition_produces_no_vpc_resources() {
    let mut stack = Stack::new("NetworkStack", test_environment());
    let topology = NetworkComposer::new()
        .compose(&mut stack, &infra_def_without_vpc())
        .unwrap();

    let template = stack.template();
    assert_eq!(template.count_of_type("AWS::EC2::TransitGateway"), 1);
    assert_eq!(template.count_of_type("AWS::EC2::TransitGatewayRouteTable"), 3);
    assert_eq!(template.count_of_type("AWS::EC2::VPC"), 0);
    assert_eq!(template.count_of_type("AWS::EC2::TransitGatewayAttachment"), 0);
    assert_eq!(template.count_of_type("AWS::Route53::HostedZone"), 0);
    assert!(topology.vpc.is_none());
    assert!(!topology.has_attachment());
}

#[test]
fn each_zone_name_becomes_one_hosted_zone() {
    let def = InfraDef::from_json_str(
        r#"{
            "namePrefix": "core",
            "bgpAsn": 65000,
            "vpcCidr": "172.16.0.0/16",
            "tgwCidr": "172.17.0.0/16",
            "zoneNames": ["a.example.com", "b.example.com", "c.example.com"],
            "srcIps": ["10.0.0.0/8"]
        }"#,
    )
    .unwrap();
    let mut stack = Stack::new("NetworkStack", test_environment());
    let topology = NetworkComposer::new().compose(&mut stack, &def).unwrap();

    let template = stack.template();
    assert_eq!(template.count_of_type("AWS::Route53::HostedZone"), 3);
    assert_eq!(
        template.count_of_type("AWS::Route53Resolver::ResolverEndpoint"),
        1
    );
    assert_eq!(topology.dns.unwrap().zones.len(), 3);
}

#[test]
fn vpc_without_zones_still_gets_attachment_and_connect() {
    let def = InfraDef::from_json_str(
        r#"{
            "namePrefix": "core",
            "bgpAsn": 65000,
            "vpcCidr": "172.16.0.0/16",
            "tgwCidr": "172.17.0.0/16",
            "srcIps": ["10.0.0.0/8"]
        }"#,
    )
    .unwrap();
    let mut stack = Stack::new("NetworkStack", test_environment());
    let topology = NetworkComposer::new().compose(&mut stack, &def).unwrap();

    let template = stack.template();
    assert_eq!(template.count_of_type("AWS::EC2::TransitGatewayAttachment"), 1);
    assert_eq!(template.count_of_type("AWS::EC2::TransitGatewayConnect"), 1);
    // srcIps without zones grant nothing: no resolver, no security group
    assert_eq!(template.count_of_type("AWS::EC2::SecurityGroup"), 0);
    assert_eq!(
        template.count_of_type("AWS::Route53Resolver::ResolverEndpoint"),
        0
    );
    assert!(topology.has_attachment());
    assert!(topology.dns.is_none());
}

#[test]
fn worked_example_synthesizes_the_documented_shape() {
    let def = InfraDef::from_json_str(
        r#"{
            "namePrefix": "core",
            "bgpAsn": 65000,
            "vpcCidr": "172.16.0.0/16",
            "tgwCidr": "172.16.0.0/16",
            "trustAccounts": ["111111111111"],
            "zoneNames": ["internal.example.com"],
            "srcIps": ["10.0.0.0/8"]
        }"#,
    )
    .unwrap();
    let mut stack = Stack::new("NetworkStack", test_environment());
    NetworkComposer::new().compose(&mut stack, &def).unwrap();

    let template = stack.template();
    assert!(template.has_resource_properties(
        "AWS::EC2::TransitGateway",
        &json!({
            "AmazonSideAsn": 65000,
            "AutoAcceptSharedAttachments": "disable",
            "DefaultRouteTableAssociation": "disable",
            "DefaultRouteTablePropagation": "disable",
            "DnsSupport": "enable",
            "VpnEcmpSupport": "enable",
            "TransitGatewayCidrBlocks": ["172.16.0.0/16"],
        })
    ));
    assert!(template.has_resource_properties(
        "AWS::RAM::ResourceShare",
        &json!({ "Name": "tgwShare-ram", "Principals": ["111111111111"] })
    ));
    assert!(template.has_resource_properties(
        "AWS::EC2::Subnet",
        &json!({ "CidrBlock": "172.16.0.0/24", "MapPublicIpOnLaunch": false })
    ));
    assert!(template.has_resource_properties(
        "AWS::EC2::Subnet",
        &json!({ "CidrBlock": "172.16.1.0/24" })
    ));
    assert!(template.has_resource_properties(
        "AWS::EC2::FlowLog",
        &json!({ "TrafficType": "ALL", "LogDestinationType": "s3" })
    ));
    assert!(template.has_resource_properties(
        "AWS::EC2::TransitGatewayConnect",
        &json!({ "Options": { "Protocol": "gre" } })
    ));
    assert_eq!(
        template.count_of_type("AWS::EC2::TransitGatewayRouteTableAssociation"),
        3
    );

    let synthesized = stack.synth().unwrap();
    assert_eq!(synthesized["Outputs"]["vpcId"]["Value"], json!({ "Ref": "vpc" }));
    assert_eq!(
        synthesized["Outputs"]["transitGatewayId"]["Value"],
        json!({ "Fn::GetAtt": ["transitGateway", "Id"] })
    );
}

#[test]
fn identity_role_trust_restricts_each_member_to_the_group_ranges() {
    let mut stack = Stack::new("IdentityStack", test_environment());
    let topology = IdentityComposer::new()
        .compose(&mut stack, &sample_group_config(), &sample_base_policy())
        .unwrap();

    let template = stack.template();
    assert_eq!(template.count_of_type("AWS::IAM::Group"), 2);
    assert_eq!(template.count_of_type("AWS::IAM::User"), 2);
    assert_eq!(template.count_of_type("AWS::IAM::Role"), 2);

    let admins = template.get(&topology.groups[0].role).unwrap();
    let trust = admins.property("AssumeRolePolicyDocument").unwrap();
    let statements = trust["Statement"].as_array().unwrap();
    assert_eq!(statements.len(), 2);
    for statement in statements {
        assert_eq!(statement["Action"], json!(["sts:AssumeRole"]));
        assert_eq!(
            statement["Condition"]["IpAddress"]["aws:SourceIp"],
            json!(["10.0.0.0/8"])
        );
    }

    // the memberless group still synthesizes, with an unassumable role
    let auditors = template.get(&topology.groups[1].role).unwrap();
    let trust = auditors.property("AssumeRolePolicyDocument").unwrap();
    assert_eq!(trust["Statement"], json!([]));
}

#[test]
fn full_assembly_builds_three_sibling_stacks() {
    let (app, topology) = compose_all(&test_environment(), &full_config()).unwrap();

    assert_eq!(app.stacks().len(), 3);
    let network = app.stack("NetworkStack").unwrap();
    assert_eq!(network.template().count_of_type("AWS::EC2::TransitGateway"), 1);
    let service = app.stack("AppStack").unwrap();
    assert_eq!(service.template().count_of_type("AWS::ECS::Service"), 1);
    assert_eq!(topology.identity.groups.len(), 2);
    assert!(topology.network.vpc.is_some());
    assert!(topology.service.is_some());
}

#[test]
fn repeated_synthesis_is_byte_identical() {
    let synth = || {
        let (app, _) = compose_all(&test_environment(), &full_config()).unwrap();
        serde_json::to_string(&app.synth().unwrap().into_iter().map(|(_, t)| t).collect::<Vec<_>>())
            .unwrap()
    };
    assert_eq!(synth(), synth());
}
