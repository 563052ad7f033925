//! Application composer
//!
//! Composes the containerized identity-management service into an existing
//! VPC: registry endpoints and pull-through cache, an internal load balancer,
//! a managed database with generated credentials, a private service-discovery
//! namespace, and the container service wired to all of them.

use forge_template::{
    intrinsics, LogicalId, PolicyDocument, Principal, Resource, Stack, Statement,
};
use serde_json::{json, Value};

use crate::catalog::PolicyCatalog;
use crate::error::ComposeError;
use crate::topology::ServiceTopology;
use forge_config::AppDef;

/// Port the container listens on
const CONTAINER_PORT: u16 = 8080;
/// MySQL port
const DB_PORT: u16 = 3306;
/// Interface endpoints the task needs to pull images and read secrets
const INTERFACE_ENDPOINTS: &[(&str, &str)] = &[
    ("EcrApiEndpoint", "ecr.api"),
    ("EcrDockerEndpoint", "ecr.dkr"),
    ("LogsEndpoint", "logs"),
    ("SecretsManagerEndpoint", "secretsmanager"),
];

/// Composes the application service from an [`AppDef`]
#[derive(Debug, Clone)]
pub struct ApplicationComposer {
    catalog: PolicyCatalog,
    /// Managed policy granting the execution role its baseline permissions
    execution_policy: String,
}

impl Default for ApplicationComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationComposer {
    /// Composer with the default catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: PolicyCatalog::with_defaults(),
            execution_policy: "service-role/AmazonECSTaskExecutionRolePolicy".to_string(),
        }
    }

    /// Replace the managed-policy catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: PolicyCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Compose all application resources into `stack`
    ///
    /// # Errors
    /// Unresolvable policy names, duplicate identifiers, and config
    /// violations abort the pass.
    pub fn compose(
        &self,
        stack: &mut Stack,
        def: &AppDef,
    ) -> Result<ServiceTopology, ComposeError> {
        def.validate()?;

        let endpoints = self.compose_endpoints(stack, def)?;
        let pull_through_cache = stack.add(
            "pullThroughCacheRule",
            Resource::new("AWS::ECR::PullThroughCacheRule")
                .with("EcrRepositoryPrefix", json!(def.repo_prefix))
                .with("UpstreamRegistryUrl", json!(def.upstream_registry)),
        )?;

        let (alb_sg, alb) = self.compose_load_balancer(stack, def)?;
        let (db_sg, secret, database) = self.compose_database(stack, def)?;

        let namespace = stack.add(
            "namespace",
            Resource::new("AWS::ServiceDiscovery::PrivateDnsNamespace")
                .with("Name", json!(def.namespace_name))
                .with("Vpc", json!(def.vpc_id)),
        )?;

        let (execution_role, task_role) = self.compose_roles(stack, def, &secret)?;
        let log_group = stack.add(
            "logGroup",
            Resource::new("AWS::Logs::LogGroup")
                .with("LogGroupName", json!(format!("/ecs/{}", def.service_name)))
                .with("RetentionInDays", json!(30)),
        )?;

        let task_definition = self.compose_task_definition(
            stack,
            def,
            &alb,
            &secret,
            &execution_role,
            &task_role,
            &log_group,
        )?;

        let (cluster, service_sg, service) = self.compose_service(
            stack,
            def,
            &alb,
            &alb_sg,
            &namespace,
            &task_definition,
        )?;

        tracing::info!(
            endpoints = endpoints.len(),
            desired_count = def.desired_count,
            "composed application resources"
        );
        Ok(ServiceTopology {
            endpoints,
            pull_through_cache,
            alb_security_group: alb_sg,
            load_balancer: alb,
            db_security_group: db_sg,
            db_secret: secret,
            database,
            namespace,
            execution_role,
            task_role,
            log_group,
            task_definition,
            cluster,
            service_security_group: service_sg,
            service,
        })
    }

    /// Interface endpoints for the registries, logs, and secrets, plus the
    /// S3 gateway endpoint the registry pulls layers through.
    fn compose_endpoints(
        &self,
        stack: &mut Stack,
        def: &AppDef,
    ) -> Result<Vec<LogicalId>, ComposeError> {
        let region = stack.region();
        let subnet_ids = json!(def.subnet_ids);

        let mut endpoints = Vec::with_capacity(INTERFACE_ENDPOINTS.len() + 1);
        for &(id, service) in INTERFACE_ENDPOINTS {
            let service_name = intrinsics::join(vec![
                json!("com.amazonaws."),
                region.clone(),
                json!(format!(".{service}")),
            ]);
            let endpoint = stack.add(
                id,
                Resource::new("AWS::EC2::VPCEndpoint")
                    .with("VpcEndpointType", json!("Interface"))
                    .with("ServiceName", service_name)
                    .with("VpcId", json!(def.vpc_id))
                    .with("SubnetIds", subnet_ids.clone())
                    .with("PrivateDnsEnabled", json!(true)),
            )?;
            endpoints.push(endpoint);
        }

        let s3_service = intrinsics::join(vec![
            json!("com.amazonaws."),
            region,
            json!(".s3"),
        ]);
        endpoints.push(stack.add(
            "S3GatewayEndpoint",
            Resource::new("AWS::EC2::VPCEndpoint")
                .with("VpcEndpointType", json!("Gateway"))
                .with("ServiceName", s3_service)
                .with("VpcId", json!(def.vpc_id)),
        )?);
        Ok(endpoints)
    }

    fn compose_load_balancer(
        &self,
        stack: &mut Stack,
        def: &AppDef,
    ) -> Result<(LogicalId, LogicalId), ComposeError> {
        let alb_sg = stack.add(
            "albSg",
            Resource::new("AWS::EC2::SecurityGroup")
                .with("GroupDescription", json!("Security group for alb"))
                .with("VpcId", json!(def.vpc_id))
                .with(
                    "SecurityGroupIngress",
                    json!([{
                        "CidrIp": "0.0.0.0/0",
                        "IpProtocol": "tcp",
                        "FromPort": 443,
                        "ToPort": 443,
                        "Description": "Allow HTTPS",
                    }]),
                )
                .with(
                    "SecurityGroupEgress",
                    json!([{ "CidrIp": "0.0.0.0/0", "IpProtocol": "-1" }]),
                ),
        )?;

        let alb = stack.add(
            "alb",
            Resource::new("AWS::ElasticLoadBalancingV2::LoadBalancer")
                .with("Name", json!(def.load_balancer_name))
                .with("Scheme", json!("internal"))
                .with("Type", json!("application"))
                .with("Subnets", json!(def.subnet_ids))
                .with(
                    "SecurityGroups",
                    json!([intrinsics::get_att(&alb_sg, "GroupId")]),
                ),
        )?;
        Ok((alb_sg, alb))
    }

    /// Database branch: security group, generated credentials, the instance,
    /// and the attachment that writes host/port back into the secret.
    fn compose_database(
        &self,
        stack: &mut Stack,
        def: &AppDef,
    ) -> Result<(LogicalId, LogicalId, LogicalId), ComposeError> {
        let db_sg = stack.add(
            "rdsSg",
            Resource::new("AWS::EC2::SecurityGroup")
                .with("GroupDescription", json!("Security group for RDS"))
                .with("VpcId", json!(def.vpc_id))
                .with(
                    "SecurityGroupIngress",
                    json!([{
                        "CidrIp": "0.0.0.0/0",
                        "IpProtocol": "tcp",
                        "FromPort": DB_PORT,
                        "ToPort": DB_PORT,
                        "Description": "Allow MySQL",
                    }]),
                ),
        )?;

        let subnet_group = stack.add(
            "dbSubnetGroup",
            Resource::new("AWS::RDS::DBSubnetGroup")
                .with("DBSubnetGroupDescription", json!("Subnets for the database"))
                .with("SubnetIds", json!(def.subnet_ids)),
        )?;

        let secret = stack.add(
            "dbSecret",
            Resource::new("AWS::SecretsManager::Secret")
                .with("Name", json!("dbSecret"))
                .with(
                    "GenerateSecretString",
                    json!({
                        "SecretStringTemplate": "{\"username\": \"admin\"}",
                        "GenerateStringKey": "password",
                        "ExcludePunctuation": true,
                    }),
                ),
        )?;

        let database = stack.add(
            "rdsInstance",
            Resource::new("AWS::RDS::DBInstance")
                .with("Engine", json!("mysql"))
                .with("EngineVersion", json!("8.0.28"))
                .with("DBInstanceClass", json!("db.t2.micro"))
                .with("AllocatedStorage", json!("20"))
                .with("DBName", json!(def.database_name))
                .with("MasterUsername", resolve_secret(&secret, "username"))
                .with("MasterUserPassword", resolve_secret(&secret, "password"))
                .with("DBSubnetGroupName", intrinsics::r#ref(&subnet_group))
                .with(
                    "VPCSecurityGroups",
                    json!([intrinsics::get_att(&db_sg, "GroupId")]),
                ),
        )?;

        stack.add(
            "dbSecretAttachment",
            Resource::new("AWS::SecretsManager::SecretTargetAttachment")
                .with("SecretId", intrinsics::r#ref(&secret))
                .with("TargetId", intrinsics::r#ref(&database))
                .with("TargetType", json!("AWS::RDS::DBInstance")),
        )?;
        Ok((db_sg, secret, database))
    }

    /// Execution and task roles. The execution role carries two inline
    /// policies: one to read the generated credentials, one to create cached
    /// repositories on first pull.
    fn compose_roles(
        &self,
        stack: &mut Stack,
        def: &AppDef,
        secret: &LogicalId,
    ) -> Result<(LogicalId, LogicalId), ComposeError> {
        let service_trust = PolicyDocument::new().statement(
            Statement::allow()
                .actions(&["sts:AssumeRole"])
                .principal(Principal::Service("ecs-tasks.amazonaws.com".to_string())),
        );

        let execution_role = stack.add(
            "executionRole",
            Resource::new("AWS::IAM::Role")
                .with("AssumeRolePolicyDocument", service_trust.to_json())
                .with(
                    "ManagedPolicyArns",
                    json!([self.catalog.resolve(&self.execution_policy)?]),
                ),
        )?;

        let secrets_access = PolicyDocument::new().statement(
            Statement::allow()
                .actions(&["secretsmanager:GetSecretValue"])
                .resource(intrinsics::r#ref(secret)),
        );
        stack.add(
            "SecretsManagerAccess",
            Resource::new("AWS::IAM::Policy")
                .with("PolicyName", json!("SecretsManagerAccess"))
                .with("PolicyDocument", secrets_access.to_json())
                .with("Roles", json!([intrinsics::r#ref(&execution_role)])),
        )?;

        let cache_repo_arn = stack.format_arn(
            "ecr",
            vec![json!(format!("repository/{}/*", def.repo_prefix))],
        );
        let pull_through = PolicyDocument::new().statement(
            Statement::allow()
                .actions(&["ecr:CreateRepository", "ecr:BatchImportUpstreamImage"])
                .resource(cache_repo_arn),
        );
        stack.add(
            "PullThroughCachePolicy",
            Resource::new("AWS::IAM::Policy")
                .with("PolicyName", json!("PullThroughCachePolicy"))
                .with("PolicyDocument", pull_through.to_json())
                .with("Roles", json!([intrinsics::r#ref(&execution_role)])),
        )?;

        let task_role = stack.add(
            "taskRole",
            Resource::new("AWS::IAM::Role")
                .with("AssumeRolePolicyDocument", service_trust.to_json()),
        )?;
        Ok((execution_role, task_role))
    }

    #[allow(clippy::too_many_arguments)]
    fn compose_task_definition(
        &self,
        stack: &mut Stack,
        def: &AppDef,
        alb: &LogicalId,
        secret: &LogicalId,
        execution_role: &LogicalId,
        task_role: &LogicalId,
        log_group: &LogicalId,
    ) -> Result<LogicalId, ComposeError> {
        // The image comes out of the pull-through cache in this account, not
        // straight from the upstream registry.
        let image = intrinsics::join(vec![
            stack.account(),
            json!(".dkr.ecr."),
            stack.region(),
            json!(format!(
                ".amazonaws.com/{}/{}",
                def.repo_prefix, def.container_image
            )),
        ]);

        // KC_DB_URL stays a literal: the ${...} placeholders are expanded by
        // the container entrypoint from the other KC_DB_URL_* variables.
        let environment = json!([
            { "Name": "KC_HOSTNAME", "Value": intrinsics::get_att(alb, "DNSName") },
            {
                "Name": "KC_HOSTNAME_ADMIN_URL",
                "Value": intrinsics::join(vec![
                    json!("https://"),
                    intrinsics::get_att(alb, "DNSName"),
                ]),
            },
            { "Name": "KC_PROXY", "Value": "edge" },
            { "Name": "KC_DB_URL_DATABASE", "Value": def.database_name },
            { "Name": "KC_DB_URL_PORT", "Value": DB_PORT.to_string() },
            {
                "Name": "KC_DB_URL",
                "Value": "jdbc:mysql://${KC_DB_URL_HOST}:${KC_DB_URL_PORT}/${KC_DB_URL_DATABASE}",
            },
            { "Name": "KC_DB", "Value": "mysql" },
            { "Name": "KC_HTTP_ENABLED", "Value": "true" },
            { "Name": "KC_HOSTNAME_STRICT", "Value": "false" },
            { "Name": "KC_HOSTNAME_STRICT_HTTPS", "Value": "false" },
            { "Name": "KC_CACHE", "Value": "ispn" },
            { "Name": "KC_CACHE_STACK", "Value": "kubernetes" },
            { "Name": "KEYCLOAK_ADMIN", "Value": "admin" },
            { "Name": "KEYCLOAK_ADMIN_PASSWORD", "Value": "admin" },
            {
                "Name": "JAVA_OPTS_APPEND",
                "Value": format!(
                    "-Djgroups.dns.query={}.{}",
                    def.record, def.namespace_name
                ),
            },
        ]);

        let secrets = json!([
            { "Name": "KC_DB_URL_HOST", "ValueFrom": secret_field(secret, "host") },
            { "Name": "KC_DB_USERNAME", "ValueFrom": secret_field(secret, "username") },
            { "Name": "KC_DB_PASSWORD", "ValueFrom": secret_field(secret, "password") },
        ]);

        let container = json!({
            "Name": def.service_name,
            "Image": image,
            "Command": ["start"],
            "PortMappings": [{ "ContainerPort": CONTAINER_PORT, "Protocol": "tcp" }],
            "Environment": environment,
            "Secrets": secrets,
            "LogConfiguration": {
                "LogDriver": "awslogs",
                "Options": {
                    "awslogs-group": intrinsics::r#ref(log_group),
                    "awslogs-region": stack.region(),
                    "awslogs-stream-prefix": def.service_name,
                },
            },
        });

        let task_definition = stack.add(
            "taskDefinition",
            Resource::new("AWS::ECS::TaskDefinition")
                .with("Family", json!(def.service_name))
                .with("Cpu", json!(def.cpu.to_string()))
                .with("Memory", json!(def.memory_mib.to_string()))
                .with("NetworkMode", json!("awsvpc"))
                .with("RequiresCompatibilities", json!(["FARGATE"]))
                .with("ExecutionRoleArn", intrinsics::get_att(execution_role, "Arn"))
                .with("TaskRoleArn", intrinsics::get_att(task_role, "Arn"))
                .with("ContainerDefinitions", json!([container])),
        )?;
        Ok(task_definition)
    }

    /// Cluster, target group, listener, discovery record, and the service
    fn compose_service(
        &self,
        stack: &mut Stack,
        def: &AppDef,
        alb: &LogicalId,
        alb_sg: &LogicalId,
        namespace: &LogicalId,
        task_definition: &LogicalId,
    ) -> Result<(LogicalId, LogicalId, LogicalId), ComposeError> {
        let cluster = stack.add(
            "cluster",
            Resource::new("AWS::ECS::Cluster").with("ClusterName", json!(def.cluster_name)),
        )?;

        let service_sg = stack.add(
            "ecsSg",
            Resource::new("AWS::EC2::SecurityGroup")
                .with("GroupDescription", json!("Security group for the service"))
                .with("VpcId", json!(def.vpc_id))
                .with(
                    "SecurityGroupIngress",
                    json!([{
                        "SourceSecurityGroupId": intrinsics::get_att(alb_sg, "GroupId"),
                        "IpProtocol": "tcp",
                        "FromPort": CONTAINER_PORT,
                        "ToPort": CONTAINER_PORT,
                        "Description": "Allow traffic from the load balancer",
                    }]),
                ),
        )?;

        let target_group = stack.add(
            "targetGroup",
            Resource::new("AWS::ElasticLoadBalancingV2::TargetGroup")
                .with("Port", json!(CONTAINER_PORT))
                .with("Protocol", json!("HTTP"))
                .with("TargetType", json!("ip"))
                .with("VpcId", json!(def.vpc_id)),
        )?;

        let listener = stack.add(
            "httpsListener",
            Resource::new("AWS::ElasticLoadBalancingV2::Listener")
                .with("LoadBalancerArn", intrinsics::r#ref(alb))
                .with("Port", json!(443))
                .with("Protocol", json!("HTTPS"))
                .with(
                    "Certificates",
                    json!([{ "CertificateArn": def.certificate_arn }]),
                )
                .with(
                    "DefaultActions",
                    json!([{
                        "Type": "forward",
                        "TargetGroupArn": intrinsics::r#ref(&target_group),
                    }]),
                ),
        )?;

        let discovery = stack.add(
            "discoveryService",
            Resource::new("AWS::ServiceDiscovery::Service")
                .with("Name", json!(def.record))
                .with(
                    "DnsConfig",
                    json!({
                        "NamespaceId": intrinsics::get_att(namespace, "Id"),
                        "DnsRecords": [{ "Type": "A", "TTL": 30 }],
                    }),
                ),
        )?;

        let service = stack.add(
            "service",
            Resource::new("AWS::ECS::Service")
                .with("Cluster", intrinsics::r#ref(&cluster))
                .with("ServiceName", json!(def.service_name))
                .with("LaunchType", json!("FARGATE"))
                .with("DesiredCount", json!(def.desired_count))
                .with("TaskDefinition", intrinsics::r#ref(task_definition))
                .with(
                    "NetworkConfiguration",
                    json!({
                        "AwsvpcConfiguration": {
                            "Subnets": def.subnet_ids,
                            "SecurityGroups": [intrinsics::get_att(&service_sg, "GroupId")],
                            "AssignPublicIp": "DISABLED",
                        },
                    }),
                )
                .with(
                    "LoadBalancers",
                    json!([{
                        "ContainerName": def.service_name,
                        "ContainerPort": CONTAINER_PORT,
                        "TargetGroupArn": intrinsics::r#ref(&target_group),
                    }]),
                )
                .with(
                    "ServiceRegistries",
                    json!([{ "RegistryArn": intrinsics::get_att(&discovery, "Arn") }]),
                )
                .depends_on(listener),
        )?;
        Ok((cluster, service_sg, service))
    }
}

/// Deploy-time secret resolution for database credentials
fn resolve_secret(secret: &LogicalId, field: &str) -> Value {
    intrinsics::join(vec![
        json!("{{resolve:secretsmanager:"),
        intrinsics::r#ref(secret),
        json!(format!(":SecretString:{field}}}}}")),
    ])
}

/// Container secret reference: `<secret arn>:<field>::`
fn secret_field(secret: &LogicalId, field: &str) -> Value {
    intrinsics::join(vec![
        intrinsics::r#ref(secret),
        json!(format!(":{field}::")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_template::Environment;
    use pretty_assertions::assert_eq;

    fn compose_default() -> (Stack, ServiceTopology) {
        let mut stack = Stack::new("App", Environment::new("123456789012", "ap-northeast-1"));
        let topology = ApplicationComposer::new()
            .compose(&mut stack, &AppDef::default())
            .unwrap();
        (stack, topology)
    }

    #[test]
    fn composes_the_full_service_graph() {
        let (stack, topology) = compose_default();
        let template = stack.template();

        assert_eq!(template.count_of_type("AWS::EC2::VPCEndpoint"), 5);
        assert_eq!(template.count_of_type("AWS::ECR::PullThroughCacheRule"), 1);
        assert_eq!(template.count_of_type("AWS::EC2::SecurityGroup"), 3);
        assert_eq!(
            template.count_of_type("AWS::ElasticLoadBalancingV2::LoadBalancer"),
            1
        );
        assert_eq!(template.count_of_type("AWS::RDS::DBInstance"), 1);
        assert_eq!(template.count_of_type("AWS::SecretsManager::Secret"), 1);
        assert_eq!(
            template.count_of_type("AWS::SecretsManager::SecretTargetAttachment"),
            1
        );
        assert_eq!(template.count_of_type("AWS::IAM::Role"), 2);
        assert_eq!(template.count_of_type("AWS::IAM::Policy"), 2);
        assert_eq!(template.count_of_type("AWS::ECS::TaskDefinition"), 1);
        assert_eq!(template.count_of_type("AWS::ECS::Service"), 1);
        assert_eq!(topology.endpoints.len(), 5);
    }

    #[test]
    fn load_balancer_is_internal() {
        let (stack, _) = compose_default();
        assert!(stack.template().has_resource_properties(
            "AWS::ElasticLoadBalancingV2::LoadBalancer",
            &json!({ "Name": "kc-alb", "Scheme": "internal", "Type": "application" })
        ));
    }

    #[test]
    fn cache_rule_mirrors_the_upstream_registry() {
        let (stack, _) = compose_default();
        assert!(stack.template().has_resource_properties(
            "AWS::ECR::PullThroughCacheRule",
            &json!({ "EcrRepositoryPrefix": "kc-quay", "UpstreamRegistryUrl": "quay.io" })
        ));
    }

    #[test]
    fn database_credentials_resolve_from_the_secret() {
        let (stack, topology) = compose_default();
        let db = stack.template().get(&topology.database).unwrap();
        assert_eq!(db.property("Engine"), Some(&json!("mysql")));
        assert_eq!(db.property("EngineVersion"), Some(&json!("8.0.28")));
        assert_eq!(db.property("DBName"), Some(&json!("kc_db")));
        assert_eq!(
            db.property("MasterUsername"),
            Some(&json!({ "Fn::Join": ["", [
                "{{resolve:secretsmanager:",
                { "Ref": "dbSecret" },
                ":SecretString:username}}",
            ]]}))
        );
    }

    #[test]
    fn hostname_tracks_the_load_balancer() {
        let (stack, topology) = compose_default();
        let task = stack.template().get(&topology.task_definition).unwrap();
        let containers = task.property("ContainerDefinitions").unwrap();
        let environment = containers[0]["Environment"].as_array().unwrap();
        let hostname = environment
            .iter()
            .find(|e| e["Name"] == "KC_HOSTNAME")
            .unwrap();
        assert_eq!(hostname["Value"], json!({ "Fn::GetAtt": ["alb", "DNSName"] }));
    }

    #[test]
    fn container_starts_in_production_mode_with_the_jdbc_url_template() {
        let (stack, topology) = compose_default();
        let task = stack.template().get(&topology.task_definition).unwrap();
        let containers = task.property("ContainerDefinitions").unwrap();
        let container = &containers[0];
        assert_eq!(container["Command"], json!(["start"]));

        let environment = container["Environment"].as_array().unwrap();
        let value = |name: &str| {
            environment
                .iter()
                .find(|e| e["Name"] == name)
                .unwrap_or_else(|| panic!("missing env var {name}"))["Value"]
                .clone()
        };
        assert_eq!(
            value("KC_DB_URL"),
            json!("jdbc:mysql://${KC_DB_URL_HOST}:${KC_DB_URL_PORT}/${KC_DB_URL_DATABASE}")
        );
        assert_eq!(value("KC_DB_URL_PORT"), json!("3306"));
        assert_eq!(
            value("KC_HOSTNAME_ADMIN_URL"),
            json!({ "Fn::Join": ["", ["https://", { "Fn::GetAtt": ["alb", "DNSName"] }]] })
        );
        assert_eq!(value("KC_HOSTNAME_STRICT"), json!("false"));
        assert_eq!(value("KC_HOSTNAME_STRICT_HTTPS"), json!("false"));
        assert_eq!(value("KC_CACHE"), json!("ispn"));
        assert_eq!(value("KC_CACHE_STACK"), json!("kubernetes"));
        assert_eq!(value("KEYCLOAK_ADMIN"), json!("admin"));
    }

    #[test]
    fn cluster_dns_query_targets_the_discovery_record() {
        let (stack, topology) = compose_default();
        let task = stack.template().get(&topology.task_definition).unwrap();
        let containers = task.property("ContainerDefinitions").unwrap();
        let environment = containers[0]["Environment"].as_array().unwrap();
        let java_opts = environment
            .iter()
            .find(|e| e["Name"] == "JAVA_OPTS_APPEND")
            .unwrap();
        assert_eq!(java_opts["Value"], json!("-Djgroups.dns.query=cache.kc-ns"));
    }

    #[test]
    fn container_secrets_point_into_the_generated_secret() {
        let (stack, topology) = compose_default();
        let task = stack.template().get(&topology.task_definition).unwrap();
        let containers = task.property("ContainerDefinitions").unwrap();
        let secrets = containers[0]["Secrets"].as_array().unwrap();
        assert_eq!(secrets.len(), 3);
        assert_eq!(
            secrets[0]["ValueFrom"],
            json!({ "Fn::Join": ["", [{ "Ref": "dbSecret" }, ":host::"]] })
        );
    }

    #[test]
    fn service_waits_for_the_listener() {
        let (stack, topology) = compose_default();
        let service = stack.template().get(&topology.service).unwrap();
        assert_eq!(service.depends_on.len(), 1);
        assert_eq!(service.depends_on[0].as_str(), "httpsListener");
        assert_eq!(service.property("DesiredCount"), Some(&json!(2)));
    }

    #[test]
    fn execution_role_reads_only_the_database_secret() {
        let (stack, _) = compose_default();
        assert!(stack.template().has_resource_properties(
            "AWS::IAM::Policy",
            &json!({
                "PolicyName": "SecretsManagerAccess",
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": ["secretsmanager:GetSecretValue"],
                        "Resource": [{ "Ref": "dbSecret" }],
                    }],
                },
            })
        ));
    }

    #[test]
    fn rejects_invalid_definitions_before_describing_resources() {
        let mut stack = Stack::new("App", Environment::default());
        let def = AppDef {
            desired_count: 0,
            ..AppDef::default()
        };
        let err = ApplicationComposer::new()
            .compose(&mut stack, &def)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Config(_)));
        assert!(stack.template().is_empty());
    }
}
