//! Provider resource property types
//!
//! Serialize to the provider's PascalCase property names. Only the
//! properties the stack sets are modelled. Field names mirror the provider's
//! property reference.

#![allow(missing_docs)]

use nexus_fargate_common::Expr;
use serde::Serialize;

/// Catch-all CIDR for "anywhere" rules and default routes
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// Key/value tag
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// `Name` tag
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            key: "Name".to_string(),
            value: value.into(),
        }
    }
}

// =============================================================================
// EC2
// =============================================================================

/// `AWS::EC2::VPC`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcProps {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::Subnet`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetProps {
    pub vpc_id: Expr,
    pub availability_zone: Expr,
    pub cidr_block: String,
    pub map_public_ip_on_launch: bool,
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::RouteTable`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTableProps {
    pub vpc_id: Expr,
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::SubnetRouteTableAssociation`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociationProps {
    pub route_table_id: Expr,
    pub subnet_id: Expr,
}

/// `AWS::EC2::Route` to either an internet gateway or a NAT gateway
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteProps {
    pub route_table_id: Expr,
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Expr>,
}

/// `AWS::EC2::EIP`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EipProps {
    pub domain: String,
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::NatGateway`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatGatewayProps {
    pub subnet_id: Expr,
    pub allocation_id: Expr,
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::InternetGateway`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGatewayProps {
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::VPCGatewayAttachment`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachmentProps {
    pub vpc_id: Expr,
    pub internet_gateway_id: Expr,
}

/// Inline CIDR ingress rule of a security group
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CidrIngress {
    pub cidr_ip: String,
    pub description: String,
    pub from_port: u16,
    pub ip_protocol: String,
    pub to_port: u16,
}

/// Inline egress rule of a security group
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CidrEgress {
    pub cidr_ip: String,
    pub description: String,
    pub ip_protocol: String,
}

/// `AWS::EC2::SecurityGroup`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupProps {
    pub group_description: String,
    pub vpc_id: Expr,
    pub security_group_egress: Vec<CidrEgress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ingress: Vec<CidrIngress>,
}

/// `AWS::EC2::SecurityGroupIngress` between two groups
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupIngressProps {
    pub ip_protocol: String,
    pub description: String,
    pub from_port: u16,
    pub group_id: Expr,
    pub source_security_group_id: Expr,
    pub to_port: u16,
}

// =============================================================================
// EFS
// =============================================================================

/// Lifecycle transition entry
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecyclePolicyProps {
    #[serde(rename = "TransitionToIA")]
    pub transition_to_ia: String,
}

/// `AWS::EFS::FileSystem`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileSystemProps {
    pub encrypted: bool,
    pub file_system_tags: Vec<Tag>,
    pub lifecycle_policies: Vec<LifecyclePolicyProps>,
    pub performance_mode: String,
    pub throughput_mode: String,
}

/// `AWS::EFS::MountTarget`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountTargetProps {
    pub file_system_id: Expr,
    pub security_groups: Vec<Expr>,
    pub subnet_id: Expr,
}

/// Identity every request through the access point is mapped to
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PosixUser {
    pub gid: String,
    pub uid: String,
}

/// Root directory exposed by the access point
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootDirectory {
    pub path: String,
}

/// `AWS::EFS::AccessPoint`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPointProps {
    pub file_system_id: Expr,
    pub posix_user: PosixUser,
    pub root_directory: RootDirectory,
}

// =============================================================================
// IAM
// =============================================================================

/// Principal of a trust policy statement
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

/// Policy statement
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: Vec<String>,
    pub effect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl Statement {
    /// Allow a service principal to assume a role
    pub fn assume_role(service: impl Into<String>) -> Self {
        Self {
            action: vec!["sts:AssumeRole".to_string()],
            effect: "Allow".to_string(),
            principal: Some(Principal {
                service: service.into(),
            }),
            resource: None,
        }
    }

    /// Allow actions on every resource
    pub fn allow_all_resources(actions: &[&str]) -> Self {
        Self {
            action: actions.iter().map(|a| a.to_string()).collect(),
            effect: "Allow".to_string(),
            principal: None,
            resource: Some("*".to_string()),
        }
    }
}

/// Policy document
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub statement: Vec<Statement>,
    pub version: String,
}

impl PolicyDocument {
    /// Document with the current policy language version
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            statement,
            version: "2012-10-17".to_string(),
        }
    }
}

/// `AWS::IAM::Role`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleProps {
    pub assume_role_policy_document: PolicyDocument,
}

/// `AWS::IAM::Policy`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyProps {
    pub policy_document: PolicyDocument,
    pub policy_name: String,
    pub roles: Vec<Expr>,
}

// =============================================================================
// ECS
// =============================================================================

/// `AWS::ECS::Cluster`
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterProps {}

/// `AWS::ECS::ClusterCapacityProviderAssociations`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapacityProviderAssociationsProps {
    pub capacity_providers: Vec<String>,
    pub cluster: Expr,
    pub default_capacity_provider_strategy: Vec<serde_json::Value>,
}

/// Linux-specific container options
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LinuxParameters {
    pub init_process_enabled: bool,
}

/// Volume mount inside a container
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MountPoint {
    pub container_path: String,
    pub read_only: bool,
    pub source_volume: String,
}

/// Container port mapping
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub protocol: String,
}

/// Resource limit
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Ulimit {
    pub hard_limit: u32,
    pub name: String,
    pub soft_limit: u32,
}

/// Container definition embedded in a task definition
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    pub essential: bool,
    pub image: String,
    pub linux_parameters: LinuxParameters,
    pub mount_points: Vec<MountPoint>,
    pub name: String,
    pub port_mappings: Vec<PortMapping>,
    pub ulimits: Vec<Ulimit>,
}

/// Access point authorization of an EFS volume
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthorizationConfig {
    pub access_point_id: Expr,
}

/// EFS-backed task volume
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EfsVolumeConfiguration {
    #[serde(rename = "FilesystemId")]
    pub file_system_id: Expr,
    pub transit_encryption: String,
    pub authorization_config: AuthorizationConfig,
}

/// Task volume
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskVolume {
    #[serde(rename = "EFSVolumeConfiguration")]
    pub efs_volume_configuration: EfsVolumeConfiguration,
    pub name: String,
}

/// `AWS::ECS::TaskDefinition`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDefinitionProps {
    pub container_definitions: Vec<ContainerDefinition>,
    pub cpu: String,
    pub family: String,
    pub memory: String,
    pub network_mode: String,
    pub requires_compatibilities: Vec<String>,
    pub task_role_arn: Expr,
    pub volumes: Vec<TaskVolume>,
}

/// Rolling deployment bounds
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentConfiguration {
    pub maximum_percent: u32,
    pub minimum_healthy_percent: u32,
}

/// Load balancer registration of a service container
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLoadBalancer {
    pub container_name: String,
    pub container_port: u16,
    pub target_group_arn: Expr,
}

/// Task networking of an awsvpc service
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsVpcConfiguration {
    pub assign_public_ip: String,
    pub security_groups: Vec<Expr>,
    pub subnets: Vec<Expr>,
}

/// Service network configuration
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkConfiguration {
    pub awsvpc_configuration: AwsVpcConfiguration,
}

/// `AWS::ECS::Service`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceProps {
    pub cluster: Expr,
    pub deployment_configuration: DeploymentConfiguration,
    pub desired_count: u32,
    #[serde(rename = "EnableECSManagedTags")]
    pub enable_ecs_managed_tags: bool,
    pub enable_execute_command: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_grace_period_seconds: Option<u32>,
    pub launch_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancers: Vec<ServiceLoadBalancer>,
    pub network_configuration: NetworkConfiguration,
    pub platform_version: String,
    pub task_definition: Expr,
}

// =============================================================================
// Elastic Load Balancing v2
// =============================================================================

/// Load balancer or target group attribute
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    /// Create an attribute
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// `AWS::ElasticLoadBalancingV2::LoadBalancer`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancerProps {
    pub load_balancer_attributes: Vec<Attribute>,
    pub scheme: String,
    pub security_groups: Vec<Expr>,
    pub subnets: Vec<Expr>,
    #[serde(rename = "Type")]
    pub type_: String,
}

/// Listener default action
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerAction {
    pub target_group_arn: Expr,
    #[serde(rename = "Type")]
    pub type_: String,
}

/// `AWS::ElasticLoadBalancingV2::Listener`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerProps {
    pub default_actions: Vec<ListenerAction>,
    pub load_balancer_arn: Expr,
    pub port: u16,
    pub protocol: String,
}

/// `AWS::ElasticLoadBalancingV2::TargetGroup`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetGroupProps {
    pub health_check_interval_seconds: u32,
    pub health_check_path: String,
    pub port: u16,
    pub protocol: String,
    pub target_group_attributes: Vec<Attribute>,
    pub target_type: String,
    pub unhealthy_threshold_count: u32,
    pub vpc_id: Expr,
}
