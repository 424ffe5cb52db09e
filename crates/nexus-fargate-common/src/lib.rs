//! Common types for nexus-fargate: errors, template model, resource graph,
//! logical ids and stack configuration

#![deny(missing_docs)]

pub mod cidr;
pub mod config;
pub mod error;
pub mod graph;
pub mod logical_id;
pub mod template;

pub use config::StackConfig;
pub use error::Error;
pub use graph::ResourceGraph;
pub use template::{Expr, Output, RemovalPolicy, Resource, Template};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Resource type names emitted by the stack constructs
pub mod resource_types {
    /// Virtual network
    pub const VPC: &str = "AWS::EC2::VPC";
    /// Subnet
    pub const SUBNET: &str = "AWS::EC2::Subnet";
    /// Route table
    pub const ROUTE_TABLE: &str = "AWS::EC2::RouteTable";
    /// Route table association
    pub const SUBNET_ROUTE_TABLE_ASSOCIATION: &str = "AWS::EC2::SubnetRouteTableAssociation";
    /// Route
    pub const ROUTE: &str = "AWS::EC2::Route";
    /// Elastic IP
    pub const EIP: &str = "AWS::EC2::EIP";
    /// NAT gateway
    pub const NAT_GATEWAY: &str = "AWS::EC2::NatGateway";
    /// Internet gateway
    pub const INTERNET_GATEWAY: &str = "AWS::EC2::InternetGateway";
    /// Internet gateway attachment
    pub const VPC_GATEWAY_ATTACHMENT: &str = "AWS::EC2::VPCGatewayAttachment";
    /// Security group
    pub const SECURITY_GROUP: &str = "AWS::EC2::SecurityGroup";
    /// Standalone security group ingress rule
    pub const SECURITY_GROUP_INGRESS: &str = "AWS::EC2::SecurityGroupIngress";
    /// Elastic filesystem
    pub const EFS_FILE_SYSTEM: &str = "AWS::EFS::FileSystem";
    /// Filesystem mount target
    pub const EFS_MOUNT_TARGET: &str = "AWS::EFS::MountTarget";
    /// Filesystem access point
    pub const EFS_ACCESS_POINT: &str = "AWS::EFS::AccessPoint";
    /// Container cluster
    pub const ECS_CLUSTER: &str = "AWS::ECS::Cluster";
    /// Cluster capacity provider associations
    pub const ECS_CAPACITY_PROVIDER_ASSOCIATIONS: &str =
        "AWS::ECS::ClusterCapacityProviderAssociations";
    /// Task definition
    pub const ECS_TASK_DEFINITION: &str = "AWS::ECS::TaskDefinition";
    /// Service
    pub const ECS_SERVICE: &str = "AWS::ECS::Service";
    /// IAM role
    pub const IAM_ROLE: &str = "AWS::IAM::Role";
    /// IAM inline policy
    pub const IAM_POLICY: &str = "AWS::IAM::Policy";
    /// Load balancer
    pub const LOAD_BALANCER: &str = "AWS::ElasticLoadBalancingV2::LoadBalancer";
    /// Listener
    pub const LISTENER: &str = "AWS::ElasticLoadBalancingV2::Listener";
    /// Target group
    pub const TARGET_GROUP: &str = "AWS::ElasticLoadBalancingV2::TargetGroup";
}
