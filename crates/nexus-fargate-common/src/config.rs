//! Stack configuration
//!
//! The whole stack is described by one immutable [`StackConfig`] value.
//! `StackConfig::default()` is the Nexus repository topology; every field can
//! be overridden from YAML or JSON (camelCase keys, missing keys keep their
//! defaults).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cidr::Ipv4Cidr;
use crate::template::RemovalPolicy;
use crate::{Error, Result};

/// Default stack name
pub const DEFAULT_STACK_NAME: &str = "NexusFargateStack";

/// Default container image, pinned to a fixed tag
pub const DEFAULT_IMAGE: &str = "sonatype/nexus3:3.33.1";

/// NFS port used by the shared filesystem
pub const NFS_PORT: u16 = 2049;

/// Availability zones every tier spans
pub const AVAILABILITY_ZONES: u8 = 2;

/// NAT gateways shared by the private tier
pub const NAT_GATEWAYS: u8 = 1;

/// Service replicas; the filesystem is mounted by a single writer
pub const DESIRED_COUNT: u32 = 1;

/// Minimum healthy percent; the old task stops before the new one starts
pub const MIN_HEALTHY_PERCENT: u32 = 100;

/// Top-level stack configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StackConfig {
    /// Stack name
    pub stack_name: String,
    /// Optional template description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Virtual network layout
    pub network: NetworkConfig,
    /// Shared filesystem
    pub storage: StorageConfig,
    /// Cluster, task and container
    pub compute: ComputeConfig,
    /// Long-running service
    pub service: ServiceConfig,
    /// Public entry point
    pub load_balancer: LoadBalancerConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            description: None,
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            compute: ComputeConfig::default(),
            service: ServiceConfig::default(),
            load_balancer: LoadBalancerConfig::default(),
        }
    }
}

impl StackConfig {
    /// Parse a configuration from YAML (JSON is valid YAML)
    pub fn from_yaml(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        match self.problems().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every problem with the configuration, tagged with the stack name
    pub fn problems(&self) -> Vec<Error> {
        let mut problems = Vec::new();

        if self.stack_name.is_empty() {
            problems.push(Error::validation_for_field("stackName", "must not be empty"));
        }
        self.network.check(&mut problems);
        self.storage.check(&self.network, &mut problems);
        self.compute.check(&mut problems);
        self.service.check(&self.network, &mut problems);
        self.load_balancer.check(&self.network, &mut problems);

        problems
            .into_iter()
            .map(|e| e.in_stack(&self.stack_name))
            .collect()
    }
}

// =============================================================================
// Network
// =============================================================================

/// Routing class of a subnet tier
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    /// Routed to the internet gateway
    Public,
    /// Egress through a NAT gateway
    Private,
    /// No route outside the network
    Isolated,
}

impl SubnetType {
    /// Name used in subnet tags
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetType::Public => "Public",
            SubnetType::Private => "Private",
            SubnetType::Isolated => "Isolated",
        }
    }
}

/// One subnet tier
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetConfig {
    /// Tier name (unique within the network)
    pub name: String,
    /// Prefix length of each subnet in the tier
    pub cidr_mask: u8,
    /// Routing class
    pub subnet_type: SubnetType,
}

impl SubnetConfig {
    /// Create a subnet tier
    pub fn new(name: impl Into<String>, cidr_mask: u8, subnet_type: SubnetType) -> Self {
        Self {
            name: name.into(),
            cidr_mask,
            subnet_type,
        }
    }
}

/// Virtual network layout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    /// Address range of the network
    pub cidr: String,
    /// Number of availability zones each tier spans
    pub max_azs: u8,
    /// Number of NAT gateways (placed in the first public subnets)
    pub nat_gateways: u8,
    /// Subnet tiers, allocated in order
    pub subnets: Vec<SubnetConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cidr: "10.0.0.0/16".to_string(),
            max_azs: AVAILABILITY_ZONES,
            nat_gateways: NAT_GATEWAYS,
            subnets: vec![
                SubnetConfig::new("public", 24, SubnetType::Public),
                SubnetConfig::new("container", 24, SubnetType::Private),
                SubnetConfig::new("persistent", 24, SubnetType::Isolated),
            ],
        }
    }
}

impl NetworkConfig {
    /// Parsed network range
    pub fn parsed_cidr(&self) -> Result<Ipv4Cidr> {
        self.cidr.parse().map_err(|e: Error| match e {
            Error::Validation { message, .. } => {
                Error::validation_for_field("network.cidr", message)
            }
            other => other,
        })
    }

    /// Look up a tier by name
    pub fn tier(&self, name: &str) -> Option<&SubnetConfig> {
        self.subnets.iter().find(|s| s.name == name)
    }

    /// Whether any tier has the given routing class
    pub fn has_tier_of_type(&self, subnet_type: SubnetType) -> bool {
        self.subnets.iter().any(|s| s.subnet_type == subnet_type)
    }

    /// Allocate subnet CIDRs: tier order, then zone order, packed from the start
    ///
    /// Returns `(tier, zone index, cidr)` triples.
    pub fn allocate(&self) -> Result<Vec<(&SubnetConfig, u8, Ipv4Cidr)>> {
        let vpc = self.parsed_cidr()?;
        let mut next_address = u64::from(u32::from(vpc.network()));
        let end = next_address + (1u64 << (32 - vpc.prefix()));
        let mut allocated = Vec::new();

        for tier in &self.subnets {
            let size = 1u64 << (32 - u32::from(tier.cidr_mask.min(32)));
            for zone in 0..self.max_azs {
                // align to the block size of this tier
                let start = next_address.div_ceil(size) * size;
                if start + size > end || tier.cidr_mask < vpc.prefix() || tier.cidr_mask > 32 {
                    return Err(Error::validation_for_field(
                        format!("network.subnets.{}", tier.name),
                        format!("/{} subnets do not fit in {}", tier.cidr_mask, vpc),
                    ));
                }
                let index = (start - u64::from(u32::from(vpc.network()))) / size;
                let cidr = vpc.subnet(tier.cidr_mask, index).ok_or_else(|| {
                    Error::validation_for_field(
                        format!("network.subnets.{}", tier.name),
                        format!("subnet {index} of /{} is outside {}", tier.cidr_mask, vpc),
                    )
                })?;
                allocated.push((tier, zone, cidr));
                next_address = start + size;
            }
        }

        Ok(allocated)
    }

    fn check(&self, problems: &mut Vec<Error>) {
        if let Err(e) = self.parsed_cidr() {
            problems.push(e);
            return;
        }
        if self.max_azs != AVAILABILITY_ZONES {
            problems.push(Error::validation_for_field(
                "network.maxAzs",
                format!("must be {AVAILABILITY_ZONES}, got {}", self.max_azs),
            ));
        }
        if self.nat_gateways != NAT_GATEWAYS {
            problems.push(Error::validation_for_field(
                "network.natGateways",
                format!("must be {NAT_GATEWAYS}, got {}", self.nat_gateways),
            ));
        }
        for subnet_type in [SubnetType::Public, SubnetType::Private, SubnetType::Isolated] {
            let tiers = self
                .subnets
                .iter()
                .filter(|s| s.subnet_type == subnet_type)
                .count();
            if tiers != 1 {
                problems.push(Error::validation_for_field(
                    "network.subnets",
                    format!(
                        "exactly one {} tier is required, got {tiers}",
                        subnet_type.as_str()
                    ),
                ));
            }
        }

        let mut names = HashSet::new();
        for tier in &self.subnets {
            if !names.insert(tier.name.as_str()) {
                problems.push(Error::validation_for_field(
                    "network.subnets",
                    format!("duplicate tier name '{}'", tier.name),
                ));
            }
        }

        if let Err(e) = self.allocate() {
            problems.push(e);
        }
    }
}

/// Check that `name` is a tier of the expected routing class
fn check_tier(
    network: &NetworkConfig,
    field: &str,
    name: &str,
    expected: SubnetType,
    problems: &mut Vec<Error>,
) {
    match network.tier(name) {
        None => problems.push(Error::validation_for_field(
            field,
            format!("subnet tier '{name}' does not exist"),
        )),
        Some(tier) if tier.subnet_type != expected => {
            problems.push(Error::validation_for_field(
                field,
                format!(
                    "subnet tier '{name}' is {:?}, expected {:?}",
                    tier.subnet_type, expected
                ),
            ))
        }
        Some(_) => {}
    }
}

// =============================================================================
// Storage
// =============================================================================

/// When files move to the infrequent-access storage class
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecyclePolicy {
    /// After 7 days without access
    #[serde(rename = "AFTER_7_DAYS")]
    After7Days,
    /// After 14 days without access
    #[serde(rename = "AFTER_14_DAYS")]
    After14Days,
    /// After 30 days without access
    #[serde(rename = "AFTER_30_DAYS")]
    After30Days,
    /// After 60 days without access
    #[serde(rename = "AFTER_60_DAYS")]
    After60Days,
    /// After 90 days without access
    #[serde(rename = "AFTER_90_DAYS")]
    After90Days,
}

impl LifecyclePolicy {
    /// Provider value
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePolicy::After7Days => "AFTER_7_DAYS",
            LifecyclePolicy::After14Days => "AFTER_14_DAYS",
            LifecyclePolicy::After30Days => "AFTER_30_DAYS",
            LifecyclePolicy::After60Days => "AFTER_60_DAYS",
            LifecyclePolicy::After90Days => "AFTER_90_DAYS",
        }
    }
}

/// Filesystem performance mode
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PerformanceMode {
    /// Latency-sensitive workloads
    #[serde(rename = "generalPurpose")]
    GeneralPurpose,
    /// Highly parallel workloads
    #[serde(rename = "maxIO")]
    MaxIo,
}

impl PerformanceMode {
    /// Provider value
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceMode::GeneralPurpose => "generalPurpose",
            PerformanceMode::MaxIo => "maxIO",
        }
    }
}

/// Filesystem throughput mode
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ThroughputMode {
    /// Throughput scales with stored size
    Bursting,
    /// Throughput scales with workload
    Elastic,
}

impl ThroughputMode {
    /// Provider value
    pub fn as_str(&self) -> &'static str {
        match self {
            ThroughputMode::Bursting => "bursting",
            ThroughputMode::Elastic => "elastic",
        }
    }
}

/// Identity and root directory exposed by the access point
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessPointConfig {
    /// Root directory path
    pub path: String,
    /// POSIX user id all requests are mapped to
    pub uid: String,
    /// POSIX group id all requests are mapped to
    pub gid: String,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        // The Nexus process runs as uid 200; mapping it to 0 lets it write to the share
        Self {
            path: "/".to_string(),
            uid: "0".to_string(),
            gid: "0".to_string(),
        }
    }
}

impl AccessPointConfig {
    /// Whether requests are mapped to the administrative identity
    pub fn maps_to_root(&self) -> bool {
        self.uid.parse::<u32>() == Ok(0) || self.gid.parse::<u32>() == Ok(0)
    }
}

/// Shared filesystem
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Tier whose subnets host mount targets (must be ISOLATED)
    pub subnet_group: String,
    /// Encrypt data at rest
    pub encrypted: bool,
    /// Cold-storage transition
    pub lifecycle_policy: LifecyclePolicy,
    /// Performance mode
    pub performance_mode: PerformanceMode,
    /// Throughput mode
    pub throughput_mode: ThroughputMode,
    /// What happens to the filesystem when the stack is deleted
    pub removal_policy: RemovalPolicy,
    /// Storage protocol port admitted from the service group
    pub nfs_port: u16,
    /// The single access point
    pub access_point: AccessPointConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            subnet_group: "persistent".to_string(),
            encrypted: true,
            lifecycle_policy: LifecyclePolicy::After14Days,
            performance_mode: PerformanceMode::GeneralPurpose,
            throughput_mode: ThroughputMode::Bursting,
            removal_policy: RemovalPolicy::Delete,
            nfs_port: NFS_PORT,
            access_point: AccessPointConfig::default(),
        }
    }
}

impl StorageConfig {
    fn check(&self, network: &NetworkConfig, problems: &mut Vec<Error>) {
        check_tier(
            network,
            "storage.subnetGroup",
            &self.subnet_group,
            SubnetType::Isolated,
            problems,
        );
        if self.removal_policy != RemovalPolicy::Delete {
            problems.push(Error::validation_for_field(
                "storage.removalPolicy",
                "the filesystem is not retained, must be Delete",
            ));
        }
        if self.nfs_port == 0 {
            problems.push(Error::validation_for_field(
                "storage.nfsPort",
                "must be non-zero",
            ));
        }
        if !self.access_point.path.starts_with('/') {
            problems.push(Error::validation_for_field(
                "storage.accessPoint.path",
                "must be an absolute path",
            ));
        }
        for (field, id) in [("uid", &self.access_point.uid), ("gid", &self.access_point.gid)] {
            if id.parse::<u32>().is_err() {
                problems.push(Error::validation_for_field(
                    format!("storage.accessPoint.{field}"),
                    format!("'{id}' is not a numeric POSIX id"),
                ));
            }
        }
    }
}

// =============================================================================
// Compute
// =============================================================================

/// The single container of the task
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerConfig {
    /// Container name (also the load balancer target)
    pub name: String,
    /// Image reference
    pub image: String,
    /// Port the application listens on
    pub port: u16,
    /// Task volume name backed by the filesystem
    pub volume_name: String,
    /// Where the volume is mounted inside the container
    pub mount_path: String,
    /// Mount read-only
    pub read_only: bool,
    /// Soft and hard open-file-descriptor limit
    pub nofile_limit: u32,
    /// Run an init process as PID 1
    pub init_process_enabled: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "nexus".to_string(),
            image: DEFAULT_IMAGE.to_string(),
            port: 8081,
            volume_name: "nexus-data-volume".to_string(),
            mount_path: "/nexus-data".to_string(),
            read_only: false,
            nofile_limit: 65536,
            init_process_enabled: true,
        }
    }
}

/// Cluster and task sizing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputeConfig {
    /// Task CPU units
    pub cpu: u32,
    /// Task memory (MiB)
    pub memory_mib: u32,
    /// Associate the FARGATE and FARGATE_SPOT capacity providers
    pub enable_fargate_capacity_providers: bool,
    /// The container
    pub container: ContainerConfig,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        // less memory gets the container killed under load
        Self {
            cpu: 1024,
            memory_mib: 2048,
            enable_fargate_capacity_providers: true,
            container: ContainerConfig::default(),
        }
    }
}

/// Whether a CPU/memory pair is a supported Fargate task size
pub fn is_valid_fargate_size(cpu: u32, memory_mib: u32) -> bool {
    let (min, max, step) = match cpu {
        256 => return matches!(memory_mib, 512 | 1024 | 2048),
        512 => (1024, 4096, 1024),
        1024 => (2048, 8192, 1024),
        2048 => (4096, 16384, 1024),
        4096 => (8192, 30720, 1024),
        8192 => (16384, 61440, 4096),
        16384 => (32768, 122880, 8192),
        _ => return false,
    };
    (min..=max).contains(&memory_mib) && (memory_mib - min) % step == 0
}

impl ComputeConfig {
    fn check(&self, problems: &mut Vec<Error>) {
        if !is_valid_fargate_size(self.cpu, self.memory_mib) {
            problems.push(Error::validation_for_field(
                "compute",
                format!(
                    "cpu {} with {} MiB memory is not a supported Fargate task size",
                    self.cpu, self.memory_mib
                ),
            ));
        }
        let c = &self.container;
        if c.name.is_empty() {
            problems.push(Error::validation_for_field(
                "compute.container.name",
                "must not be empty",
            ));
        }
        if c.image.is_empty() {
            problems.push(Error::validation_for_field(
                "compute.container.image",
                "must not be empty",
            ));
        }
        if c.port == 0 {
            problems.push(Error::validation_for_field(
                "compute.container.port",
                "must be non-zero",
            ));
        }
        if !c.mount_path.starts_with('/') {
            problems.push(Error::validation_for_field(
                "compute.container.mountPath",
                "must be an absolute path",
            ));
        }
        if c.nofile_limit == 0 {
            problems.push(Error::validation_for_field(
                "compute.container.nofileLimit",
                "must be non-zero",
            ));
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// The long-running service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Tier whose subnets run the tasks (must be PRIVATE)
    pub subnet_group: String,
    /// Replica count
    pub desired_count: u32,
    /// Lower bound on running tasks during a deployment, percent of desired
    pub min_healthy_percent: u32,
    /// Upper bound on running tasks during a deployment, percent of desired
    pub max_healthy_percent: u32,
    /// Fargate platform version
    pub platform_version: String,
    /// Allow interactive command execution in running tasks
    pub enable_execute_command: bool,
    /// Seconds the scheduler ignores failing load balancer health checks after start
    pub health_check_grace_period_seconds: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            subnet_group: "container".to_string(),
            desired_count: DESIRED_COUNT,
            min_healthy_percent: MIN_HEALTHY_PERCENT,
            max_healthy_percent: 200,
            platform_version: "1.4.0".to_string(),
            enable_execute_command: true,
            health_check_grace_period_seconds: 60,
        }
    }
}

impl ServiceConfig {
    fn check(&self, network: &NetworkConfig, problems: &mut Vec<Error>) {
        check_tier(
            network,
            "service.subnetGroup",
            &self.subnet_group,
            SubnetType::Private,
            problems,
        );
        if self.desired_count != DESIRED_COUNT {
            problems.push(Error::validation_for_field(
                "service.desiredCount",
                format!("must be {DESIRED_COUNT}, got {}", self.desired_count),
            ));
        }
        if self.min_healthy_percent != MIN_HEALTHY_PERCENT {
            problems.push(Error::validation_for_field(
                "service.minHealthyPercent",
                format!(
                    "must be {MIN_HEALTHY_PERCENT}, got {}",
                    self.min_healthy_percent
                ),
            ));
        }
        if self.min_healthy_percent > self.max_healthy_percent {
            problems.push(Error::validation_for_field(
                "service.minHealthyPercent",
                format!(
                    "{} is above maxHealthyPercent {}",
                    self.min_healthy_percent, self.max_healthy_percent
                ),
            ));
        }
        if self.max_healthy_percent < 100 {
            problems.push(Error::validation_for_field(
                "service.maxHealthyPercent",
                "must be at least 100",
            ));
        }
    }
}

// =============================================================================
// Load balancer
// =============================================================================

/// Target group health check
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthCheckConfig {
    /// Request path
    pub path: String,
    /// Seconds between checks
    pub interval_seconds: u32,
    /// Consecutive failures before a target is unhealthy
    pub unhealthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            interval_seconds: 30,
            unhealthy_threshold: 10,
        }
    }
}

/// Public load balancer, listener and target group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerConfig {
    /// Tier whose subnets host the load balancer (must be PUBLIC when internet facing)
    pub subnet_group: String,
    /// Reachable from the internet
    pub internet_facing: bool,
    /// HTTP listener port
    pub listener_port: u16,
    /// Admit the listener port from anywhere
    pub open: bool,
    /// Target group port
    pub target_port: u16,
    /// Seconds to drain a deregistering target
    pub deregistration_delay_seconds: u32,
    /// Health check
    pub health_check: HealthCheckConfig,
    /// Name of the stack output carrying the DNS name
    pub dns_output_name: String,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            subnet_group: "public".to_string(),
            internet_facing: true,
            listener_port: 80,
            open: true,
            target_port: 80,
            deregistration_delay_seconds: 30,
            health_check: HealthCheckConfig::default(),
            dns_output_name: "AlbDnsName".to_string(),
        }
    }
}

impl LoadBalancerConfig {
    fn check(&self, network: &NetworkConfig, problems: &mut Vec<Error>) {
        if self.internet_facing {
            check_tier(
                network,
                "loadBalancer.subnetGroup",
                &self.subnet_group,
                SubnetType::Public,
                problems,
            );
        } else if network.tier(&self.subnet_group).is_none() {
            problems.push(Error::validation_for_field(
                "loadBalancer.subnetGroup",
                format!("subnet tier '{}' does not exist", self.subnet_group),
            ));
        }
        if network.max_azs < 2 {
            problems.push(Error::validation_for_field(
                "loadBalancer",
                "an application load balancer needs subnets in at least 2 availability zones",
            ));
        }
        if self.listener_port == 0 || self.target_port == 0 {
            problems.push(Error::validation_for_field(
                "loadBalancer",
                "listener and target ports must be non-zero",
            ));
        }
        if self.deregistration_delay_seconds > 3600 {
            problems.push(Error::validation_for_field(
                "loadBalancer.deregistrationDelaySeconds",
                "must be between 0 and 3600",
            ));
        }
        let hc = &self.health_check;
        if !hc.path.starts_with('/') {
            problems.push(Error::validation_for_field(
                "loadBalancer.healthCheck.path",
                "must start with '/'",
            ));
        }
        if !(5..=300).contains(&hc.interval_seconds) {
            problems.push(Error::validation_for_field(
                "loadBalancer.healthCheck.intervalSeconds",
                "must be between 5 and 300",
            ));
        }
        if !(2..=10).contains(&hc.unhealthy_threshold) {
            problems.push(Error::validation_for_field(
                "loadBalancer.healthCheck.unhealthyThreshold",
                "must be between 2 and 10",
            ));
        }
        if self.dns_output_name.is_empty()
            || !self.dns_output_name.chars().all(|c| c.is_ascii_alphanumeric())
        {
            problems.push(Error::validation_for_field(
                "loadBalancer.dnsOutputName",
                "must be non-empty and alphanumeric",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        let config = StackConfig::default();
        assert!(config.problems().is_empty(), "{:?}", config.problems());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_network_has_three_tiers_in_two_zones() {
        let network = NetworkConfig::default();
        assert_eq!(network.subnets.len(), 3);
        assert_eq!(network.max_azs, 2);
        assert_eq!(network.nat_gateways, 1);

        let cidrs: Vec<String> = network
            .allocate()
            .unwrap()
            .iter()
            .map(|(_, _, c)| c.to_string())
            .collect();
        assert_eq!(
            cidrs,
            vec![
                "10.0.0.0/24",
                "10.0.1.0/24",
                "10.0.2.0/24",
                "10.0.3.0/24",
                "10.0.4.0/24",
                "10.0.5.0/24",
            ]
        );
    }

    #[test]
    fn mixed_masks_are_aligned() {
        let network = NetworkConfig {
            cidr: "10.0.0.0/16".to_string(),
            max_azs: 2,
            nat_gateways: 1,
            subnets: vec![
                SubnetConfig::new("public", 26, SubnetType::Public),
                SubnetConfig::new("private", 24, SubnetType::Private),
            ],
        };
        let cidrs: Vec<String> = network
            .allocate()
            .unwrap()
            .iter()
            .map(|(_, _, c)| c.to_string())
            .collect();
        assert_eq!(
            cidrs,
            vec!["10.0.0.0/26", "10.0.0.64/26", "10.0.1.0/24", "10.0.2.0/24"]
        );
    }

    #[test]
    fn overflowing_subnets_are_rejected() {
        let mut config = StackConfig::default();
        config.network.cidr = "10.0.0.0/22".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.stack(), Some(DEFAULT_STACK_NAME));
        assert!(err.to_string().contains("do not fit"));
    }

    #[test]
    fn bad_cidr_names_the_field() {
        let mut config = StackConfig::default();
        config.network.cidr = "10.0.0.0".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("network.cidr"));
    }

    #[test]
    fn private_tier_without_nat_is_rejected() {
        let mut config = StackConfig::default();
        config.network.nat_gateways = 0;
        let problems = config.problems();
        assert!(problems
            .iter()
            .any(|e| e.field() == Some("network.natGateways")));
    }

    #[rstest]
    #[case::three_zones("network.maxAzs", |c: &mut StackConfig| c.network.max_azs = 3)]
    #[case::one_zone("network.maxAzs", |c: &mut StackConfig| c.network.max_azs = 1)]
    #[case::nat_per_zone("network.natGateways", |c: &mut StackConfig| c.network.nat_gateways = 2)]
    #[case::retained_filesystem("storage.removalPolicy", |c: &mut StackConfig| {
        c.storage.removal_policy = RemovalPolicy::Retain
    })]
    #[case::snapshot_filesystem("storage.removalPolicy", |c: &mut StackConfig| {
        c.storage.removal_policy = RemovalPolicy::Snapshot
    })]
    #[case::two_replicas("service.desiredCount", |c: &mut StackConfig| c.service.desired_count = 2)]
    #[case::scaled_to_zero("service.desiredCount", |c: &mut StackConfig| c.service.desired_count = 0)]
    #[case::rolling_overlap("service.minHealthyPercent", |c: &mut StackConfig| {
        c.service.min_healthy_percent = 50
    })]
    #[case::missing_isolated_tier("network.subnets", |c: &mut StackConfig| {
        c.network.subnets.pop();
    })]
    #[case::extra_private_tier("network.subnets", |c: &mut StackConfig| {
        c.network
            .subnets
            .push(SubnetConfig::new("batch", 24, SubnetType::Private))
    })]
    fn fixed_shape_cannot_be_overridden(
        #[case] field: &str,
        #[case] tweak: fn(&mut StackConfig),
    ) {
        let mut config = StackConfig::default();
        tweak(&mut config);
        let problems = config.problems();
        assert!(
            problems.iter().any(|e| e.field() == Some(field)),
            "{field} not reported in {problems:?}"
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn storage_tier_must_be_isolated() {
        let mut config = StackConfig::default();
        config.storage.subnet_group = "container".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("storage.subnetGroup"));
        assert!(err.to_string().contains("expected Isolated"));
    }

    #[test]
    fn unknown_service_tier_is_rejected() {
        let mut config = StackConfig::default();
        config.service.subnet_group = "nope".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[rstest]
    #[case::smallest(256, 512, true)]
    #[case::default_size(1024, 2048, true)]
    #[case::too_little_memory(1024, 1024, false)]
    #[case::off_step(2048, 4500, false)]
    #[case::large_step(8192, 20480, true)]
    #[case::unknown_cpu(300, 1024, false)]
    fn fargate_sizes(#[case] cpu: u32, #[case] memory: u32, #[case] valid: bool) {
        assert_eq!(is_valid_fargate_size(cpu, memory), valid);
    }

    #[rstest]
    #[case::interval_too_short(1, 10)]
    #[case::interval_too_long(301, 10)]
    #[case::threshold_too_high(30, 11)]
    #[case::threshold_too_low(30, 1)]
    fn health_check_ranges(#[case] interval: u32, #[case] threshold: u32) {
        let mut config = StackConfig::default();
        config.load_balancer.health_check.interval_seconds = interval;
        config.load_balancer.health_check.unhealthy_threshold = threshold;
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_healthy_above_max_is_rejected() {
        let mut config = StackConfig::default();
        config.service.min_healthy_percent = 250;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("service.minHealthyPercent"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = StackConfig::from_yaml(
            r#"
stackName: Staging
compute:
  cpu: 2048
  memoryMib: 4096
  container:
    image: sonatype/nexus3:3.40.0
"#,
        )
        .unwrap();

        assert_eq!(config.stack_name, "Staging");
        assert_eq!(config.compute.cpu, 2048);
        assert_eq!(config.compute.container.image, "sonatype/nexus3:3.40.0");
        assert_eq!(config.compute.container.port, 8081);
        assert_eq!(config.network, NetworkConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn enum_values_use_provider_spelling() {
        let yaml = serde_yaml::to_string(&StorageConfig::default()).unwrap();
        assert!(yaml.contains("lifecyclePolicy: AFTER_14_DAYS"));
        assert!(yaml.contains("performanceMode: generalPurpose"));
        assert!(yaml.contains("throughputMode: bursting"));
        assert!(yaml.contains("removalPolicy: Delete"));

        let yaml = serde_yaml::to_string(&NetworkConfig::default()).unwrap();
        assert!(yaml.contains("subnetType: ISOLATED"));
    }

    #[test]
    fn default_access_point_maps_to_root() {
        assert!(AccessPointConfig::default().maps_to_root());
        let narrow = AccessPointConfig {
            uid: "200".to_string(),
            gid: "200".to_string(),
            ..Default::default()
        };
        assert!(!narrow.maps_to_root());
    }

    #[rstest]
    #[case::zero_padded_uid("00", "200", true)]
    #[case::zero_padded_gid("200", "000", true)]
    #[case::unprivileged("200", "1000", false)]
    #[case::not_a_number("root", "200", false)]
    fn root_mapping_compares_numbers(
        #[case] uid: &str,
        #[case] gid: &str,
        #[case] expected: bool,
    ) {
        let access_point = AccessPointConfig {
            uid: uid.to_string(),
            gid: gid.to_string(),
            ..Default::default()
        };
        assert_eq!(access_point.maps_to_root(), expected);
    }

    #[test]
    fn non_numeric_posix_id_is_rejected() {
        let mut config = StackConfig::default();
        config.storage.access_point.uid = "nexus".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("storage.accessPoint.uid"));
    }
}
