//! The Nexus stack: wires every construct together into one template
//!
//! Expansion order follows the dependency order of the constructs: network,
//! security groups, storage, compute, load balancer, service. Security group
//! resources are emitted last because listeners and targets add rules to
//! them while they are wired.

use nexus_fargate_common::config::StackConfig;
use nexus_fargate_common::{Output, ResourceGraph, Result, Template};
use tracing::info;

use crate::compute::Compute;
use crate::context::SynthContext;
use crate::load_balancer::{LoadBalancer, LoadBalancerGroups};
use crate::network::Network;
use crate::security::{Peer, Port, SecurityPolicy};
use crate::service::FargateService;
use crate::storage::FileSystem;

/// Construct id of the load balancer's security group
pub const ALB_SECURITY_GROUP_ID: &str = "AlbSecurityGroup";

/// Construct id of the service's security group
pub const SERVICE_SECURITY_GROUP_ID: &str = "NexusServiceSecurityGroup";

/// Construct id of the filesystem's security group
pub const EFS_SECURITY_GROUP_ID: &str = "EfsSecurityGroup";

/// One deployable unit built from a [`StackConfig`]
#[derive(Clone, Debug, Default)]
pub struct Stack {
    config: StackConfig,
}

impl Stack {
    /// Stack described by `config`
    pub fn new(config: StackConfig) -> Self {
        Self { config }
    }

    /// Name of the stack
    pub fn name(&self) -> &str {
        &self.config.stack_name
    }

    /// The configuration this stack synthesizes from
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Validate the configuration and expand every construct into a template
    pub fn synth(&self) -> Result<Template> {
        let config = &self.config;
        config.validate()?;

        let mut ctx = SynthContext::new(&config.stack_name);
        ctx.set_description(config.description.clone());

        let network = Network::synth(&mut ctx, &config.network)?;

        let mut policy = SecurityPolicy::new();
        policy.add_group(&ctx, ALB_SECURITY_GROUP_ID)?;
        policy.add_group(&ctx, SERVICE_SECURITY_GROUP_ID)?;
        policy.add_group(&ctx, EFS_SECURITY_GROUP_ID)?;
        policy.allow_from(
            EFS_SECURITY_GROUP_ID,
            Peer::Group(SERVICE_SECURITY_GROUP_ID.to_string()),
            Port::tcp(config.storage.nfs_port),
        )?;

        let efs_group = policy.group_id(&ctx, EFS_SECURITY_GROUP_ID)?;
        let file_system = FileSystem::synth(&mut ctx, &config.storage, &network, efs_group)?;
        let compute = Compute::synth(&mut ctx, &config.compute, &file_system)?;
        let load_balancer = LoadBalancer::synth(
            &mut ctx,
            &config.load_balancer,
            &network,
            &mut policy,
            LoadBalancerGroups {
                load_balancer: ALB_SECURITY_GROUP_ID,
                targets: SERVICE_SECURITY_GROUP_ID,
            },
            &compute,
        )?;
        let service_group = policy.group_id(&ctx, SERVICE_SECURITY_GROUP_ID)?;
        FargateService::synth(
            &mut ctx,
            &config.service,
            &network,
            &compute,
            service_group,
            &load_balancer,
        )?;

        policy.emit(&mut ctx, &network.vpc_id)?;

        ctx.add_output(
            &config.load_balancer.dns_output_name,
            Output {
                value: load_balancer.dns_name(),
                description: Some("Public DNS name of the load balancer".to_string()),
            },
        )?;

        let template = ctx.into_template();
        let graph = ResourceGraph::from_template(&template)?;
        graph.topological_order()?;

        info!(
            stack = %config.stack_name,
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "stack synthesized"
        );
        Ok(template)
    }
}
