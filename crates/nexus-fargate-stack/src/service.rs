//! The Fargate service running the task behind the load balancer

use nexus_fargate_common::config::ServiceConfig;
use nexus_fargate_common::resource_types as rt;
use nexus_fargate_common::{Expr, Resource, Result};
use tracing::debug;

use crate::compute::{Compute, TASK_DEFINITION_ID};
use crate::context::SynthContext;
use crate::load_balancer::LoadBalancer;
use crate::network::Network;
use crate::resources::{
    AwsVpcConfiguration, DeploymentConfiguration, NetworkConfiguration, PolicyDocument,
    PolicyProps, ServiceLoadBalancer, ServiceProps, Statement,
};

/// Construct id of the service
pub const SERVICE_ID: &str = "Service";

/// Channel permissions the task role needs for interactive command execution
pub const EXECUTE_COMMAND_ACTIONS: [&str; 4] = [
    "ssmmessages:CreateControlChannel",
    "ssmmessages:CreateDataChannel",
    "ssmmessages:OpenControlChannel",
    "ssmmessages:OpenDataChannel",
];

/// A synthesized service
#[derive(Clone, Debug)]
pub struct FargateService {
    /// Logical id of the service
    pub service_id: String,
    /// Logical id of the task role policy granting command execution
    pub execute_command_policy_id: Option<String>,
}

impl FargateService {
    /// Expand the service configuration into resources
    pub fn synth(
        ctx: &mut SynthContext,
        config: &ServiceConfig,
        network: &Network,
        compute: &Compute,
        security_group: Expr,
        load_balancer: &LoadBalancer,
    ) -> Result<Self> {
        let subnets = network.subnet_refs(&config.subnet_group)?;

        let execute_command_policy_id = if config.enable_execute_command {
            let policy_id = ctx.id(&[TASK_DEFINITION_ID, "TaskRole", "DefaultPolicy"]);
            ctx.add(
                &[TASK_DEFINITION_ID, "TaskRole", "DefaultPolicy"],
                Resource::new(
                    rt::IAM_POLICY,
                    &PolicyProps {
                        policy_document: PolicyDocument::new(vec![
                            Statement::allow_all_resources(&EXECUTE_COMMAND_ACTIONS),
                        ]),
                        policy_name: policy_id.clone(),
                        roles: vec![Expr::reference(&compute.task_role_id)],
                    },
                )?,
            )?;
            Some(policy_id)
        } else {
            None
        };

        let mut service = Resource::new(
            rt::ECS_SERVICE,
            &ServiceProps {
                cluster: Expr::reference(&compute.cluster_id),
                deployment_configuration: DeploymentConfiguration {
                    maximum_percent: config.max_healthy_percent,
                    minimum_healthy_percent: config.min_healthy_percent,
                },
                desired_count: config.desired_count,
                enable_ecs_managed_tags: false,
                enable_execute_command: config.enable_execute_command,
                health_check_grace_period_seconds: Some(config.health_check_grace_period_seconds),
                launch_type: "FARGATE".to_string(),
                load_balancers: vec![ServiceLoadBalancer {
                    container_name: compute.container_name.clone(),
                    container_port: compute.container_port,
                    target_group_arn: Expr::reference(&load_balancer.target_group_id),
                }],
                network_configuration: NetworkConfiguration {
                    awsvpc_configuration: AwsVpcConfiguration {
                        assign_public_ip: "DISABLED".to_string(),
                        security_groups: vec![security_group],
                        subnets,
                    },
                },
                platform_version: config.platform_version.clone(),
                task_definition: Expr::reference(&compute.task_definition_id),
            },
        )?
        // the target group must be attached to a listener before tasks register
        .depends_on(&load_balancer.listener_id);

        if let Some(policy) = &execute_command_policy_id {
            service = service.depends_on(policy);
        }

        let service_id = ctx.add(&[SERVICE_ID, "Service"], service)?;

        debug!(
            service = %service_id,
            desired_count = config.desired_count,
            min_healthy_percent = config.min_healthy_percent,
            execute_command = config.enable_execute_command,
            "service synthesized"
        );

        Ok(Self {
            service_id,
            execute_command_policy_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_fargate_common::config::{
        ComputeConfig, LoadBalancerConfig, NetworkConfig, StorageConfig,
    };

    use crate::load_balancer::LoadBalancerGroups;
    use crate::security::SecurityPolicy;
    use crate::storage::FileSystem;

    fn synth(config: &ServiceConfig) -> (SynthContext, FargateService, Network) {
        let mut ctx = SynthContext::new("TestStack");
        let network = Network::synth(&mut ctx, &NetworkConfig::default()).unwrap();
        let mut policy = SecurityPolicy::new();
        for g in ["Alb", "Service", "Efs"] {
            policy.add_group(&ctx, g).unwrap();
        }
        let efs_group = policy.group_id(&ctx, "Efs").unwrap();
        let fs =
            FileSystem::synth(&mut ctx, &StorageConfig::default(), &network, efs_group).unwrap();
        let compute = Compute::synth(&mut ctx, &ComputeConfig::default(), &fs).unwrap();
        let lb = LoadBalancer::synth(
            &mut ctx,
            &LoadBalancerConfig::default(),
            &network,
            &mut policy,
            LoadBalancerGroups {
                load_balancer: "Alb",
                targets: "Service",
            },
            &compute,
        )
        .unwrap();
        let service_group = policy.group_id(&ctx, "Service").unwrap();
        let service =
            FargateService::synth(&mut ctx, config, &network, &compute, service_group, &lb)
                .unwrap();
        (ctx, service, network)
    }

    #[test]
    fn one_replica_with_full_availability_during_deploys() {
        let (ctx, service, _) = synth(&ServiceConfig::default());
        let props = &ctx.template().resources[&service.service_id].properties;
        assert_eq!(props["DesiredCount"], 1);
        assert_eq!(props["DeploymentConfiguration"]["MinimumHealthyPercent"], 100);
        assert_eq!(props["DeploymentConfiguration"]["MaximumPercent"], 200);
        assert_eq!(props["PlatformVersion"], "1.4.0");
        assert_eq!(props["LaunchType"], "FARGATE");
    }

    #[test]
    fn runs_in_private_tier_without_public_ip() {
        let (ctx, service, network) = synth(&ServiceConfig::default());
        let props = &ctx.template().resources[&service.service_id].properties;
        let vpc = &props["NetworkConfiguration"]["AwsvpcConfiguration"];
        assert_eq!(vpc["AssignPublicIp"], "DISABLED");
        let expected: Vec<&str> = network
            .select_subnets("container")
            .iter()
            .map(|s| s.subnet_id.as_str())
            .collect();
        let actual: Vec<&str> = vpc["Subnets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["Ref"].as_str().unwrap())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn registers_container_port_with_target_group() {
        let (ctx, service, _) = synth(&ServiceConfig::default());
        let props = &ctx.template().resources[&service.service_id].properties;
        assert_eq!(props["LoadBalancers"][0]["ContainerName"], "nexus");
        assert_eq!(props["LoadBalancers"][0]["ContainerPort"], 8081);
    }

    #[test]
    fn execute_command_grants_channel_permissions() {
        let (ctx, service, _) = synth(&ServiceConfig::default());
        let props = &ctx.template().resources[&service.service_id].properties;
        assert_eq!(props["EnableExecuteCommand"], true);

        let policy_id = service.execute_command_policy_id.unwrap();
        let policy = &ctx.template().resources[&policy_id];
        let actions = policy.properties["PolicyDocument"]["Statement"][0]["Action"]
            .as_array()
            .unwrap();
        assert_eq!(actions.len(), 4);
        assert!(ctx.template().resources[&service.service_id]
            .depends_on
            .contains(&policy_id));
    }

    #[test]
    fn execute_command_disabled_adds_no_policy() {
        let config = ServiceConfig {
            enable_execute_command: false,
            ..ServiceConfig::default()
        };
        let (ctx, service, _) = synth(&config);
        assert!(service.execute_command_policy_id.is_none());
        assert_eq!(ctx.template().count_of_type(rt::IAM_POLICY), 0);
    }
}
