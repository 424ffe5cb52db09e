//! Public entry point: internet-facing application load balancer, HTTP
//! listener and the target group the service registers into
//!
//! Wiring the listener and the target group also records the security group
//! rules those relationships imply: an open listener admits its port from
//! anywhere, and the load balancer group may reach the service group on the
//! container port.

use nexus_fargate_common::config::LoadBalancerConfig;
use nexus_fargate_common::resource_types as rt;
use nexus_fargate_common::{Expr, Resource, Result};
use tracing::debug;

use crate::compute::Compute;
use crate::context::SynthContext;
use crate::network::Network;
use crate::resources::{
    Attribute, ListenerAction, ListenerProps, LoadBalancerProps, TargetGroupProps,
};
use crate::security::{Peer, Port, SecurityPolicy};

/// Construct id of the load balancer
pub const LOAD_BALANCER_ID: &str = "ALB";

/// Construct id of the listener
pub const LISTENER_ID: &str = "HttpListener";

/// Construct id of the target group
pub const TARGET_GROUP_ID: &str = "NexusTargetGroup";

/// Security groups a load balancer sits between
#[derive(Clone, Copy, Debug)]
pub struct LoadBalancerGroups<'a> {
    /// Construct id of the group attached to the load balancer
    pub load_balancer: &'a str,
    /// Construct id of the group attached to the targets
    pub targets: &'a str,
}

/// A synthesized load balancer
#[derive(Clone, Debug)]
pub struct LoadBalancer {
    /// Logical id of the load balancer
    pub load_balancer_id: String,
    /// Logical id of the listener
    pub listener_id: String,
    /// Logical id of the target group
    pub target_group_id: String,
}

impl LoadBalancer {
    /// Expand the load balancer configuration into resources
    pub fn synth(
        ctx: &mut SynthContext,
        config: &LoadBalancerConfig,
        network: &Network,
        policy: &mut SecurityPolicy,
        groups: LoadBalancerGroups<'_>,
        compute: &Compute,
    ) -> Result<Self> {
        let subnets = network.subnet_refs(&config.subnet_group)?;
        let lb_group = policy.group_id(ctx, groups.load_balancer)?;

        let mut alb = Resource::new(
            rt::LOAD_BALANCER,
            &LoadBalancerProps {
                load_balancer_attributes: vec![Attribute::new(
                    "deletion_protection.enabled",
                    "false",
                )],
                scheme: if config.internet_facing {
                    "internet-facing".to_string()
                } else {
                    "internal".to_string()
                },
                security_groups: vec![lb_group],
                subnets,
                type_: "application".to_string(),
            },
        )?;
        if config.internet_facing {
            // traffic can only arrive once the public routes exist
            for route in network.internet_connectivity() {
                alb = alb.depends_on(route);
            }
        }
        let load_balancer_id = ctx.add(&[LOAD_BALANCER_ID], alb)?;

        let target_group_id = ctx.add(
            &[LOAD_BALANCER_ID, LISTENER_ID, TARGET_GROUP_ID],
            Resource::new(
                rt::TARGET_GROUP,
                &TargetGroupProps {
                    health_check_interval_seconds: config.health_check.interval_seconds,
                    health_check_path: config.health_check.path.clone(),
                    port: config.target_port,
                    protocol: "HTTP".to_string(),
                    target_group_attributes: vec![Attribute::new(
                        "deregistration_delay.timeout_seconds",
                        config.deregistration_delay_seconds.to_string(),
                    )],
                    target_type: "ip".to_string(),
                    unhealthy_threshold_count: config.health_check.unhealthy_threshold,
                    vpc_id: Expr::reference(&network.vpc_id),
                },
            )?,
        )?;

        let listener_id = ctx.add(
            &[LOAD_BALANCER_ID, LISTENER_ID],
            Resource::new(
                rt::LISTENER,
                &ListenerProps {
                    default_actions: vec![ListenerAction {
                        target_group_arn: Expr::reference(&target_group_id),
                        type_: "forward".to_string(),
                    }],
                    load_balancer_arn: Expr::reference(&load_balancer_id),
                    port: config.listener_port,
                    protocol: "HTTP".to_string(),
                },
            )?,
        )?;

        if config.open {
            policy.allow_from(
                groups.load_balancer,
                Peer::AnyIpv4,
                Port::tcp(config.listener_port),
            )?;
        }
        policy.allow_from(
            groups.targets,
            Peer::Group(groups.load_balancer.to_string()),
            Port::tcp(compute.container_port),
        )?;

        debug!(
            load_balancer = %load_balancer_id,
            listener_port = config.listener_port,
            target = %format!("{}:{}", compute.container_name, compute.container_port),
            "load balancer synthesized"
        );

        Ok(Self {
            load_balancer_id,
            listener_id,
            target_group_id,
        })
    }

    /// The load balancer's public DNS name
    pub fn dns_name(&self) -> Expr {
        Expr::get_att(&self.load_balancer_id, "DNSName")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_fargate_common::config::{ComputeConfig, NetworkConfig, StorageConfig};

    use crate::storage::FileSystem;

    struct Fixture {
        ctx: SynthContext,
        policy: SecurityPolicy,
        lb: LoadBalancer,
    }

    fn synth(config: &LoadBalancerConfig) -> Fixture {
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
            config,
            &network,
            &mut policy,
            LoadBalancerGroups {
                load_balancer: "Alb",
                targets: "Service",
            },
            &compute,
        )
        .unwrap();
        Fixture { ctx, policy, lb }
    }

    #[test]
    fn internet_facing_in_public_subnets() {
        let f = synth(&LoadBalancerConfig::default());
        let alb = &f.ctx.template().resources[&f.lb.load_balancer_id];
        assert_eq!(alb.properties["Scheme"], "internet-facing");
        assert_eq!(alb.properties["Type"], "application");
        let subnets = alb.properties["Subnets"].as_array().unwrap();
        assert_eq!(subnets.len(), 2);
        for s in subnets {
            assert!(s["Ref"].as_str().unwrap().starts_with("VPCpublicSubnet"));
        }
        assert_eq!(alb.depends_on.len(), 2);
    }

    #[test]
    fn target_group_health_check() {
        let f = synth(&LoadBalancerConfig::default());
        let tg = &f.ctx.template().resources[&f.lb.target_group_id].properties;
        assert_eq!(tg["HealthCheckPath"], "/");
        assert_eq!(tg["HealthCheckIntervalSeconds"], 30);
        assert_eq!(tg["UnhealthyThresholdCount"], 10);
        assert_eq!(tg["TargetType"], "ip");
        assert_eq!(tg["Port"], 80);
        assert_eq!(
            tg["TargetGroupAttributes"][0]["Key"],
            "deregistration_delay.timeout_seconds"
        );
        assert_eq!(tg["TargetGroupAttributes"][0]["Value"], "30");
    }

    #[test]
    fn listener_forwards_to_target_group() {
        let f = synth(&LoadBalancerConfig::default());
        let listener = &f.ctx.template().resources[&f.lb.listener_id].properties;
        assert_eq!(listener["Port"], 80);
        assert_eq!(listener["Protocol"], "HTTP");
        assert_eq!(listener["DefaultActions"][0]["Type"], "forward");
        assert_eq!(
            listener["DefaultActions"][0]["TargetGroupArn"]["Ref"],
            f.lb.target_group_id.as_str()
        );
    }

    #[test]
    fn wiring_infers_security_rules() {
        let f = synth(&LoadBalancerConfig::default());
        assert_eq!(f.policy.inbound_rule_count("Alb"), 1);
        let service_rules = f.policy.ingress_from_groups("Service");
        assert_eq!(service_rules.len(), 1);
        assert_eq!(service_rules[0].source, "Alb");
        assert_eq!(service_rules[0].port, Port::tcp(8081));
        assert_eq!(f.policy.inbound_rule_count("Efs"), 0);
    }

    #[test]
    fn closed_listener_admits_nothing_from_anywhere() {
        let config = LoadBalancerConfig {
            open: false,
            ..LoadBalancerConfig::default()
        };
        let f = synth(&config);
        assert_eq!(f.policy.inbound_rule_count("Alb"), 0);
    }

    #[test]
    fn dns_name_is_a_getatt() {
        let f = synth(&LoadBalancerConfig::default());
        assert_eq!(
            f.lb.dns_name(),
            Expr::get_att(f.lb.load_balancer_id.clone(), "DNSName")
        );
    }
}
