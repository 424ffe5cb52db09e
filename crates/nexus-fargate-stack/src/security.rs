//! Security groups and their ingress rules
//!
//! Groups are declared up front so other constructs can reference them by
//! logical id. Rules accumulate as constructs are wired together (explicit
//! `allow_from` calls plus the rules implied by listeners and load balancer
//! targets) and are emitted once every relationship is known.

use std::fmt;

use nexus_fargate_common::resource_types as rt;
use nexus_fargate_common::{Error, Expr, Resource, Result};
use tracing::debug;

use crate::context::SynthContext;
use crate::resources::{
    CidrEgress, CidrIngress, SecurityGroupIngressProps, SecurityGroupProps, ANY_IPV4,
};

/// Transport protocol and port range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Port {
    /// Lowest port of the range
    pub from: u16,
    /// Highest port of the range
    pub to: u16,
}

impl Port {
    /// A single TCP port
    pub fn tcp(port: u16) -> Self {
        Self {
            from: port,
            to: port,
        }
    }

    /// Protocol name as the provider spells it
    pub fn protocol(&self) -> &'static str {
        "tcp"
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// Source of an ingress rule
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Peer {
    /// Any IPv4 address
    AnyIpv4,
    /// Members of another security group (construct id)
    Group(String),
}

/// An ingress rule between two groups
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupIngress {
    /// Construct id of the group receiving traffic
    pub target: String,
    /// Construct id of the group sending traffic
    pub source: String,
    /// Admitted port
    pub port: Port,
}

#[derive(Clone, Debug)]
struct SecurityGroup {
    construct_id: String,
    description: String,
    cidr_ingress: Vec<CidrIngress>,
}

/// The stack's security groups and the rules between them
#[derive(Clone, Debug, Default)]
pub struct SecurityPolicy {
    groups: Vec<SecurityGroup>,
    group_rules: Vec<GroupIngress>,
}

impl SecurityPolicy {
    /// Empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a group; its logical id is usable immediately
    pub fn add_group(&mut self, ctx: &SynthContext, construct_id: &str) -> Result<String> {
        if self.find(construct_id).is_some() {
            return Err(Error::synthesis(
                ctx.path(&[construct_id]),
                "security group declared twice",
            ));
        }
        self.groups.push(SecurityGroup {
            construct_id: construct_id.to_string(),
            description: ctx.path(&[construct_id]),
            cidr_ingress: Vec::new(),
        });
        Ok(ctx.id(&[construct_id]))
    }

    /// Admit `port` into `target` from `peer`
    ///
    /// Adding the same rule twice is a no-op.
    pub fn allow_from(&mut self, target: &str, peer: Peer, port: Port) -> Result<()> {
        if self.find(target).is_none() {
            return Err(Error::synthesis(target, "unknown security group"));
        }
        match peer {
            Peer::AnyIpv4 => {
                let rule = CidrIngress {
                    cidr_ip: ANY_IPV4.to_string(),
                    description: format!("Allow from anyone on port {port}"),
                    from_port: port.from,
                    ip_protocol: port.protocol().to_string(),
                    to_port: port.to,
                };
                if let Some(group) = self.groups.iter_mut().find(|g| g.construct_id == target) {
                    if !group.cidr_ingress.contains(&rule) {
                        group.cidr_ingress.push(rule);
                    }
                }
            }
            Peer::Group(source) => {
                if self.find(&source).is_none() {
                    return Err(Error::synthesis(source, "unknown security group"));
                }
                let rule = GroupIngress {
                    target: target.to_string(),
                    source,
                    port,
                };
                if !self.group_rules.contains(&rule) {
                    self.group_rules.push(rule);
                }
            }
        }
        Ok(())
    }

    /// `Fn::GetAtt GroupId` of a declared group
    pub fn group_id(&self, ctx: &SynthContext, construct_id: &str) -> Result<Expr> {
        self.find(construct_id)
            .map(|_| Expr::get_att(ctx.id(&[construct_id]), "GroupId"))
            .ok_or_else(|| Error::synthesis(construct_id, "unknown security group"))
    }

    /// Group-to-group rules admitting traffic into `target`
    pub fn ingress_from_groups(&self, target: &str) -> Vec<&GroupIngress> {
        self.group_rules
            .iter()
            .filter(|r| r.target == target)
            .collect()
    }

    /// Number of inbound rules of any kind on `target`
    pub fn inbound_rule_count(&self, target: &str) -> usize {
        let cidr = self.find(target).map_or(0, |g| g.cidr_ingress.len());
        cidr + self.ingress_from_groups(target).len()
    }

    /// Emit the groups (inline CIDR ingress, allow-all egress) and the
    /// standalone group-to-group ingress resources
    pub fn emit(self, ctx: &mut SynthContext, vpc_id: &str) -> Result<()> {
        for group in &self.groups {
            ctx.add(
                &[group.construct_id.as_str()],
                Resource::new(
                    rt::SECURITY_GROUP,
                    &SecurityGroupProps {
                        group_description: group.description.clone(),
                        vpc_id: Expr::reference(vpc_id),
                        security_group_egress: vec![CidrEgress {
                            cidr_ip: ANY_IPV4.to_string(),
                            description: "Allow all outbound traffic by default".to_string(),
                            ip_protocol: "-1".to_string(),
                        }],
                        security_group_ingress: group.cidr_ingress.clone(),
                    },
                )?,
            )?;
        }

        for rule in &self.group_rules {
            let source_id = ctx.id(&[rule.source.as_str()]);
            let target_id = ctx.id(&[rule.target.as_str()]);
            let rule_name = format!("from {}:{}", source_id, rule.port);
            debug!(group = %rule.target, source = %rule.source, port = %rule.port, "ingress rule");
            ctx.add(
                &[rule.target.as_str(), rule_name.as_str()],
                Resource::new(
                    rt::SECURITY_GROUP_INGRESS,
                    &SecurityGroupIngressProps {
                        ip_protocol: rule.port.protocol().to_string(),
                        description: rule_name.clone(),
                        from_port: rule.port.from,
                        group_id: Expr::get_att(&target_id, "GroupId"),
                        source_security_group_id: Expr::get_att(&source_id, "GroupId"),
                        to_port: rule.port.to,
                    },
                )?,
            )?;
        }

        Ok(())
    }

    fn find(&self, construct_id: &str) -> Option<&SecurityGroup> {
        self.groups.iter().find(|g| g.construct_id == construct_id)
    }
}
