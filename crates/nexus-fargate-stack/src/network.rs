//! Virtual network: VPC, subnet tiers, gateways and routing
//!
//! Each tier gets one subnet per availability zone with its own route table.
//! Public subnets route to the internet gateway, private subnets route to a
//! NAT gateway hosted in a public subnet, isolated subnets have no default
//! route.

use nexus_fargate_common::cidr::Ipv4Cidr;
use nexus_fargate_common::config::{NetworkConfig, SubnetType};
use nexus_fargate_common::resource_types as rt;
use nexus_fargate_common::{Error, Expr, Resource, Result};
use tracing::debug;

use crate::context::SynthContext;
use crate::resources::{
    EipProps, InternetGatewayProps, NatGatewayProps, RouteProps, RouteTableProps, SubnetProps,
    SubnetRouteTableAssociationProps, Tag, VpcGatewayAttachmentProps, VpcProps, ANY_IPV4,
};

/// Construct id of the network
pub const NETWORK_ID: &str = "VPC";

/// A synthesized subnet
#[derive(Clone, Debug)]
pub struct Subnet {
    /// Tier name
    pub tier: String,
    /// Routing class of the tier
    pub subnet_type: SubnetType,
    /// Availability zone index
    pub zone: u8,
    /// Allocated address range
    pub cidr: Ipv4Cidr,
    /// Logical id of the subnet
    pub subnet_id: String,
    /// Logical id of its route table
    pub route_table_id: String,
    /// Logical id of its default route, if any
    pub default_route_id: Option<String>,
}

/// A synthesized network
#[derive(Clone, Debug)]
pub struct Network {
    /// Logical id of the VPC
    pub vpc_id: String,
    /// All subnets in tier then zone order
    pub subnets: Vec<Subnet>,
    /// Logical id of the internet gateway, when a public tier exists
    pub internet_gateway_id: Option<String>,
    /// Logical ids of the NAT gateways
    pub nat_gateway_ids: Vec<String>,
}

impl Network {
    /// Expand the network configuration into resources
    pub fn synth(ctx: &mut SynthContext, config: &NetworkConfig) -> Result<Self> {
        let allocation = config.allocate()?;
        let vpc_path = ctx.path(&[NETWORK_ID]);

        let vpc_id = ctx.add(
            &[NETWORK_ID],
            Resource::new(
                rt::VPC,
                &VpcProps {
                    cidr_block: config.cidr.clone(),
                    enable_dns_hostnames: true,
                    enable_dns_support: true,
                    instance_tenancy: "default".to_string(),
                    tags: vec![Tag::name(&vpc_path)],
                },
            )?,
        )?;

        let has_public = config.has_tier_of_type(SubnetType::Public);
        let (internet_gateway_id, attachment_id) = if has_public {
            let igw = ctx.add(
                &[NETWORK_ID, "IGW"],
                Resource::new(
                    rt::INTERNET_GATEWAY,
                    &InternetGatewayProps {
                        tags: vec![Tag::name(&vpc_path)],
                    },
                )?,
            )?;
            let attachment = ctx.add(
                &[NETWORK_ID, "VPCGW"],
                Resource::new(
                    rt::VPC_GATEWAY_ATTACHMENT,
                    &VpcGatewayAttachmentProps {
                        vpc_id: Expr::reference(&vpc_id),
                        internet_gateway_id: Expr::reference(&igw),
                    },
                )?,
            )?;
            (Some(igw), Some(attachment))
        } else {
            (None, None)
        };

        let mut subnets = Vec::with_capacity(allocation.len());
        let mut nat_gateway_ids = Vec::new();

        for (tier, zone, cidr) in allocation {
            let construct = format!("{}Subnet{}", tier.name, zone + 1);
            let subnet_path = ctx.path(&[NETWORK_ID, construct.as_str()]);

            let subnet_id = ctx.add(
                &[NETWORK_ID, construct.as_str(), "Subnet"],
                Resource::new(
                    rt::SUBNET,
                    &SubnetProps {
                        vpc_id: Expr::reference(&vpc_id),
                        availability_zone: Expr::availability_zone(u32::from(zone)),
                        cidr_block: cidr.to_string(),
                        map_public_ip_on_launch: tier.subnet_type == SubnetType::Public,
                        tags: vec![
                            Tag {
                                key: "nexus-fargate:subnet-name".to_string(),
                                value: tier.name.clone(),
                            },
                            Tag {
                                key: "nexus-fargate:subnet-type".to_string(),
                                value: tier.subnet_type.as_str().to_string(),
                            },
                            Tag::name(&subnet_path),
                        ],
                    },
                )?,
            )?;

            let route_table_id = ctx.add(
                &[NETWORK_ID, construct.as_str(), "RouteTable"],
                Resource::new(
                    rt::ROUTE_TABLE,
                    &RouteTableProps {
                        vpc_id: Expr::reference(&vpc_id),
                        tags: vec![Tag::name(&subnet_path)],
                    },
                )?,
            )?;

            ctx.add(
                &[NETWORK_ID, construct.as_str(), "RouteTableAssociation"],
                Resource::new(
                    rt::SUBNET_ROUTE_TABLE_ASSOCIATION,
                    &SubnetRouteTableAssociationProps {
                        route_table_id: Expr::reference(&route_table_id),
                        subnet_id: Expr::reference(&subnet_id),
                    },
                )?,
            )?;

            let default_route_id = match tier.subnet_type {
                SubnetType::Public => {
                    let (Some(igw), Some(attachment)) = (&internet_gateway_id, &attachment_id)
                    else {
                        return Err(Error::synthesis(
                            &subnet_path,
                            "public subnet without an internet gateway",
                        ));
                    };
                    let route = Resource::new(
                        rt::ROUTE,
                        &RouteProps {
                            route_table_id: Expr::reference(&route_table_id),
                            destination_cidr_block: ANY_IPV4.to_string(),
                            gateway_id: Some(Expr::reference(igw)),
                            nat_gateway_id: None,
                        },
                    )?
                    .depends_on(attachment);
                    let route_id =
                        ctx.add(&[NETWORK_ID, construct.as_str(), "DefaultRoute"], route)?;

                    if nat_gateway_ids.len() < usize::from(config.nat_gateways) {
                        let eip = ctx.add(
                            &[NETWORK_ID, construct.as_str(), "EIP"],
                            Resource::new(
                                rt::EIP,
                                &EipProps {
                                    domain: "vpc".to_string(),
                                    tags: vec![Tag::name(&subnet_path)],
                                },
                            )?,
                        )?;
                        let nat = ctx.add(
                            &[NETWORK_ID, construct.as_str(), "NATGateway"],
                            Resource::new(
                                rt::NAT_GATEWAY,
                                &NatGatewayProps {
                                    subnet_id: Expr::reference(&subnet_id),
                                    allocation_id: Expr::get_att(&eip, "AllocationId"),
                                    tags: vec![Tag::name(&subnet_path)],
                                },
                            )?
                            .depends_on(&route_id),
                        )?;
                        nat_gateway_ids.push(nat);
                    }
                    Some(route_id)
                }
                SubnetType::Private => {
                    // NAT gateways exist once the public tier is expanded
                    let nat = nat_gateway_ids
                        .get(usize::from(zone) % nat_gateway_ids.len().max(1))
                        .ok_or_else(|| {
                            Error::synthesis(
                                &subnet_path,
                                "private subnet needs a NAT gateway; declare the public tier first",
                            )
                        })?;
                    let route_id = ctx.add(
                        &[NETWORK_ID, construct.as_str(), "DefaultRoute"],
                        Resource::new(
                            rt::ROUTE,
                            &RouteProps {
                                route_table_id: Expr::reference(&route_table_id),
                                destination_cidr_block: ANY_IPV4.to_string(),
                                gateway_id: None,
                                nat_gateway_id: Some(Expr::reference(nat)),
                            },
                        )?,
                    )?;
                    Some(route_id)
                }
                SubnetType::Isolated => None,
            };

            debug!(tier = %tier.name, zone, cidr = %cidr, "subnet allocated");

            subnets.push(Subnet {
                tier: tier.name.clone(),
                subnet_type: tier.subnet_type,
                zone,
                cidr,
                subnet_id,
                route_table_id,
                default_route_id,
            });
        }

        Ok(Self {
            vpc_id,
            subnets,
            internet_gateway_id,
            nat_gateway_ids,
        })
    }

    /// Subnets of one tier, in zone order
    pub fn select_subnets(&self, tier: &str) -> Vec<&Subnet> {
        self.subnets.iter().filter(|s| s.tier == tier).collect()
    }

    /// `Ref`s to the subnets of one tier; fails if the tier has none
    pub fn subnet_refs(&self, tier: &str) -> Result<Vec<Expr>> {
        let refs: Vec<Expr> = self
            .select_subnets(tier)
            .into_iter()
            .map(|s| Expr::reference(&s.subnet_id))
            .collect();
        if refs.is_empty() {
            return Err(Error::synthesis(
                NETWORK_ID,
                format!("no subnets in tier '{tier}'"),
            ));
        }
        Ok(refs)
    }

    /// Default routes of the public tier; resources reachable from the
    /// internet must wait for them
    pub fn internet_connectivity(&self) -> Vec<&str> {
        self.subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Public)
            .filter_map(|s| s.default_route_id.as_deref())
            .collect()
    }

    /// Distinct tier names, in declaration order
    pub fn tiers(&self) -> Vec<&str> {
        let mut tiers: Vec<&str> = Vec::new();
        for s in &self.subnets {
            if !tiers.contains(&s.tier.as_str()) {
                tiers.push(&s.tier);
            }
        }
        tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_fargate_common::config::SubnetConfig;

    fn synth_default() -> (SynthContext, Network) {
        let mut ctx = SynthContext::new("TestStack");
        let network = Network::synth(&mut ctx, &NetworkConfig::default()).unwrap();
        (ctx, network)
    }

    #[test]
    fn three_tiers_across_two_zones() {
        let (ctx, network) = synth_default();
        assert_eq!(network.tiers(), vec!["public", "container", "persistent"]);
        for tier in network.tiers() {
            let zones: Vec<u8> = network.select_subnets(tier).iter().map(|s| s.zone).collect();
            assert_eq!(zones, vec![0, 1], "tier {tier}");
        }
        assert_eq!(ctx.template().count_of_type(rt::SUBNET), 6);
        assert_eq!(ctx.template().count_of_type(rt::VPC), 1);
    }

    #[test]
    fn exactly_one_nat_gateway_in_first_public_subnet() {
        let (ctx, network) = synth_default();
        assert_eq!(network.nat_gateway_ids.len(), 1);
        assert_eq!(ctx.template().count_of_type(rt::NAT_GATEWAY), 1);
        assert_eq!(ctx.template().count_of_type(rt::EIP), 1);
        assert!(network.nat_gateway_ids[0].starts_with("VPCpublicSubnet1NATGateway"));
    }

    #[test]
    fn routing_follows_tier_type() {
        let (ctx, network) = synth_default();
        let template = ctx.template();
        let route = |s: &Subnet| {
            s.default_route_id
                .as_ref()
                .map(|id| template.resources[id].properties.clone())
        };

        for s in network.select_subnets("public") {
            let props = route(s).unwrap();
            assert!(props.get("GatewayId").is_some());
            assert!(props.get("NatGatewayId").is_none());
        }
        for s in network.select_subnets("container") {
            let props = route(s).unwrap();
            assert_eq!(
                props["NatGatewayId"]["Ref"],
                network.nat_gateway_ids[0].as_str()
            );
        }
        for s in network.select_subnets("persistent") {
            assert!(s.default_route_id.is_none());
        }
        assert_eq!(network.internet_connectivity().len(), 2);
    }

    #[test]
    fn public_routes_wait_for_gateway_attachment() {
        let (ctx, network) = synth_default();
        let attachment = ctx.id(&[NETWORK_ID, "VPCGW"]);
        for id in network.internet_connectivity() {
            assert_eq!(ctx.template().resources[id].depends_on, vec![attachment.clone()]);
        }
    }

    #[test]
    fn subnets_use_selected_zones_and_cidrs() {
        let (ctx, network) = synth_default();
        let persistent = network.select_subnets("persistent");
        let props = &ctx.template().resources[&persistent[1].subnet_id].properties;
        assert_eq!(props["CidrBlock"], "10.0.5.0/24");
        assert_eq!(props["AvailabilityZone"]["Fn::Select"][0], 1);
        assert_eq!(props["MapPublicIpOnLaunch"], false);
    }

    #[test]
    fn isolated_only_network_has_no_gateways() {
        let config = NetworkConfig {
            nat_gateways: 0,
            subnets: vec![SubnetConfig::new("data", 24, SubnetType::Isolated)],
            ..NetworkConfig::default()
        };
        let mut ctx = SynthContext::new("TestStack");
        let network = Network::synth(&mut ctx, &config).unwrap();
        assert!(network.internet_gateway_id.is_none());
        assert!(network.nat_gateway_ids.is_empty());
        assert_eq!(ctx.template().count_of_type(rt::INTERNET_GATEWAY), 0);
    }

    #[test]
    fn private_tier_before_public_tier_is_a_synthesis_error() {
        let config = NetworkConfig {
            subnets: vec![
                SubnetConfig::new("container", 24, SubnetType::Private),
                SubnetConfig::new("public", 24, SubnetType::Public),
            ],
            ..NetworkConfig::default()
        };
        let mut ctx = SynthContext::new("TestStack");
        let err = Network::synth(&mut ctx, &config).unwrap_err();
        assert!(err.to_string().contains("NAT gateway"));
    }

    #[test]
    fn unknown_tier_has_no_subnet_refs() {
        let (_, network) = synth_default();
        assert!(network.subnet_refs("nope").is_err());
        assert_eq!(network.subnet_refs("container").unwrap().len(), 2);
    }
}
