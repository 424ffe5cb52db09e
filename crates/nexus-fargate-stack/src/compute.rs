//! Container cluster and the Fargate task definition
//!
//! The task runs a single container with the shared filesystem mounted
//! through the access point. The container definition is embedded in the
//! task definition resource.

use nexus_fargate_common::config::ComputeConfig;
use nexus_fargate_common::resource_types as rt;
use nexus_fargate_common::{Expr, Resource, Result};
use tracing::debug;

use crate::context::SynthContext;
use crate::resources::{
    AuthorizationConfig, CapacityProviderAssociationsProps, ClusterProps, ContainerDefinition,
    EfsVolumeConfiguration, LinuxParameters, MountPoint, PolicyDocument, PortMapping, RoleProps,
    Statement, TaskDefinitionProps, TaskVolume, Ulimit,
};
use crate::storage::FileSystem;

/// Construct id of the cluster
pub const CLUSTER_ID: &str = "Cluster";

/// Construct id of the task definition
pub const TASK_DEFINITION_ID: &str = "NexusTaskDef";

/// Capacity providers associated when Fargate capacity providers are enabled
pub const FARGATE_CAPACITY_PROVIDERS: [&str; 2] = ["FARGATE", "FARGATE_SPOT"];

/// Service principal that runs ECS tasks
const TASKS_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";

/// A synthesized cluster and task definition
#[derive(Clone, Debug)]
pub struct Compute {
    /// Logical id of the cluster
    pub cluster_id: String,
    /// Logical id of the task definition
    pub task_definition_id: String,
    /// Logical id of the task role
    pub task_role_id: String,
    /// Name of the container (load balancer target)
    pub container_name: String,
    /// Port the container listens on
    pub container_port: u16,
}

impl Compute {
    /// Expand the compute configuration into resources
    pub fn synth(
        ctx: &mut SynthContext,
        config: &ComputeConfig,
        file_system: &FileSystem,
    ) -> Result<Self> {
        let cluster_id = ctx.add(&[CLUSTER_ID], Resource::new(rt::ECS_CLUSTER, &ClusterProps {})?)?;

        if config.enable_fargate_capacity_providers {
            ctx.add(
                &[CLUSTER_ID, "CapacityProviderAssociations"],
                Resource::new(
                    rt::ECS_CAPACITY_PROVIDER_ASSOCIATIONS,
                    &CapacityProviderAssociationsProps {
                        capacity_providers: FARGATE_CAPACITY_PROVIDERS
                            .iter()
                            .map(|p| p.to_string())
                            .collect(),
                        cluster: Expr::reference(&cluster_id),
                        default_capacity_provider_strategy: Vec::new(),
                    },
                )?,
            )?;
        }

        let task_role_id = ctx.add(
            &[TASK_DEFINITION_ID, "TaskRole"],
            Resource::new(
                rt::IAM_ROLE,
                &RoleProps {
                    assume_role_policy_document: PolicyDocument::new(vec![
                        Statement::assume_role(TASKS_PRINCIPAL),
                    ]),
                },
            )?,
        )?;

        let container = &config.container;
        let container_definition = ContainerDefinition {
            essential: true,
            image: container.image.clone(),
            linux_parameters: LinuxParameters {
                init_process_enabled: container.init_process_enabled,
            },
            mount_points: vec![MountPoint {
                container_path: container.mount_path.clone(),
                read_only: container.read_only,
                source_volume: container.volume_name.clone(),
            }],
            name: container.name.clone(),
            port_mappings: vec![PortMapping {
                container_port: container.port,
                host_port: container.port,
                protocol: "tcp".to_string(),
            }],
            ulimits: vec![Ulimit {
                hard_limit: container.nofile_limit,
                name: "nofile".to_string(),
                soft_limit: container.nofile_limit,
            }],
        };

        let task_definition_id = ctx.id(&[TASK_DEFINITION_ID]);
        let family: String = format!("{}{}", ctx.stack_name(), task_definition_id)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        ctx.add(
            &[TASK_DEFINITION_ID],
            Resource::new(
                rt::ECS_TASK_DEFINITION,
                &TaskDefinitionProps {
                    container_definitions: vec![container_definition],
                    cpu: config.cpu.to_string(),
                    family,
                    memory: config.memory_mib.to_string(),
                    network_mode: "awsvpc".to_string(),
                    requires_compatibilities: vec!["FARGATE".to_string()],
                    task_role_arn: Expr::get_att(&task_role_id, "Arn"),
                    volumes: vec![TaskVolume {
                        efs_volume_configuration: EfsVolumeConfiguration {
                            file_system_id: Expr::reference(&file_system.file_system_id),
                            transit_encryption: "ENABLED".to_string(),
                            authorization_config: AuthorizationConfig {
                                access_point_id: Expr::reference(&file_system.access_point_id),
                            },
                        },
                        name: container.volume_name.clone(),
                    }],
                },
            )?,
        )?;

        debug!(
            task_definition = %task_definition_id,
            cpu = config.cpu,
            memory_mib = config.memory_mib,
            image = %container.image,
            "task definition synthesized"
        );

        Ok(Self {
            cluster_id,
            task_definition_id,
            task_role_id,
            container_name: container.name.clone(),
            container_port: container.port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_fargate_common::config::{NetworkConfig, StorageConfig};

    use crate::network::Network;

    fn synth(config: &ComputeConfig) -> (SynthContext, Compute) {
        let mut ctx = SynthContext::new("TestStack");
        let network = Network::synth(&mut ctx, &NetworkConfig::default()).unwrap();
        let fs = FileSystem::synth(
            &mut ctx,
            &StorageConfig::default(),
            &network,
            Expr::get_att("EfsSg", "GroupId"),
        )
        .unwrap();
        let compute = Compute::synth(&mut ctx, config, &fs).unwrap();
        (ctx, compute)
    }

    #[test]
    fn task_reserves_fixed_cpu_and_memory() {
        let (ctx, compute) = synth(&ComputeConfig::default());
        let props = &ctx.template().resources[&compute.task_definition_id].properties;
        assert_eq!(props["Cpu"], "1024");
        assert_eq!(props["Memory"], "2048");
        assert_eq!(props["NetworkMode"], "awsvpc");
        assert_eq!(props["RequiresCompatibilities"][0], "FARGATE");
        assert_eq!(props["TaskRoleArn"]["Fn::GetAtt"][0], compute.task_role_id.as_str());
        assert!(props["Family"].as_str().unwrap().starts_with("TestStackNexusTaskDef"));
    }

    #[test]
    fn container_definition_matches_declaration() {
        let (ctx, compute) = synth(&ComputeConfig::default());
        let props = &ctx.template().resources[&compute.task_definition_id].properties;
        let containers = props["ContainerDefinitions"].as_array().unwrap();
        assert_eq!(containers.len(), 1);

        let c = &containers[0];
        assert_eq!(c["Name"], "nexus");
        assert_eq!(c["Image"], "sonatype/nexus3:3.33.1");
        assert_eq!(c["Essential"], true);
        assert_eq!(c["PortMappings"][0]["ContainerPort"], 8081);
        assert_eq!(c["PortMappings"][0]["HostPort"], 8081);
        assert_eq!(c["MountPoints"][0]["ContainerPath"], "/nexus-data");
        assert_eq!(c["MountPoints"][0]["ReadOnly"], false);
        assert_eq!(c["MountPoints"][0]["SourceVolume"], "nexus-data-volume");
        assert_eq!(c["Ulimits"][0]["Name"], "nofile");
        assert_eq!(c["Ulimits"][0]["SoftLimit"], 65536);
        assert_eq!(c["Ulimits"][0]["HardLimit"], 65536);
        assert_eq!(c["LinuxParameters"]["InitProcessEnabled"], true);
    }

    #[test]
    fn volume_goes_through_access_point_with_transit_encryption() {
        let (ctx, compute) = synth(&ComputeConfig::default());
        let props = &ctx.template().resources[&compute.task_definition_id].properties;
        let volume = &props["Volumes"][0];
        assert_eq!(volume["Name"], "nexus-data-volume");
        let efs = &volume["EFSVolumeConfiguration"];
        assert_eq!(efs["TransitEncryption"], "ENABLED");
        assert!(efs["FilesystemId"]["Ref"].as_str().unwrap().starts_with("EFS"));
        assert!(efs["AuthorizationConfig"]["AccessPointId"]["Ref"]
            .as_str()
            .unwrap()
            .starts_with("AccessPoint"));
    }

    #[test]
    fn capacity_providers_follow_config() {
        let (ctx, _) = synth(&ComputeConfig::default());
        let (_, associations) = ctx
            .template()
            .resources_of_type(rt::ECS_CAPACITY_PROVIDER_ASSOCIATIONS)
            .next()
            .unwrap();
        assert_eq!(
            associations.properties["CapacityProviders"],
            serde_json::json!(["FARGATE", "FARGATE_SPOT"])
        );
        assert_eq!(
            associations.properties["DefaultCapacityProviderStrategy"],
            serde_json::json!([])
        );

        let config = ComputeConfig {
            enable_fargate_capacity_providers: false,
            ..ComputeConfig::default()
        };
        let (ctx, _) = synth(&config);
        assert_eq!(
            ctx.template().count_of_type(rt::ECS_CAPACITY_PROVIDER_ASSOCIATIONS),
            0
        );
        assert_eq!(ctx.template().count_of_type(rt::ECS_CLUSTER), 1);
    }
}
