//! Shared persistent storage: encrypted filesystem, mount targets and the
//! single access point

use nexus_fargate_common::config::StorageConfig;
use nexus_fargate_common::resource_types as rt;
use nexus_fargate_common::{Error, Expr, Resource, Result};
use tracing::{debug, warn};

use crate::context::SynthContext;
use crate::network::Network;
use crate::resources::{
    AccessPointProps, FileSystemProps, LifecyclePolicyProps, MountTargetProps, PosixUser,
    RootDirectory, Tag,
};

/// Construct id of the filesystem
pub const FILE_SYSTEM_ID: &str = "EFS";

/// Construct id of the access point
pub const ACCESS_POINT_ID: &str = "AccessPoint";

/// A synthesized filesystem
#[derive(Clone, Debug)]
pub struct FileSystem {
    /// Logical id of the filesystem
    pub file_system_id: String,
    /// Logical ids of the mount targets, one per subnet of the storage tier
    pub mount_target_ids: Vec<String>,
    /// Logical id of the access point
    pub access_point_id: String,
}

impl FileSystem {
    /// Expand the storage configuration into resources
    ///
    /// `security_group` is the group attached to every mount target.
    pub fn synth(
        ctx: &mut SynthContext,
        config: &StorageConfig,
        network: &Network,
        security_group: Expr,
    ) -> Result<Self> {
        let fs_path = ctx.path(&[FILE_SYSTEM_ID]);
        let subnets = network.select_subnets(&config.subnet_group);
        if subnets.is_empty() {
            return Err(Error::synthesis(
                &fs_path,
                format!("no subnets in tier '{}'", config.subnet_group),
            ));
        }

        let file_system_id = ctx.add(
            &[FILE_SYSTEM_ID],
            Resource::new(
                rt::EFS_FILE_SYSTEM,
                &FileSystemProps {
                    encrypted: config.encrypted,
                    file_system_tags: vec![Tag::name(&fs_path)],
                    lifecycle_policies: vec![LifecyclePolicyProps {
                        transition_to_ia: config.lifecycle_policy.as_str().to_string(),
                    }],
                    performance_mode: config.performance_mode.as_str().to_string(),
                    throughput_mode: config.throughput_mode.as_str().to_string(),
                },
            )?
            .with_removal_policy(config.removal_policy),
        )?;

        let mut mount_target_ids = Vec::with_capacity(subnets.len());
        for (index, subnet) in subnets.iter().enumerate() {
            let construct = format!("EfsMountTarget{}", index + 1);
            let id = ctx.add(
                &[FILE_SYSTEM_ID, construct.as_str()],
                Resource::new(
                    rt::EFS_MOUNT_TARGET,
                    &MountTargetProps {
                        file_system_id: Expr::reference(&file_system_id),
                        security_groups: vec![security_group.clone()],
                        subnet_id: Expr::reference(&subnet.subnet_id),
                    },
                )?,
            )?;
            mount_target_ids.push(id);
        }

        let ap = &config.access_point;
        if ap.maps_to_root() {
            warn!(
                access_point = %ctx.path(&[ACCESS_POINT_ID]),
                uid = %ap.uid,
                gid = %ap.gid,
                "access point maps every client to the administrative identity"
            );
        }

        let access_point_id = ctx.add(
            &[ACCESS_POINT_ID],
            Resource::new(
                rt::EFS_ACCESS_POINT,
                &AccessPointProps {
                    file_system_id: Expr::reference(&file_system_id),
                    posix_user: PosixUser {
                        gid: ap.gid.clone(),
                        uid: ap.uid.clone(),
                    },
                    root_directory: RootDirectory {
                        path: ap.path.clone(),
                    },
                },
            )?,
        )?;

        debug!(
            file_system = %file_system_id,
            mount_targets = mount_target_ids.len(),
            "filesystem synthesized"
        );

        Ok(Self {
            file_system_id,
            mount_target_ids,
            access_point_id,
        })
    }
}
