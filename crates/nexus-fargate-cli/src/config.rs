//! Stack configuration loading
//!
//! The configuration resolution chain (highest priority first):
//! 1. Explicit `--config` flag
//! 2. `NEXUS_FARGATE_CONFIG` environment variable
//! 3. Built-in defaults
//!
//! A config file only needs the fields it overrides; `--stack-name` is
//! applied on top of whatever the file says.

use std::path::{Path, PathBuf};

use clap::Args;
use nexus_fargate_common::StackConfig;
use tracing::debug;

use crate::{Error, Result};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "NEXUS_FARGATE_CONFIG";

/// Config file selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// YAML or JSON file overriding the default stack configuration
    #[arg(long, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load the configuration this selection points at
    pub fn load(&self) -> Result<StackConfig> {
        match &self.config {
            Some(path) => load_file(path),
            None => {
                debug!("no config file given, using defaults");
                Ok(StackConfig::default())
            }
        }
    }
}

/// Parse a config file (JSON is accepted as YAML)
pub fn load_file(path: &Path) -> Result<StackConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::command_failed(format!("failed to read {}: {}", path.display(), e)))?;
    let config: StackConfig = serde_yaml::from_str(&data)?;
    debug!(path = %path.display(), stack = %config.stack_name, "loaded config file");
    Ok(config)
}
