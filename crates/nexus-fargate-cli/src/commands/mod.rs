//! CLI commands

use nexus_fargate_common::StackConfig;
use nexus_fargate_stack::Stack;

use crate::config::ConfigArgs;
use crate::Result;

pub mod graph;
pub mod synth;
pub mod validate;

/// Load the configuration and apply an optional stack name override
pub fn resolve_config(args: &ConfigArgs, stack_name: Option<&str>) -> Result<StackConfig> {
    let mut config = args.load()?;
    if let Some(name) = stack_name {
        config.stack_name = name.to_string();
    }
    Ok(config)
}

/// Build the stack a command operates on
pub fn load_stack(args: &ConfigArgs, stack_name: Option<&str>) -> Result<Stack> {
    Ok(Stack::new(resolve_config(args, stack_name)?))
}
