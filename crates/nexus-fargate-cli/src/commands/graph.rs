//! Graph command

use clap::Args;
use nexus_fargate_common::{ResourceGraph, Template};

use crate::config::ConfigArgs;
use crate::Result;

#[derive(Args, Debug, Clone, Default)]
pub struct GraphArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: GraphArgs) -> Result<()> {
    let template = super::load_stack(&args.config, None)?.synth()?;
    for line in describe(&template)? {
        println!("{}", line);
    }
    Ok(())
}

/// One line per resource in deployment order: id, type, direct dependencies
pub fn describe(template: &Template) -> Result<Vec<String>> {
    let graph = ResourceGraph::from_template(template)?;
    let order = graph.topological_order()?;
    Ok(order
        .into_iter()
        .map(|node| {
            let deps: Vec<&str> = node.dependencies.iter().map(String::as_str).collect();
            if deps.is_empty() {
                format!("{} ({})", node.logical_id, node.type_)
            } else {
                format!("{} ({}) <- {}", node.logical_id, node.type_, deps.join(", "))
            }
        })
        .collect())
}
