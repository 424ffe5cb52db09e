//! nexus-fargate CLI library

pub mod commands;
pub mod config;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// nexus-fargate - Nexus repository manager on Fargate
#[derive(Parser, Debug)]
#[command(name = "nexus-fargate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the stack into a template
    Synth(commands::synth::SynthArgs),
    /// Check the stack configuration without synthesizing
    Validate(commands::validate::ValidateArgs),
    /// Print resources in deployment order with their dependencies
    Graph(commands::graph::GraphArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Synth(args) => commands::synth::run(args),
            Commands::Validate(args) => commands::validate::run(args),
            Commands::Graph(args) => commands::graph::run(args),
        }
    }
}
