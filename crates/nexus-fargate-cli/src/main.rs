//! nexus-fargate CLI
//!
//! Synthesizes the Nexus on Fargate stack into a deployable template.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nexus_fargate_cli::{Cli, Result};

fn main() -> Result<()> {
    // Logs go to stderr so rendered templates on stdout stay parseable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
