//! Validate command

use clap::Args;
use nexus_fargate_common::Error as StackError;

use crate::config::ConfigArgs;
use crate::{Error, Result};

#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let problems = problems(&args)?;

    if problems.is_empty() {
        println!("Configuration is valid");
        Ok(())
    } else {
        println!("Validation errors:");
        for problem in &problems {
            println!("  - {}", problem);
        }
        Err(Error::validation(format!(
            "{} validation errors",
            problems.len()
        )))
    }
}

/// Every problem with the selected configuration, rendered for display
pub fn problems(args: &ValidateArgs) -> Result<Vec<String>> {
    let config = args.config.load()?;
    Ok(config
        .problems()
        .into_iter()
        .map(|e| match &e {
            StackError::Validation {
                message,
                field: Some(field),
                ..
            } => format!("{}: {}", field, message),
            other => other.to_string(),
        })
        .collect())
}
