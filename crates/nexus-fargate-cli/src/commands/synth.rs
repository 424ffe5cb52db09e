//! Synth command

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use nexus_fargate_common::Template;
use tracing::info;

use crate::config::ConfigArgs;
use crate::{Error, Result};

/// Template rendering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }

    /// Render a template
    pub fn render(self, template: &Template) -> Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(template)?,
            OutputFormat::Yaml => serde_yaml::to_string(template)?,
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SynthArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the stack name from the config
    #[arg(long)]
    pub stack_name: Option<String>,

    /// Template format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Directory to write `<stack>.template.<ext>` into (stdout if not specified)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: SynthArgs) -> Result<()> {
    match &args.output {
        Some(dir) => {
            let path = write_template(&args, dir)?;
            println!("{}", path.display());
        }
        None => {
            let (_, rendered) = render(&args)?;
            println!("{}", rendered);
        }
    }
    Ok(())
}

/// Synthesize and render, returning the stack name with the rendered text
pub fn render(args: &SynthArgs) -> Result<(String, String)> {
    let stack = super::load_stack(&args.config, args.stack_name.as_deref())?;
    let template = stack.synth()?;
    Ok((stack.name().to_string(), args.format.render(&template)?))
}

/// Synthesize into `dir`, creating it if needed, and return the written path
pub fn write_template(args: &SynthArgs, dir: &Path) -> Result<PathBuf> {
    let (stack_name, rendered) = render(args)?;
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::command_failed(format!("failed to create {}: {}", dir.display(), e))
    })?;
    let path = dir.join(template_file_name(&stack_name, args.format));
    std::fs::write(&path, rendered)?;
    info!(stack = %stack_name, path = %path.display(), "template written");
    Ok(path)
}

/// `<stack>.template.<ext>`
pub fn template_file_name(stack_name: &str, format: OutputFormat) -> String {
    format!("{}.template.{}", stack_name, format.extension())
}
