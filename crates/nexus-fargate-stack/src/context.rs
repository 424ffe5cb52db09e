//! Synthesis context shared by every construct of a stack

use nexus_fargate_common::logical_id::{logical_id, PATH_SEPARATOR};
use nexus_fargate_common::{Output, Resource, Result, Template};
use tracing::debug;

/// Collects the resources of one stack as constructs expand
#[derive(Debug)]
pub struct SynthContext {
    stack_name: String,
    template: Template,
}

impl SynthContext {
    /// Start an empty template for a stack
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template: Template::new(),
        }
    }

    /// Name of the stack being synthesized
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Full construct path including the stack name, e.g. `NexusFargateStack/VPC`
    pub fn path(&self, path: &[&str]) -> String {
        std::iter::once(self.stack_name.as_str())
            .chain(path.iter().copied())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// Logical id a resource at `path` gets (independent of whether it exists yet)
    pub fn id(&self, path: &[&str]) -> String {
        logical_id(path)
    }

    /// Add a resource at `path` and return its logical id
    pub fn add(&mut self, path: &[&str], resource: Resource) -> Result<String> {
        let id = logical_id(path);
        debug!(
            logical_id = %id,
            resource_type = %resource.type_,
            path = %self.path(path),
            "adding resource"
        );
        self.template.add_resource(id.clone(), resource)?;
        Ok(id)
    }

    /// Add a stack output
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<()> {
        self.template.add_output(name, output)
    }

    /// Set the template description
    pub fn set_description(&mut self, description: Option<String>) {
        self.template.description = description;
    }

    /// Read access to the template built so far
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Finish and hand back the template
    pub fn into_template(self) -> Template {
        self.template
    }
}
