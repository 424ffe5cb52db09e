//! Application: the set of stacks synthesized together

use std::collections::BTreeMap;

use nexus_fargate_common::{Error, Result, Template};
use tracing::{debug, info};

use crate::stack::Stack;

/// Templates produced by one synthesis run, keyed by stack name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudAssembly {
    /// One template per stack
    pub stacks: BTreeMap<String, Template>,
}

impl CloudAssembly {
    /// Template of a stack by name
    pub fn stack(&self, name: &str) -> Option<&Template> {
        self.stacks.get(name)
    }

    /// Total number of resources across every stack
    pub fn total_resources(&self) -> usize {
        self.stacks.values().map(|t| t.resources.len()).sum()
    }

    /// Every stack's resources and outputs folded into one template
    ///
    /// An assembly without stacks yields an empty resource collection.
    pub fn merged(&self) -> Result<Template> {
        let mut merged = Template::new();
        for template in self.stacks.values() {
            for (id, resource) in &template.resources {
                merged.add_resource(id.clone(), resource.clone())?;
            }
            for (name, output) in &template.outputs {
                merged.add_output(name.clone(), output.clone())?;
            }
        }
        Ok(merged)
    }
}

/// A collection of stacks
#[derive(Clone, Debug, Default)]
pub struct App {
    stacks: Vec<Stack>,
}

impl App {
    /// An application without stacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack; stack names must be unique within the app
    pub fn add_stack(&mut self, stack: Stack) -> Result<&mut Self> {
        if self.stacks.iter().any(|s| s.name() == stack.name()) {
            return Err(Error::synthesis(stack.name(), "stack name already used in this app"));
        }
        self.stacks.push(stack);
        Ok(self)
    }

    /// Stacks of this app, in insertion order
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Synthesize every stack
    pub fn synth(&self) -> Result<CloudAssembly> {
        let mut assembly = CloudAssembly::default();
        for stack in &self.stacks {
            debug!(stack = %stack.name(), "synthesizing stack");
            assembly
                .stacks
                .insert(stack.name().to_string(), stack.synth()?);
        }
        info!(
            stacks = assembly.stacks.len(),
            resources = assembly.total_resources(),
            "app synthesized"
        );
        Ok(assembly)
    }
}
