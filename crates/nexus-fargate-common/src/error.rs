//! Error types for stack synthesis
//!
//! Errors are structured with fields to aid debugging. Each variant carries
//! the context it was raised in: the stack being validated, the construct
//! being expanded, or the resource whose dependencies could not be resolved.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for stack description and synthesis
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected before synthesis
    #[error("validation error for {stack}: {message}")]
    Validation {
        /// Name of the stack with invalid configuration
        stack: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "network.cidr")
        field: Option<String>,
    },

    /// A construct could not be expanded into resources
    #[error("synthesis error [{construct}]: {message}")]
    Synthesis {
        /// Construct path where expansion failed (e.g., "NexusFargateStack/EFS")
        construct: String,
        /// Description of what failed
        message: String,
    },

    /// The resource graph is inconsistent (dangling reference or cycle)
    #[error("resource graph error: {message}")]
    Graph {
        /// Description of what failed
        message: String,
        /// Logical id of the offending resource (if known)
        resource: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The format being produced or parsed (json, yaml)
        format: Option<String>,
    },
}

impl Error {
    /// Create a validation error with the given message
    ///
    /// For simple validation errors without stack context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            stack: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with a field path
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            stack: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Attach a stack name to a validation error; other variants pass through
    pub fn in_stack(self, name: impl Into<String>) -> Self {
        match self {
            Self::Validation { message, field, .. } => Self::Validation {
                stack: name.into(),
                message,
                field,
            },
            other => other,
        }
    }

    /// Create a synthesis error for a construct path
    pub fn synthesis(construct: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Synthesis {
            construct: construct.into(),
            message: msg.into(),
        }
    }

    /// Create a graph error with the given message
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
            resource: None,
        }
    }

    /// Create a graph error naming the offending resource
    pub fn graph_for(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
            resource: Some(resource.into()),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            format: None,
        }
    }

    /// Create a serialization error for a specific format
    pub fn serialization_for_format(format: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            format: Some(format.into()),
        }
    }

    /// Get the stack name if this error is associated with a specific stack
    pub fn stack(&self) -> Option<&str> {
        match self {
            Error::Validation { stack, .. } => Some(stack),
            _ => None,
        }
    }

    /// Get the offending field path of a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Get the construct path or resource id this error was raised for
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Synthesis { construct, .. } => Some(construct),
            Error::Graph { resource, .. } => resource.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_for_format("json", err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization_for_format("yaml", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Story: validation catches a misconfigured stack before anything is synthesized
    #[test]
    fn story_validation_names_stack_and_field() {
        let err = Error::validation_for_field("network.cidr", "not a valid IPv4 CIDR")
            .in_stack("NexusFargateStack");

        assert!(err.to_string().contains("validation error for NexusFargateStack"));
        assert!(err.to_string().contains("not a valid IPv4 CIDR"));
        assert_eq!(err.stack(), Some("NexusFargateStack"));
        assert_eq!(err.field(), Some("network.cidr"));
    }

    #[test]
    fn validation_without_stack_uses_unknown_context() {
        let err = Error::validation("bad");
        assert_eq!(err.stack(), Some(UNKNOWN_CONTEXT));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn in_stack_leaves_other_variants_alone() {
        let err = Error::graph("cycle").in_stack("ignored");
        assert!(matches!(err, Error::Graph { .. }));
        assert_eq!(err.stack(), None);
    }

    /// Story: synthesis errors point at the construct that failed to expand
    #[test]
    fn story_synthesis_error_carries_construct_path() {
        let err = Error::synthesis("NexusFargateStack/EFS", "no isolated subnets");
        assert!(err.to_string().contains("[NexusFargateStack/EFS]"));
        assert_eq!(err.context(), Some("NexusFargateStack/EFS"));
    }

    #[test]
    fn graph_error_names_resource() {
        let err = Error::graph_for("ServiceD69D759B", "depends on unknown resource Missing");
        assert!(err.to_string().contains("resource graph error"));
        assert_eq!(err.context(), Some("ServiceD69D759B"));
        assert_eq!(Error::graph("x").context(), None);
    }

    #[test]
    fn serde_errors_convert_with_format() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        match Error::from(json_err) {
            Error::Serialization { format, .. } => assert_eq!(format.as_deref(), Some("json")),
            other => panic!("expected Serialization, got {other:?}"),
        }

        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        match Error::from(yaml_err) {
            Error::Serialization { format, .. } => assert_eq!(format.as_deref(), Some("yaml")),
            other => panic!("expected Serialization, got {other:?}"),
        }
    }
}
