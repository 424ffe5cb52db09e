//! CloudFormation template model
//!
//! The synthesized artifact of a stack. Resource properties are kept as
//! `serde_json::Value` so typed property structs from any construct can be
//! embedded; references between resources are written with [`Expr`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Template format version emitted in every non-empty template
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Template-level expression: a literal or an intrinsic function
///
/// Serializes to the provider's intrinsic syntax, e.g. `{"Ref": "VPCB9E5F0B4"}`
/// or `{"Fn::GetAtt": ["ALBAEE750D2", "DNSName"]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    /// Plain string literal
    Literal(String),
    /// `Ref` to another resource's primary identifier (or a pseudo parameter)
    Ref {
        /// Logical id or pseudo parameter name
        #[serde(rename = "Ref")]
        target: String,
    },
    /// `Fn::GetAtt` of a resource attribute
    GetAtt {
        /// (logical id, attribute name)
        #[serde(rename = "Fn::GetAtt")]
        target: (String, String),
    },
    /// `Fn::Select` of an index from a list expression
    Select {
        /// (index, list)
        #[serde(rename = "Fn::Select")]
        args: (u32, Box<Expr>),
    },
    /// `Fn::GetAZs` for a region (empty string means the stack's region)
    GetAzs {
        /// Region name
        #[serde(rename = "Fn::GetAZs")]
        region: String,
    },
    /// `Fn::Join` of expressions with a delimiter
    Join {
        /// (delimiter, parts)
        #[serde(rename = "Fn::Join")]
        args: (String, Vec<Expr>),
    },
}

impl Expr {
    /// Literal string
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// `Ref` to a logical id
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref {
            target: logical_id.into(),
        }
    }

    /// `Fn::GetAtt` of a logical id's attribute
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            target: (logical_id.into(), attribute.into()),
        }
    }

    /// The `index`-th availability zone of the stack's region
    pub fn availability_zone(index: u32) -> Self {
        Self::Select {
            args: (
                index,
                Box::new(Self::GetAzs {
                    region: String::new(),
                }),
            ),
        }
    }

    /// `Fn::Join` of parts
    pub fn join(delimiter: impl Into<String>, parts: Vec<Expr>) -> Self {
        Self::Join {
            args: (delimiter.into(), parts),
        }
    }

    /// `Ref` to the `AWS::StackName` pseudo parameter
    pub fn stack_name() -> Self {
        Self::reference("AWS::StackName")
    }
}

/// What happens to a resource when it leaves the stack
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Delete the physical resource
    Delete,
    /// Keep the physical resource orphaned
    Retain,
    /// Snapshot before deleting (databases, volumes)
    Snapshot,
}

/// One resource entry in a template
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    /// Provider resource type, e.g. `AWS::EC2::VPC`
    #[serde(rename = "Type")]
    pub type_: String,
    /// Resource properties
    #[serde(default = "empty_object", skip_serializing_if = "is_empty_object")]
    pub properties: Value,
    /// Explicit ordering dependencies (logical ids)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Policy applied when the resource is removed from the stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    /// Policy applied when an update replaces the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn is_empty_object(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl Resource {
    /// Create a resource of the given type from serializable properties
    pub fn new<P: Serialize>(type_: impl Into<String>, properties: &P) -> Result<Self> {
        let type_ = type_.into();
        let properties = serde_json::to_value(properties)
            .map_err(|e| Error::serialization_for_format("json", format!("{type_}: {e}")))?;
        Ok(Self {
            type_,
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        })
    }

    /// Add an explicit dependency
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let id = logical_id.into();
        if !self.depends_on.contains(&id) {
            self.depends_on.push(id);
        }
        self
    }

    /// Apply a removal policy to both deletion and replacement
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    /// Look up a top-level property
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A stack output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    /// Output value
    pub value: Expr,
    /// Optional human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A synthesized template
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    /// Template format version (absent for an empty template)
    #[serde(
        rename = "AWSTemplateFormatVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub format_version: Option<String>,
    /// Template description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resources keyed by logical id
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
    /// Outputs keyed by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    /// Create an empty template
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource; logical ids must be unique
    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: Resource) -> Result<()> {
        let id = logical_id.into();
        if self.resources.contains_key(&id) {
            return Err(Error::graph_for(&id, "duplicate logical id"));
        }
        if self.format_version.is_none() {
            self.format_version = Some(TEMPLATE_FORMAT_VERSION.to_string());
        }
        self.resources.insert(id, resource);
        Ok(())
    }

    /// Add an output; output names must be unique
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(Error::graph_for(&name, "duplicate output name"));
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    /// All resources of a given provider type, in logical id order
    pub fn resources_of_type<'a>(
        &'a self,
        type_: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.type_ == type_)
    }

    /// Number of resources of a given provider type
    pub fn count_of_type(&self, type_: &str) -> usize {
        self.resources_of_type(type_).count()
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Collect every logical id referenced through `Ref` or `Fn::GetAtt` in a value
///
/// Pseudo parameters (`AWS::*`) are skipped.
pub fn referenced_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(target)) = map.get("Ref") {
                    if !target.starts_with("AWS::") {
                        out.push(target.clone());
                    }
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(target)) = args.first() {
                        out.push(target.clone());
                    }
                    return;
                }
            }
            for v in map.values() {
                referenced_ids(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                referenced_ids(v, out);
            }
        }
        _ => {}
    }
}
