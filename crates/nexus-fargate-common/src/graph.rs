//! Resource dependency graph
//!
//! Built from a synthesized [`Template`]. Edges come from explicit
//! `DependsOn` entries and from `Ref`/`Fn::GetAtt` occurrences in resource
//! properties. The graph answers neighbourhood queries and produces a
//! deterministic leaves-first ordering for display and apply planning.

use std::collections::{BTreeMap, BTreeSet};

use crate::template::{referenced_ids, Template};
use crate::{Error, Result};

/// A node in the resource graph
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceNode {
    /// Logical id
    pub logical_id: String,
    /// Provider resource type
    pub type_: String,
    /// Logical ids this resource depends on
    pub dependencies: BTreeSet<String>,
}

/// Dependency graph over the resources of one template
#[derive(Clone, Debug, Default)]
pub struct ResourceGraph {
    nodes: BTreeMap<String, ResourceNode>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl ResourceGraph {
    /// Build the graph for a template
    ///
    /// Fails if a resource or output references a logical id that is not in
    /// the template.
    pub fn from_template(template: &Template) -> Result<Self> {
        let mut graph = Self::default();

        for (id, resource) in &template.resources {
            let mut refs = Vec::new();
            referenced_ids(&resource.properties, &mut refs);
            refs.extend(resource.depends_on.iter().cloned());

            let dependencies: BTreeSet<String> = refs.into_iter().filter(|r| r != id).collect();
            for dep in &dependencies {
                if !template.resources.contains_key(dep) {
                    return Err(Error::graph_for(
                        id,
                        format!("depends on unknown resource {dep}"),
                    ));
                }
                graph
                    .dependents
                    .entry(dep.clone())
                    .or_default()
                    .insert(id.clone());
            }

            graph.nodes.insert(
                id.clone(),
                ResourceNode {
                    logical_id: id.clone(),
                    type_: resource.type_.clone(),
                    dependencies,
                },
            );
        }

        for (name, output) in &template.outputs {
            let value = serde_json::to_value(&output.value)?;
            let mut refs = Vec::new();
            referenced_ids(&value, &mut refs);
            if let Some(missing) = refs.iter().find(|r| !template.resources.contains_key(*r)) {
                return Err(Error::graph_for(
                    name,
                    format!("output references unknown resource {missing}"),
                ));
            }
        }

        Ok(graph)
    }

    /// Number of resources in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no resources
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by logical id
    pub fn get(&self, logical_id: &str) -> Option<&ResourceNode> {
        self.nodes.get(logical_id)
    }

    /// Direct dependencies of a resource
    pub fn dependencies_of(&self, logical_id: &str) -> Vec<&str> {
        self.nodes
            .get(logical_id)
            .map(|n| n.dependencies.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Resources that directly depend on the given one
    pub fn dependents_of(&self, logical_id: &str) -> Vec<&str> {
        self.dependents
            .get(logical_id)
            .map(|d| d.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether `from` depends on `to`, directly or transitively
    pub fn depends_transitively(&self, from: &str, to: &str) -> bool {
        let mut stack: Vec<&str> = self.dependencies_of(from);
        let mut seen = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.dependencies_of(id));
            }
        }
        false
    }

    /// Logical ids ordered so every resource follows its dependencies
    ///
    /// Ties are broken by logical id so the order is deterministic. Fails
    /// if the graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<&ResourceNode>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(id, n)| (id.as_str(), n.dependencies.len()))
            .collect();
        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop_first() {
            remaining.remove(id);
            if let Some(node) = self.nodes.get(id) {
                order.push(node);
            }
            for dependent in self.dependents_of(id) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if let Some((&stuck, _)) = remaining.iter().next() {
            return Err(Error::graph_for(
                stuck,
                format!("dependency cycle among {} resources", remaining.len()),
            ));
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Expr, Output, Resource};
    use serde_json::json;

    fn resource(type_: &str, props: serde_json::Value) -> Resource {
        Resource::new(type_, &props).unwrap()
    }

    fn sample_template() -> Template {
        let mut t = Template::new();
        t.add_resource("Vpc", resource("AWS::EC2::VPC", json!({ "CidrBlock": "10.0.0.0/16" })))
            .unwrap();
        t.add_resource(
            "Sg",
            resource("AWS::EC2::SecurityGroup", json!({ "VpcId": { "Ref": "Vpc" } })),
        )
        .unwrap();
        t.add_resource(
            "Alb",
            resource(
                "AWS::ElasticLoadBalancingV2::LoadBalancer",
                json!({ "SecurityGroups": [{ "Fn::GetAtt": ["Sg", "GroupId"] }] }),
            ),
        )
        .unwrap();
        t.add_resource(
            "Service",
            resource("AWS::ECS::Service", json!({})).depends_on("Alb"),
        )
        .unwrap();
        t.add_output(
            "AlbDnsName",
            Output {
                value: Expr::get_att("Alb", "DNSName"),
                description: None,
            },
        )
        .unwrap();
        t
    }

    #[test]
    fn edges_come_from_refs_getatts_and_depends_on() {
        let graph = ResourceGraph::from_template(&sample_template()).unwrap();
        assert_eq!(graph.dependencies_of("Sg"), vec!["Vpc"]);
        assert_eq!(graph.dependencies_of("Alb"), vec!["Sg"]);
        assert_eq!(graph.dependencies_of("Service"), vec!["Alb"]);
        assert_eq!(graph.dependents_of("Vpc"), vec!["Sg"]);
        assert!(graph.depends_transitively("Service", "Vpc"));
        assert!(!graph.depends_transitively("Vpc", "Service"));
    }

    #[test]
    fn topological_order_puts_leaves_first() {
        let graph = ResourceGraph::from_template(&sample_template()).unwrap();
        let order: Vec<&str> = graph
            .topological_order()
            .unwrap()
            .into_iter()
            .map(|n| n.logical_id.as_str())
            .collect();
        assert_eq!(order, vec!["Vpc", "Sg", "Alb", "Service"]);
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let mut t = Template::new();
        t.add_resource(
            "Sg",
            resource("AWS::EC2::SecurityGroup", json!({ "VpcId": { "Ref": "Missing" } })),
        )
        .unwrap();
        let err = ResourceGraph::from_template(&t).unwrap_err();
        assert_eq!(err.context(), Some("Sg"));
    }

    #[test]
    fn output_with_dangling_reference_is_rejected() {
        let mut t = Template::new();
        t.add_output(
            "Dns",
            Output {
                value: Expr::get_att("Missing", "DNSName"),
                description: None,
            },
        )
        .unwrap();
        assert!(ResourceGraph::from_template(&t).is_err());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut t = Template::new();
        t.add_resource("A", resource("X::A", json!({})).depends_on("B"))
            .unwrap();
        t.add_resource("B", resource("X::B", json!({ "P": { "Ref": "A" } })))
            .unwrap();
        let graph = ResourceGraph::from_template(&t).unwrap();
        let err = graph.topological_order().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn self_reference_is_not_an_edge() {
        let mut t = Template::new();
        t.add_resource("A", resource("X::A", json!({ "P": { "Ref": "A" } })))
            .unwrap();
        let graph = ResourceGraph::from_template(&t).unwrap();
        assert!(graph.dependencies_of("A").is_empty());
        assert_eq!(graph.topological_order().unwrap().len(), 1);
    }

    #[test]
    fn empty_template_gives_empty_graph() {
        let graph = ResourceGraph::from_template(&Template::new()).unwrap();
        assert!(graph.is_empty());
        assert!(graph.topological_order().unwrap().is_empty());
    }
}
