//! Release plan - publish ordering for the package set
//!
//! The declared dependency edges form a directed graph; the publish
//! order is a topological sort of that graph, so every package is
//! published after all of its internal dependencies. Cycles and
//! references to undeclared packages fail fast, before any prompt or
//! mutation.

use crate::core::config::PackageDefinition;
use crate::core::error::ReleaseError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Validated publish plan for one release run
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    order: Vec<PackageDefinition>,
}

impl ReleasePlan {
    /// Build the plan from the declared package set
    pub fn build(packages: &[PackageDefinition]) -> Result<Self, ReleaseError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

        for (position, package) in packages.iter().enumerate() {
            indices.insert(package.name.as_str(), graph.add_node(position));
        }

        for package in packages {
            let dependent = indices[package.name.as_str()];
            for dependency in &package.dependencies {
                let Some(&depended) = indices.get(dependency.as_str()) else {
                    return Err(ReleaseError::UnknownDependency {
                        package: package.name.clone(),
                        dependency: dependency.clone(),
                    });
                };
                // Edge dependency -> dependent, so a topological order
                // publishes dependencies first
                graph.add_edge(depended, dependent, ());
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| ReleaseError::DependencyCycle {
            cycle: packages[graph[cycle.node_id()]].name.clone(),
        })?;

        Ok(Self {
            order: sorted
                .into_iter()
                .map(|index| packages[graph[index]].clone())
                .collect(),
        })
    }

    /// Packages in publish order, dependencies before dependents
    pub fn publish_order(&self) -> &[PackageDefinition] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
