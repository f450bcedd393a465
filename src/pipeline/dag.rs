// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! DAG (Directed Acyclic Graph) builder for step dependencies
//!
//! Builds and validates the dependency graph of a pipeline, detects cycles,
//! and fixes the execution order.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::errors::LlmflowError;
use crate::pipeline::PipelineSpec;

/// Builder for step dependency DAGs
pub struct DagBuilder {
    graph: DiGraph<usize, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    index_to_name: HashMap<NodeIndex, String>,
}

impl DagBuilder {
    /// Create an empty DAG builder
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_index: HashMap::new(),
            index_to_name: HashMap::new(),
        }
    }

    /// Build a DAG from a pipeline topology
    pub fn build(spec: &PipelineSpec) -> Result<Self, LlmflowError> {
        let mut builder = Self::new();

        for (idx, step) in spec.steps.iter().enumerate() {
            let node = builder.graph.add_node(idx);
            builder.name_to_index.insert(step.name.clone(), node);
            builder.index_to_name.insert(node, step.name.clone());
        }

        for step in &spec.steps {
            let step_node = builder.name_to_index[&step.name];

            for dep_name in &step.depends_on {
                let dep_node = builder.name_to_index.get(dep_name).ok_or_else(|| {
                    LlmflowError::UnknownDependency {
                        step: step.name.clone(),
                        dependency: dep_name.clone(),
                    }
                })?;

                if !builder.graph.contains_edge(*dep_node, step_node) {
                    builder.graph.add_edge(*dep_node, step_node, ());
                }
            }
        }

        builder.validate_acyclic()?;

        Ok(builder)
    }

    fn validate_acyclic(&self) -> Result<(), LlmflowError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(_) => Err(LlmflowError::CircularDependency {
                steps: self.cycle_members(),
            }),
        }
    }

    /// Names of every step that sits on a cycle, in declaration order
    fn cycle_members(&self) -> Vec<String> {
        let mut members: Vec<usize> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&n| self.graph.contains_edge(n, n))
            })
            .flatten()
            .map(|n| self.graph[n])
            .collect();
        members.sort_unstable();

        members
            .into_iter()
            .filter_map(|idx| {
                self.graph
                    .node_indices()
                    .find(|&n| self.graph[n] == idx)
                    .map(|n| self.index_to_name[&n].clone())
            })
            .collect()
    }

    /// Topologically sorted step indices
    ///
    /// Among steps that are ready at the same time the one declared first
    /// runs first, so a linear chain runs exactly in declaration order.
    pub fn topological_order(&self) -> Result<Vec<usize>, LlmflowError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors_directed(n, Direction::Incoming).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<(usize, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&n, _)| Reverse((self.graph[n], n)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((idx, node))) = ready.pop() {
            order.push(idx);
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(deg) = in_degree.get_mut(&next) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse((self.graph[next], next)));
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(LlmflowError::CircularDependency {
                steps: self.cycle_members(),
            });
        }

        Ok(order)
    }

    /// Topologically sorted step names
    pub fn topological_order_names(&self) -> Result<Vec<String>, LlmflowError> {
        let order = self.topological_order()?;
        Ok(order
            .into_iter()
            .filter_map(|idx| {
                self.graph
                    .node_indices()
                    .find(|&n| self.graph[n] == idx)
                    .map(|n| self.index_to_name[&n].clone())
            })
            .collect())
    }

    /// Steps that must run before `step_name`, in declaration order
    pub fn dependencies(&self, step_name: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(step_name)?;
        Some(self.sorted_names(self.graph.neighbors_directed(*node, Direction::Incoming)))
    }

    /// Steps that consume the output of `step_name`, in declaration order
    pub fn dependents(&self, step_name: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(step_name)?;
        Some(self.sorted_names(self.graph.neighbors_directed(*node, Direction::Outgoing)))
    }

    fn sorted_names(&self, nodes: impl Iterator<Item = NodeIndex>) -> Vec<String> {
        let mut nodes: Vec<NodeIndex> = nodes.collect();
        nodes.sort_by_key(|&n| self.graph[n]);
        nodes
            .into_iter()
            .map(|n| self.index_to_name[&n].clone())
            .collect()
    }

    /// Check if step A depends (directly or transitively) on step B
    pub fn depends_on(&self, step_a: &str, step_b: &str) -> bool {
        let Some(node_a) = self.name_to_index.get(step_a) else {
            return false;
        };
        let Some(node_b) = self.name_to_index.get(step_b) else {
            return false;
        };

        petgraph::algo::has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    fn edges_in_order(&self) -> Vec<(String, String)> {
        let mut edges: Vec<(usize, usize, NodeIndex, NodeIndex)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(from, to)| (self.graph[to], self.graph[from], from, to))
            .collect();
        edges.sort_unstable();

        edges
            .into_iter()
            .map(|(_, _, from, to)| {
                (
                    self.index_to_name[&from].clone(),
                    self.index_to_name[&to].clone(),
                )
            })
            .collect()
    }

    fn names_in_order(&self) -> Vec<&String> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by_key(|&n| self.graph[n]);
        nodes.iter().map(|n| &self.index_to_name[n]).collect()
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for name in self.names_in_order() {
            out.push_str(&format!("    {}[{}]\n", name, name));
        }

        for (from, to) in self.edges_in_order() {
            out.push_str(&format!("    {} --> {}\n", from, to));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edges_in_order() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        for name in self.names_in_order() {
            let node = self.name_to_index[name];
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", name));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self, spec: &PipelineSpec) -> Result<String, LlmflowError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, idx) in order.iter().enumerate() {
            let step = &spec.steps[*idx];
            let deps = self.dependencies(&step.name).unwrap_or_default();

            out.push_str(&format!("{}. {}", i + 1, step.name));

            if let Some(ref description) = step.description {
                out.push_str(&format!(" - {}", description));
            }

            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}
