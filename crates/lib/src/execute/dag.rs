//! Whole-registry dependency graph.
//!
//! The resolver only walks what a request reaches. [`TargetGraph`] looks at
//! every registered target at once: it reports every unknown dependency name
//! in a single error, finds cycles anywhere in the registry and yields a
//! deterministic topological order plus execution waves.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::target::TargetRegistry;

use super::resolver::DependencyResolver;
use super::types::ExecuteError;

/// Graph of every registered target, with edges from dependency to dependent.
pub struct TargetGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl TargetGraph {
  /// Build and validate the graph of a registry.
  ///
  /// # Errors
  ///
  /// - `TargetNotFound` listing every dependency name that is not registered.
  /// - `CyclicDependency` if any cycle exists.
  pub fn from_registry(registry: &TargetRegistry) -> Result<Self, ExecuteError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for target in registry.iter() {
      let idx = graph.add_node(target.name().to_string());
      nodes.insert(target.name().to_string(), idx);
    }

    let mut missing: Vec<String> = Vec::new();
    for target in registry.iter() {
      let to = nodes[target.name()];
      for dep in target.dependencies() {
        match nodes.get(dep) {
          Some(&from) => {
            graph.add_edge(from, to, ());
          }
          None => {
            if !missing.contains(dep) {
              missing.push(dep.clone());
            }
          }
        }
      }
    }

    if !missing.is_empty() {
      return Err(ExecuteError::TargetNotFound { names: missing });
    }

    let dag = Self { graph, nodes };
    dag.verify_acyclic(registry)?;
    Ok(dag)
  }

  /// Verify that the graph is acyclic.
  ///
  /// On a cycle, the resolver is run from the offending node so the error
  /// carries the same entry point and path a run would report.
  fn verify_acyclic(&self, registry: &TargetRegistry) -> Result<(), ExecuteError> {
    match toposort(&self.graph, None) {
      Ok(_) => Ok(()),
      Err(cycle) => {
        let name = &self.graph[cycle.node_id()];
        match DependencyResolver::new(registry).resolve(name) {
          Err(err) => Err(err),
          Ok(_) => Err(ExecuteError::CyclicDependency {
            target: name.clone(),
            path: vec![name.clone()],
          }),
        }
      }
    }
  }

  /// Every target name in an order where dependencies come first.
  ///
  /// Ties are broken by registration order.
  pub fn topological_order(&self) -> Vec<String> {
    self.waves().into_iter().flatten().collect()
  }

  /// Group targets into waves: each wave only depends on earlier waves.
  pub fn waves(&self) -> Vec<Vec<String>> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();

    let mut waves = Vec::new();
    let mut remaining: Vec<NodeIndex> = self.graph.node_indices().collect();

    while !remaining.is_empty() {
      let (ready, rest): (Vec<NodeIndex>, Vec<NodeIndex>) = remaining.into_iter().partition(|idx| in_degree[idx] == 0);

      // Only reachable on a cycle, which from_registry rejects
      if ready.is_empty() {
        break;
      }

      for &idx in &ready {
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      waves.push(ready.into_iter().map(|idx| self.graph[idx].clone()).collect());
      remaining = rest;
    }

    waves
  }

  /// Direct dependencies of a target.
  pub fn dependencies(&self, name: &str) -> Vec<String> {
    self.neighbors(name, Direction::Incoming)
  }

  /// Targets that directly depend on `name`.
  pub fn dependents(&self, name: &str) -> Vec<String> {
    self.neighbors(name, Direction::Outgoing)
  }

  fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };
    let mut names: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
    names.sort();
    names.into_iter().map(|n| self.graph[n].clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }
}
