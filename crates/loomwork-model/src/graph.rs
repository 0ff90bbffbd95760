use std::collections::HashMap;

use crate::edge::Edge;
use crate::enums::EdgeHandle;
use crate::node::Node;

/// Adjacency over a validated workflow graph, keyed by `(source_id, handle)`
/// for O(1) successor lookup. Most node types
/// have a single unconditional outgoing edge (`handle = None`);
/// `conditional_split` nodes have up to two, keyed by `yes`/`no`.
#[derive(Debug, Clone)]
pub struct Graph {
  successors: HashMap<(String, Option<EdgeHandle>), String>,
  /// Nodes with no incoming edges (should be exactly the trigger_start node).
  entry_points: Vec<String>,
}

impl Graph {
  pub fn new(nodes: &HashMap<String, Node>, edges: &[Edge]) -> Self {
    let mut successors = HashMap::new();
    let mut has_incoming: HashMap<&str, bool> = nodes.keys().map(|id| (id.as_str(), false)).collect();

    for edge in edges {
      successors.insert(
        (edge.source_node_id.clone(), edge.source_handle),
        edge.target_node_id.clone(),
      );
      has_incoming.insert(edge.target_node_id.as_str(), true);
    }

    let entry_points = nodes
      .keys()
      .filter(|id| !has_incoming.get(id.as_str()).copied().unwrap_or(false))
      .cloned()
      .collect();

    Self {
      successors,
      entry_points,
    }
  }

  /// Nodes with no incoming edges.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// The successor of `node_id` reached via `handle` (`None` for
  /// unconditional edges). `None` result means the node is terminal — for
  /// `conditional_split` this means the chosen branch completes the workflow.
  pub fn successor(&self, node_id: &str, handle: Option<EdgeHandle>) -> Option<&str> {
    self
      .successors
      .get(&(node_id.to_string(), handle))
      .map(|s| s.as_str())
  }
}
