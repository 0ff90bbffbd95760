use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::def::WorkflowDef;
use crate::edge::Edge;
use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node::{Node, NodeKind};

/// A validated, locked workflow graph ready for execution.
///
/// Disabled workflows (`enabled = false`) do not accept new enrollments and
/// active executions refuse to advance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  pub description: Option<String>,
  pub enabled: bool,
  pub nodes: HashMap<String, Node>,
  pub edges: Vec<Edge>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Workflow {
  /// Validate a raw definition (as produced by an editor save) into a locked
  /// workflow. The caller is expected to have already performed the
  /// whole-graph replace transactionally; this function only validates
  /// in-memory invariants.
  pub fn from_def(
    def: WorkflowDef,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
  ) -> Result<Self, WorkflowError> {
    let mut nodes = HashMap::with_capacity(def.nodes.len());
    let mut trigger_count = 0usize;

    for node in def.nodes {
      if nodes.contains_key(&node.node_id) {
        return Err(WorkflowError::DuplicateNodeId(node.node_id));
      }
      if matches!(node.kind, NodeKind::TriggerStart { .. }) {
        trigger_count += 1;
      }
      nodes.insert(node.node_id.clone(), node);
    }

    if trigger_count != 1 {
      return Err(WorkflowError::TriggerCount(trigger_count));
    }

    for edge in &def.edges {
      let source = nodes
        .get(&edge.source_node_id)
        .ok_or_else(|| WorkflowError::InvalidEdge {
          from: edge.source_node_id.clone(),
          to: edge.target_node_id.clone(),
        })?;
      if !nodes.contains_key(&edge.target_node_id) {
        return Err(WorkflowError::InvalidEdge {
          from: edge.source_node_id.clone(),
          to: edge.target_node_id.clone(),
        });
      }
      if let Some(handle) = edge.source_handle {
        if !source.kind.supports_handles() {
          return Err(WorkflowError::UnexpectedHandle {
            node_id: edge.source_node_id.clone(),
            node_type: source.kind.type_name().to_string(),
            handle: handle.as_str().to_string(),
          });
        }
      }
    }

    let mut seen_handles: HashSet<(String, Option<String>)> = HashSet::new();
    for edge in &def.edges {
      let key = (
        edge.source_node_id.clone(),
        edge.source_handle.map(|h| h.as_str().to_string()),
      );
      if !seen_handles.insert(key) {
        return Err(WorkflowError::DuplicateHandle {
          node_id: edge.source_node_id.clone(),
          handle: edge
            .source_handle
            .map(|h| h.as_str().to_string())
            .unwrap_or_else(|| "<none>".to_string()),
        });
      }
    }

    Ok(Workflow {
      workflow_id: def.workflow_id,
      name: def.name,
      description: def.description,
      enabled: def.enabled,
      nodes,
      edges: def.edges,
      created_at,
      updated_at,
    })
  }

  /// Build the adjacency structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.edges)
  }

  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.get(node_id)
  }

  /// Find the workflow's single `trigger_start` node.
  pub fn trigger_node(&self) -> Option<&Node> {
    self
      .nodes
      .values()
      .find(|n| matches!(n.kind, NodeKind::TriggerStart { .. }))
  }
}
