use serde::{Deserialize, Serialize};

use crate::enums::EdgeHandle;

/// A directed connection between two nodes in the same workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
  pub source_node_id: String,
  pub target_node_id: String,
  /// Only meaningful for edges leaving a `conditional_split` node.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_handle: Option<EdgeHandle>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}
