//! Raw, as-authored workflow shape — what the visual graph editor (out of
//! scope, §1) produces and what an "editor save" whole-graph replace accepts.
//! Validating this into a [`crate::Workflow`] is the "lock" step.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  #[serde(default)]
  pub nodes: Vec<Node>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

fn default_enabled() -> bool {
  true
}
