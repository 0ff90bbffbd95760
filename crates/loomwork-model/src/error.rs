use thiserror::Error;

/// Errors raised while validating a raw workflow definition into a locked,
/// executable `Workflow`.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("duplicate node id: {0}")]
  DuplicateNodeId(String),

  #[error("workflow must have exactly one trigger_start node, found {0}")]
  TriggerCount(usize),

  #[error("conditional_split node '{node_id}' has two outgoing edges on handle '{handle}'")]
  DuplicateHandle { node_id: String, handle: String },

  #[error("node '{node_id}' has an edge with handle '{handle}', but node type {node_type} does not support branching")]
  UnexpectedHandle {
    node_id: String,
    node_type: String,
    handle: String,
  },
}
