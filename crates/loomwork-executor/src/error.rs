/// Errors returned by [`crate::ExecutorCore::run`] itself (store failures
/// that prevent even attempting a batch) plus the named fatal-failure kinds:
/// `NODE_NOT_FOUND`, `UNKNOWN_NODE_TYPE`, `WORKFLOW_DISABLED`,
/// `CYCLE_LIMIT_EXCEEDED`. The
/// latter four are recorded as the execution's `error_message` via
/// `fail_execution` rather than returned as `Err` — the walk loop's own
/// contract is "return `Ok(ExecutionResult)` summarizing the batch", so
/// these variants exist to give that failure text one canonical source
/// rather than ad hoc format strings scattered through the walk loop.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
  #[error("store error: {0}")]
  Store(#[from] loomwork_store::StoreError),

  #[error("current node not found: {0}")]
  NodeNotFound(String),

  /// Surfaced via [`loomwork_processors::ProcessorError::UnknownNodeType`]
  /// in practice (the registry dispatch is where the unknown type is
  /// actually discovered); kept here for error-code parity.
  #[error("no processor for node type '{0}'")]
  UnknownNodeType(String),

  #[error("workflow is disabled")]
  WorkflowDisabled,

  #[error("too many nodes processed (possible infinite loop)")]
  CycleLimitExceeded,
}
