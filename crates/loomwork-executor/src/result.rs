/// Summary of what happened to one execution after one `ExecutorCore::run`
/// call.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
  /// Enrollment was not `active`; nothing was done.
  NoWork,
  /// The execution yielded mid-graph: a `time_delay`, a reschedule after a
  /// recoverable error, or a lease handed back for next tick.
  Waiting,
  /// Reached a `return_to_parent` or a dead end (`nextNodeId = null`).
  Completed,
  /// `stop_on_reply` fired.
  Stopped { reason: String },
  /// Structural failure, or attempts exhausted.
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
  pub execution_id: String,
  pub nodes_processed: u32,
  pub outcome: BatchOutcome,
}
