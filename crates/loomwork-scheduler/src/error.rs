/// Errors from the enrollment primitives and the tick loop itself — distinct
/// from what a single execution batch reports (see [`loomwork_executor::ExecutionResult`]).
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
  #[error("store error: {0}")]
  Store(#[from] loomwork_store::StoreError),

  #[error("workflow '{0}' has no trigger_start node")]
  NoTriggerNode(String),
}
