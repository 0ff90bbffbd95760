/// Errors a processor throws rather than returns.
///
/// Most of these are the *recoverable* tier: the Executor Core catches them,
/// logs a failure, and retries the whole batch at the execution level. A
/// processor that can express a failure as data instead — e.g. a provider
/// declining to send — should return it on [`crate::StepResult::error`],
/// not throw.
///
/// A handful of variants are structural rather than transient (an
/// unconfigured provider, a missing template, a circular sub-workflow
/// reference) and retrying them at the usual cadence would just waste
/// `max_attempts` batches re-discovering the same defect. [`ProcessorError::is_fatal`]
/// marks those so the Executor Core can fail the execution immediately
/// instead, mirroring the external-facing `PROVIDER_NOT_CONFIGURED` /
/// `CIRCULAR_SUB_WORKFLOW` error codes.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
  #[error("no processor registered for node type '{0}'")]
  UnknownNodeType(String),

  #[error("provider call failed: {0}")]
  ProviderCall(#[from] anyhow::Error),

  #[error("provider not configured: {0}")]
  ProviderNotConfigured(String),

  #[error("template not found: {0}")]
  MissingTemplate(String),

  #[error("sub-workflow invocation failed: {0}")]
  SubWorkflowFailed(String),

  #[error("update_status failed: {0}")]
  UpdateStatusFailed(String),

  #[error("store error: {0}")]
  Store(#[from] loomwork_store::StoreError),
}

impl ProcessorError {
  /// Structural failures that should not be retried at the usual cadence —
  /// the Executor Core fails the execution on the first occurrence.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      ProcessorError::UnknownNodeType(_)
        | ProcessorError::ProviderNotConfigured(_)
        | ProcessorError::MissingTemplate(_)
        | ProcessorError::SubWorkflowFailed(_)
        | ProcessorError::UpdateStatusFailed(_)
    )
  }
}
