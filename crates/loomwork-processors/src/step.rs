use chrono::{DateTime, Utc};

/// The transition record a processor returns; the Executor Core persists it.
/// Processors must not persist enrollment/execution state directly.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
  /// Node to advance to. `None` means this path completes the workflow
  /// unless `stop_enrollment` is also set.
  pub next_node_id: Option<String>,
  /// When set, the executor yields for this tick instead of looping
  /// immediately (e.g. `time_delay`).
  pub next_run_at: Option<DateTime<Utc>>,
  /// Shallow-merged into the execution's `execution_data` map.
  pub execution_data: Option<serde_json::Value>,
  /// Recorded on the execution log entry for this step.
  pub output_data: Option<serde_json::Value>,
  /// A soft, observational failure — logged as `failed` but the execution
  /// still advances via `next_node_id`.
  pub error: Option<String>,
  /// Stop-on-reply's termination signal.
  pub stop_enrollment: bool,
  pub stop_reason: Option<String>,
}

impl StepResult {
  pub fn advance(next_node_id: Option<String>) -> Self {
    Self {
      next_node_id,
      ..Default::default()
    }
  }

  pub fn delay(next_node_id: Option<String>, next_run_at: DateTime<Utc>) -> Self {
    Self {
      next_node_id,
      next_run_at: Some(next_run_at),
      ..Default::default()
    }
  }

  pub fn stop(reason: impl Into<String>) -> Self {
    Self {
      stop_enrollment: true,
      stop_reason: Some(reason.into()),
      ..Default::default()
    }
  }

  pub fn with_execution_data(mut self, data: serde_json::Value) -> Self {
    self.execution_data = Some(data);
    self
  }

  pub fn with_output_data(mut self, data: serde_json::Value) -> Self {
    self.output_data = Some(data);
    self
  }

  pub fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }
}
