use loomwork_store::{Enrollment, Execution, ExecutionStore};

use crate::error::SchedulerError;

/// Result of [`enroll_contact`].
#[derive(Debug)]
pub enum EnrollOutcome {
  /// `skip_duplicates` was set and the contact already has an active
  /// enrollment in this workflow.
  Skipped,
  Enrolled {
    enrollment: Enrollment,
    execution: Execution,
  },
}

/// The primitive every trigger source funnels into:
///
/// 1. If `skip_duplicates` and an active enrollment exists, skip.
/// 2. Load the workflow; require a `trigger_start` node.
/// 3. Create an `active` enrollment plus a `waiting` execution at the
///    trigger node with `next_run_at = now`.
pub async fn enroll_contact(
  store: &dyn ExecutionStore,
  workflow_id: &str,
  contact_id: &str,
  skip_duplicates: bool,
  max_attempts: i64,
) -> Result<EnrollOutcome, SchedulerError> {
  if skip_duplicates
    && store
      .get_active_enrollment(workflow_id, contact_id)
      .await?
      .is_some()
  {
    return Ok(EnrollOutcome::Skipped);
  }

  let workflow = store.get_workflow(workflow_id).await?;
  let trigger = workflow
    .trigger_node()
    .ok_or_else(|| SchedulerError::NoTriggerNode(workflow_id.to_string()))?;

  let (enrollment, execution) = store
    .create_enrollment(workflow_id, contact_id, &trigger.node_id, max_attempts)
    .await?;

  Ok(EnrollOutcome::Enrolled { enrollment, execution })
}
