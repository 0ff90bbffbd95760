//! Trigger-source fan-out: a contact-creation event enumerates
//! all enabled workflows whose `trigger_start.triggerConfig.type =
//! contact_added` and enrolls the contact. Analogous fan-outs exist for
//! tag-added, status-changed, scheduled, and manual triggers."
//!
//! Every function here is a thin filter over `list_enabled_workflows`
//! feeding [`enroll_contact`] — all enrollment, including duplicate
//! suppression, stays in that one primitive.

use loomwork_model::{ContactStatus, NodeKind, TriggerConfig};
use loomwork_store::ExecutionStore;
use tracing::{info, warn};

use crate::enroll::{enroll_contact, EnrollOutcome};
use crate::error::SchedulerError;

/// Enroll `contact_id` into every enabled workflow triggered by
/// `contact_added`.
pub async fn contact_added(store: &dyn ExecutionStore, contact_id: &str, max_attempts: i64) -> Result<usize, SchedulerError> {
  let workflows = store.list_enabled_workflows().await?;
  let mut enrolled = 0;
  for workflow in workflows {
    let Some(trigger) = workflow.trigger_node() else { continue };
    let NodeKind::TriggerStart {
      trigger: TriggerConfig::ContactAdded,
    } = &trigger.kind
    else {
      continue;
    };
    match enroll_contact(store, &workflow.workflow_id, contact_id, true, max_attempts).await? {
      EnrollOutcome::Enrolled { .. } => {
        enrolled += 1;
        info!(workflow_id = %workflow.workflow_id, contact_id, "enrolled via contact_added");
      }
      EnrollOutcome::Skipped => {
        warn!(workflow_id = %workflow.workflow_id, contact_id, "skipped: already enrolled");
      }
    }
  }
  Ok(enrolled)
}

/// Enroll `contact_id` into every enabled workflow triggered by
/// `tag_added` with a matching tag.
pub async fn tag_added(
  store: &dyn ExecutionStore,
  contact_id: &str,
  tag: &str,
  max_attempts: i64,
) -> Result<usize, SchedulerError> {
  let workflows = store.list_enabled_workflows().await?;
  let mut enrolled = 0;
  for workflow in workflows {
    let Some(trigger) = workflow.trigger_node() else { continue };
    let NodeKind::TriggerStart {
      trigger: TriggerConfig::TagAdded { tag: expected },
    } = &trigger.kind
    else {
      continue;
    };
    if expected != tag {
      continue;
    }
    if let EnrollOutcome::Enrolled { .. } = enroll_contact(store, &workflow.workflow_id, contact_id, true, max_attempts).await? {
      enrolled += 1;
      info!(workflow_id = %workflow.workflow_id, contact_id, tag, "enrolled via tag_added");
    }
  }
  Ok(enrolled)
}

/// Enroll `contact_id` into every enabled workflow triggered by
/// `status_changed`, where `to_status: None` matches any transition and
/// `to_status: Some(s)` requires the new status to equal `s`.
pub async fn status_changed(
  store: &dyn ExecutionStore,
  contact_id: &str,
  new_status: ContactStatus,
  max_attempts: i64,
) -> Result<usize, SchedulerError> {
  let workflows = store.list_enabled_workflows().await?;
  let mut enrolled = 0;
  for workflow in workflows {
    let Some(trigger) = workflow.trigger_node() else { continue };
    let NodeKind::TriggerStart {
      trigger: TriggerConfig::StatusChanged { to_status },
    } = &trigger.kind
    else {
      continue;
    };
    if let Some(expected) = to_status {
      if *expected != new_status {
        continue;
      }
    }
    if let EnrollOutcome::Enrolled { .. } = enroll_contact(store, &workflow.workflow_id, contact_id, true, max_attempts).await? {
      enrolled += 1;
      info!(workflow_id = %workflow.workflow_id, contact_id, "enrolled via status_changed");
    }
  }
  Ok(enrolled)
}

/// Enroll `contact_id` explicitly into `workflow_id`, bypassing the
/// trigger-type filter — the operator (or an API caller) already named the
/// workflow. Still routes through [`enroll_contact`] for the duplicate
/// check and the `trigger_start` existence check.
pub async fn manual(
  store: &dyn ExecutionStore,
  workflow_id: &str,
  contact_id: &str,
  max_attempts: i64,
) -> Result<EnrollOutcome, SchedulerError> {
  enroll_contact(store, workflow_id, contact_id, true, max_attempts).await
}

/// Enroll `contact_id` into every enabled workflow whose trigger is
/// `scheduled` and whose cron expression the caller's `cron_matches`
/// predicate accepts for the current tick.
///
/// Parsing and evaluating cron expressions is outside this crate's
/// dependency footprint; the predicate is supplied by the caller.
pub async fn scheduled(
  store: &dyn ExecutionStore,
  contact_id: &str,
  max_attempts: i64,
  cron_matches: impl Fn(&str) -> bool,
) -> Result<usize, SchedulerError> {
  let workflows = store.list_enabled_workflows().await?;
  let mut enrolled = 0;
  for workflow in workflows {
    let Some(trigger) = workflow.trigger_node() else { continue };
    let NodeKind::TriggerStart {
      trigger: TriggerConfig::Scheduled { cron },
    } = &trigger.kind
    else {
      continue;
    };
    if !cron_matches(cron) {
      continue;
    }
    if let EnrollOutcome::Enrolled { .. } = enroll_contact(store, &workflow.workflow_id, contact_id, true, max_attempts).await? {
      enrolled += 1;
      info!(workflow_id = %workflow.workflow_id, contact_id, "enrolled via scheduled");
    }
  }
  Ok(enrolled)
}
