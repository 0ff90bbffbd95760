//! Execution State Store (component C3).
//!
//! Durable storage for workflows, contacts, enrollments, executions,
//! execution logs and messages, behind the [`ExecutionStore`] trait. The
//! only implementation shipped is [`SqliteStore`]; the trait exists so the
//! Executor Core and Tick Scheduler never depend on SQL directly.

mod error;
mod sqlite;
mod types;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use types::{
  Enrollment, EnrollmentStatus, Execution, ExecutionContext, ExecutionLog, ExecutionStatus,
  LogStatus, Message, Template,
};

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loomwork_model::{Channel, Contact, ContactStatus, Workflow, WorkflowDef};

/// Durable storage for the engine's execution state.
///
/// Implementations must honor the atomic-claim and append-only-log
/// invariants: `claim_due_executions` must never hand the same row to two
/// callers, and `append_log` must never update an existing row.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
  /// Whole-graph replace: delete existing nodes/edges, insert the new set,
  /// atomically. Returns the validated, locked workflow.
  async fn save_workflow(&self, def: &WorkflowDef) -> Result<Workflow, StoreError>;

  async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow, StoreError>;

  async fn list_enabled_workflows(&self) -> Result<Vec<Workflow>, StoreError>;

  async fn get_contact(&self, contact_id: &str) -> Result<Contact, StoreError>;

  async fn upsert_contact(&self, contact: &Contact) -> Result<(), StoreError>;

  async fn update_contact_status(
    &self,
    contact_id: &str,
    status: ContactStatus,
  ) -> Result<(), StoreError>;

  async fn mark_contact_replied(&self, contact_id: &str) -> Result<(), StoreError>;

  /// Returns the active enrollment for this (workflow, contact) pair, if any.
  async fn get_active_enrollment(
    &self,
    workflow_id: &str,
    contact_id: &str,
  ) -> Result<Option<Enrollment>, StoreError>;

  /// Creates an `active` enrollment plus a `waiting` execution pointing at
  /// `start_node_id` with `next_run_at = now`, per `enroll_contact`.
  async fn create_enrollment(
    &self,
    workflow_id: &str,
    contact_id: &str,
    start_node_id: &str,
    max_attempts: i64,
  ) -> Result<(Enrollment, Execution), StoreError>;

  async fn transition_enrollment(
    &self,
    enrollment_id: &str,
    status: EnrollmentStatus,
    reason: Option<String>,
  ) -> Result<(), StoreError>;

  /// Atomically selects up to `limit` rows where `status = waiting AND
  /// next_run_at <= now` (or a `processing` row whose lease has expired),
  /// transitions them to `processing` under `lease_holder` with
  /// `lease_expires_at = now + lease_ttl_s`, and returns them. Never
  /// returns the same row to two concurrent callers.
  async fn claim_due_executions(
    &self,
    limit: u32,
    lease_ttl_s: i64,
    lease_holder: &str,
  ) -> Result<Vec<Execution>, StoreError>;

  async fn get_execution(&self, execution_id: &str) -> Result<Execution, StoreError>;

  /// Loads everything the Executor Core needs to advance one execution.
  async fn get_execution_context(
    &self,
    execution_id: &str,
  ) -> Result<ExecutionContext, StoreError>;

  /// Advances `current_node_id`, merges `execution_data` (shallow), clears
  /// `error_message`, and sets `status=waiting` with the given `next_run_at`
  /// (or leaves the execution ready to loop again immediately when `None`
  /// is paired with `status=Waiting` and `next_run_at=now`).
  async fn advance_execution(
    &self,
    execution_id: &str,
    next_node_id: &str,
    next_run_at: Option<DateTime<Utc>>,
    execution_data_patch: &serde_json::Value,
  ) -> Result<(), StoreError>;

  /// Reschedules a failed-but-retryable execution: `status=waiting`,
  /// `next_run_at`, `error_message` set, `current_node_id` unchanged.
  async fn reschedule_execution(
    &self,
    execution_id: &str,
    next_run_at: DateTime<Utc>,
    error_message: &str,
  ) -> Result<(), StoreError>;

  async fn complete_execution(&self, execution_id: &str) -> Result<(), StoreError>;

  async fn fail_execution(&self, execution_id: &str, error_message: &str) -> Result<(), StoreError>;

  /// Appends a log entry. Never updates an existing row.
  async fn append_log(&self, log: &ExecutionLog) -> Result<(), StoreError>;

  /// Lists every log row for `execution_id`, oldest first (append order).
  /// Used by operator triage surfaces and by tests asserting log counts.
  async fn list_logs(&self, execution_id: &str) -> Result<Vec<ExecutionLog>, StoreError>;

  async fn create_message(&self, message: &Message) -> Result<(), StoreError>;

  async fn update_message_status(
    &self,
    message_id: &str,
    status: loomwork_model::MessageStatus,
    provider_id: Option<String>,
    provider_error: Option<String>,
  ) -> Result<(), StoreError>;

  /// Does an inbound message exist for `contact_id` created at or after
  /// `since`, optionally restricted to `channel`? Used solely by
  /// `stop_on_reply`.
  async fn has_inbound_message_since(
    &self,
    contact_id: &str,
    since: DateTime<Utc>,
    channel: Option<Channel>,
  ) -> Result<bool, StoreError>;

  /// Templates are read-only from the engine's perspective.
  async fn get_template(&self, template_id: &str) -> Result<Template, StoreError>;

  /// Single-row key-value settings table holding SMS/email provider
  /// credentials. Read fresh on every processor invocation — no caching.
  async fn get_all_settings(&self) -> Result<HashMap<String, String>, StoreError>;
}
