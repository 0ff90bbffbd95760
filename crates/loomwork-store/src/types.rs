use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use loomwork_model::{Channel, MessageDirection, MessageStatus};

// `Channel`, `MessageDirection`, `MessageStatus` and `ContactStatus` live in
// loomwork-model, which stays storage-agnostic and does not depend on sqlx.
// `Message` is therefore assembled by hand from row columns in `sqlite.rs`
// rather than derived via `FromRow`.

/// Status of an [`Enrollment`]: `active → (completed | stopped | failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EnrollmentStatus {
  Active,
  Completed,
  Stopped,
  Failed,
}

/// Status of an [`Execution`], the durable cursor for an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Waiting,
  Processing,
  Completed,
  Failed,
}

/// Status recorded on an [`ExecutionLog`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LogStatus {
  Completed,
  Failed,
}

/// One bound Contact-to-Workflow relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
  pub enrollment_id: String,
  pub workflow_id: String,
  pub contact_id: String,
  pub status: EnrollmentStatus,
  pub enrolled_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub stopped_at: Option<DateTime<Utc>>,
  pub stop_reason: Option<String>,
}

/// The durable cursor driving one enrollment through its workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Execution {
  pub execution_id: String,
  pub enrollment_id: String,
  pub current_node_id: String,
  pub status: ExecutionStatus,
  pub next_run_at: Option<DateTime<Utc>>,
  pub last_run_at: Option<DateTime<Utc>>,
  pub attempts: i64,
  pub max_attempts: i64,
  pub error_message: Option<String>,
  pub execution_data: Json<serde_json::Value>,
  pub lease_holder: Option<String>,
  pub lease_expires_at: Option<DateTime<Utc>>,
}

impl Execution {
  /// Typed view over the opaque `execution_data` map.
  pub fn data_map(&self) -> HashMap<String, serde_json::Value> {
    match &self.execution_data.0 {
      serde_json::Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
      _ => HashMap::new(),
    }
  }
}

/// An append-only record of one processor invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionLog {
  pub log_id: String,
  pub execution_id: String,
  pub enrollment_id: String,
  pub node_id: String,
  pub node_type: String,
  pub action: String,
  pub status: LogStatus,
  pub input: Option<Json<serde_json::Value>>,
  pub output: Option<Json<serde_json::Value>>,
  pub error: Option<String>,
  pub duration_ms: i64,
  pub created_at: DateTime<Utc>,
}

impl ExecutionLog {
  /// Build a log row from plain `serde_json::Value`s, so callers (the
  /// Executor Core) never need to depend on `sqlx` directly.
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    log_id: String,
    execution_id: String,
    enrollment_id: String,
    node_id: String,
    node_type: String,
    action: String,
    status: LogStatus,
    input: Option<serde_json::Value>,
    output: Option<serde_json::Value>,
    error: Option<String>,
    duration_ms: i64,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      log_id,
      execution_id,
      enrollment_id,
      node_id,
      node_type,
      action,
      status,
      input: input.map(Json),
      output: output.map(Json),
      error,
      duration_ms,
      created_at,
    }
  }
}

/// An outbound or inbound communication with a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub message_id: String,
  pub contact_id: String,
  pub channel: Channel,
  pub direction: MessageDirection,
  pub subject: Option<String>,
  pub body: String,
  pub status: MessageStatus,
  pub provider_id: Option<String>,
  pub provider_error: Option<String>,
  pub source: String,
  pub template_id: Option<String>,
  pub execution_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Everything the Executor Core needs loaded to advance one execution.
pub struct ExecutionContext {
  pub execution: Execution,
  pub enrollment: Enrollment,
  pub contact: loomwork_model::Contact,
  pub workflow: loomwork_model::Workflow,
}

/// A message template. CRUD is out of scope (§1); the engine only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Template {
  pub template_id: String,
  pub channel: String,
  pub subject: Option<String>,
  pub body: String,
}
