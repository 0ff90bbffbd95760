use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::error::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

use loomwork_model::{
  Channel, Contact, ContactStatus, Edge, EdgeHandle, MessageDirection, MessageStatus, Workflow,
  WorkflowDef,
};

use crate::error::StoreError;
use crate::types::{Enrollment, EnrollmentStatus, Execution, ExecutionContext, ExecutionLog, ExecutionStatus};
use crate::{ExecutionStore, Message};

/// SQLite-backed execution state store.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if absent) the SQLite database at `database_url` and
  /// run migrations. `database_url` follows sqlx's URL form, e.g.
  /// `sqlite:///path/to/loomwork.db` or `sqlite::memory:`.
  pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    let store = Self { pool };
    store.migrate().await?;
    Ok(store)
  }

  /// Run pending migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }

  /// Write (insert or replace) a template row. Template authoring lives in
  /// the out-of-scope editor CRUD screens (spec §1); this is the seam they
  /// write through, and the one tests use to seed a template a `send_sms`/
  /// `send_email` node can resolve.
  pub async fn put_template(&self, template: &crate::Template) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO templates (template_id, channel, subject, body) VALUES (?, ?, ?, ?)
       ON CONFLICT(template_id) DO UPDATE SET channel = excluded.channel, subject = excluded.subject, body = excluded.body",
    )
    .bind(&template.template_id)
    .bind(&template.channel)
    .bind(&template.subject)
    .bind(&template.body)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  /// Write (insert or replace) a single settings key. Settings authoring
  /// lives in the out-of-scope settings screen (spec §1); this is the seam
  /// it writes through.
  pub async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO settings (key, value) VALUES (?, ?)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn get_enrollment(&self, enrollment_id: &str) -> Result<Enrollment, StoreError> {
    sqlx::query_as(
      "SELECT enrollment_id, workflow_id, contact_id, status, enrolled_at, completed_at, stopped_at, stop_reason
       FROM workflow_enrollments WHERE enrollment_id = ?",
    )
    .bind(enrollment_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("enrollment {enrollment_id}")))
  }
}

#[async_trait]
impl ExecutionStore for SqliteStore {
  async fn save_workflow(&self, def: &WorkflowDef) -> Result<Workflow, StoreError> {
    let now = Utc::now();
    let mut tx = self.pool.begin().await?;

    let existing_created_at: Option<(DateTime<Utc>,)> =
      sqlx::query_as("SELECT created_at FROM workflows WHERE workflow_id = ?")
        .bind(&def.workflow_id)
        .fetch_optional(&mut *tx)
        .await?;
    let created_at = existing_created_at.map(|(t,)| t).unwrap_or(now);

    sqlx::query(
      "INSERT INTO workflows (workflow_id, name, description, enabled, created_at, updated_at)
       VALUES (?, ?, ?, ?, ?, ?)
       ON CONFLICT(workflow_id) DO UPDATE SET
         name = excluded.name, description = excluded.description,
         enabled = excluded.enabled, updated_at = excluded.updated_at",
    )
    .bind(&def.workflow_id)
    .bind(&def.name)
    .bind(&def.description)
    .bind(def.enabled)
    .bind(created_at)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // Whole-graph replace: edges first, then nodes, then reinsert in FK order.
    sqlx::query("DELETE FROM workflow_edges WHERE workflow_id = ?")
      .bind(&def.workflow_id)
      .execute(&mut *tx)
      .await?;
    sqlx::query("DELETE FROM workflow_nodes WHERE workflow_id = ?")
      .bind(&def.workflow_id)
      .execute(&mut *tx)
      .await?;

    for node in &def.nodes {
      let data = serde_json::to_string(node)?;
      sqlx::query(
        "INSERT INTO workflow_nodes (node_id, workflow_id, node_type, position_x, position_y, data)
         VALUES (?, ?, ?, ?, ?, ?)",
      )
      .bind(&node.node_id)
      .bind(&def.workflow_id)
      .bind(node.kind.type_name())
      .bind(node.position.0)
      .bind(node.position.1)
      .bind(data)
      .execute(&mut *tx)
      .await?;
    }

    for edge in &def.edges {
      sqlx::query(
        "INSERT INTO workflow_edges (workflow_id, source_node_id, target_node_id, source_handle, label)
         VALUES (?, ?, ?, ?, ?)",
      )
      .bind(&def.workflow_id)
      .bind(&edge.source_node_id)
      .bind(&edge.target_node_id)
      .bind(edge.source_handle.map(|h| h.as_str()))
      .bind(&edge.label)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;

    Ok(Workflow::from_def(def.clone(), created_at, now)?)
  }

  async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow, StoreError> {
    let row: Option<(String, String, Option<String>, bool, DateTime<Utc>, DateTime<Utc>)> =
      sqlx::query_as(
        "SELECT workflow_id, name, description, enabled, created_at, updated_at
         FROM workflows WHERE workflow_id = ?",
      )
      .bind(workflow_id)
      .fetch_optional(&self.pool)
      .await?;
    let (workflow_id, name, description, enabled, created_at, updated_at) =
      row.ok_or_else(|| StoreError::NotFound(format!("workflow {workflow_id}")))?;

    let node_rows: Vec<(String,)> =
      sqlx::query_as("SELECT data FROM workflow_nodes WHERE workflow_id = ?")
        .bind(&workflow_id)
        .fetch_all(&self.pool)
        .await?;
    let nodes = node_rows
      .into_iter()
      .map(|(data,)| serde_json::from_str(&data))
      .collect::<Result<Vec<_>, _>>()?;

    let edge_rows: Vec<(String, String, Option<String>, Option<String>)> = sqlx::query_as(
      "SELECT source_node_id, target_node_id, source_handle, label
       FROM workflow_edges WHERE workflow_id = ?",
    )
    .bind(&workflow_id)
    .fetch_all(&self.pool)
    .await?;
    let edges = edge_rows
      .into_iter()
      .map(|(source_node_id, target_node_id, source_handle, label)| {
        Ok::<_, StoreError>(Edge {
          source_node_id,
          target_node_id,
          source_handle: source_handle.map(|h| parse_edge_handle(&h)).transpose()?,
          label,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let def = WorkflowDef {
      workflow_id,
      name,
      description,
      enabled,
      nodes,
      edges,
    };
    Ok(Workflow::from_def(def, created_at, updated_at)?)
  }

  async fn list_enabled_workflows(&self) -> Result<Vec<Workflow>, StoreError> {
    let ids: Vec<(String,)> =
      sqlx::query_as("SELECT workflow_id FROM workflows WHERE enabled = 1")
        .fetch_all(&self.pool)
        .await?;
    let mut workflows = Vec::with_capacity(ids.len());
    for (workflow_id,) in ids {
      workflows.push(self.get_workflow(&workflow_id).await?);
    }
    Ok(workflows)
  }

  async fn get_contact(&self, contact_id: &str) -> Result<Contact, StoreError> {
    let row: Option<(String, String, String, String, String, String, bool, bool, Option<DateTime<Utc>>)> =
      sqlx::query_as(
        "SELECT contact_id, first_name, last_name, email, phone, status, do_not_contact, replied, last_contacted
         FROM contacts WHERE contact_id = ?",
      )
      .bind(contact_id)
      .fetch_optional(&self.pool)
      .await?;
    let (contact_id, first_name, last_name, email, phone, status, do_not_contact, replied, last_contacted) =
      row.ok_or_else(|| StoreError::NotFound(format!("contact {contact_id}")))?;

    let tag_rows: Vec<(String,)> =
      sqlx::query_as("SELECT tag FROM contact_tags WHERE contact_id = ?")
        .bind(&contact_id)
        .fetch_all(&self.pool)
        .await?;
    let field_rows: Vec<(String, String)> =
      sqlx::query_as("SELECT key, value FROM contact_custom_fields WHERE contact_id = ?")
        .bind(&contact_id)
        .fetch_all(&self.pool)
        .await?;

    Ok(Contact {
      contact_id,
      first_name,
      last_name,
      email,
      phone,
      status: parse_contact_status(&status)?,
      do_not_contact,
      tags: tag_rows.into_iter().map(|(t,)| t).collect(),
      custom_fields: field_rows.into_iter().collect(),
      replied,
      last_contacted,
    })
  }

  async fn upsert_contact(&self, contact: &Contact) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await?;

    sqlx::query(
      "INSERT INTO contacts (contact_id, first_name, last_name, email, phone, status, do_not_contact, replied, last_contacted)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
       ON CONFLICT(contact_id) DO UPDATE SET
         first_name = excluded.first_name, last_name = excluded.last_name, email = excluded.email,
         phone = excluded.phone, status = excluded.status, do_not_contact = excluded.do_not_contact,
         replied = excluded.replied, last_contacted = excluded.last_contacted",
    )
    .bind(&contact.contact_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(contact.status.as_str())
    .bind(contact.do_not_contact)
    .bind(contact.replied)
    .bind(contact.last_contacted)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM contact_tags WHERE contact_id = ?")
      .bind(&contact.contact_id)
      .execute(&mut *tx)
      .await?;
    for tag in &contact.tags {
      sqlx::query("INSERT INTO contact_tags (contact_id, tag) VALUES (?, ?)")
        .bind(&contact.contact_id)
        .bind(tag)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM contact_custom_fields WHERE contact_id = ?")
      .bind(&contact.contact_id)
      .execute(&mut *tx)
      .await?;
    for (key, value) in &contact.custom_fields {
      sqlx::query("INSERT INTO contact_custom_fields (contact_id, key, value) VALUES (?, ?, ?)")
        .bind(&contact.contact_id)
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
  }

  async fn update_contact_status(
    &self,
    contact_id: &str,
    status: ContactStatus,
  ) -> Result<(), StoreError> {
    sqlx::query("UPDATE contacts SET status = ? WHERE contact_id = ?")
      .bind(status.as_str())
      .bind(contact_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn mark_contact_replied(&self, contact_id: &str) -> Result<(), StoreError> {
    sqlx::query("UPDATE contacts SET replied = 1, last_contacted = ? WHERE contact_id = ?")
      .bind(Utc::now())
      .bind(contact_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn get_active_enrollment(
    &self,
    workflow_id: &str,
    contact_id: &str,
  ) -> Result<Option<Enrollment>, StoreError> {
    let enrollment = sqlx::query_as(
      "SELECT enrollment_id, workflow_id, contact_id, status, enrolled_at, completed_at, stopped_at, stop_reason
       FROM workflow_enrollments WHERE workflow_id = ? AND contact_id = ? AND status = 'active'",
    )
    .bind(workflow_id)
    .bind(contact_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(enrollment)
  }

  async fn create_enrollment(
    &self,
    workflow_id: &str,
    contact_id: &str,
    start_node_id: &str,
    max_attempts: i64,
  ) -> Result<(Enrollment, Execution), StoreError> {
    let now = Utc::now();
    let enrollment_id = Uuid::new_v4().to_string();
    let execution_id = Uuid::new_v4().to_string();

    let mut tx = self.pool.begin().await?;

    sqlx::query(
      "INSERT INTO workflow_enrollments (enrollment_id, workflow_id, contact_id, status, enrolled_at)
       VALUES (?, ?, ?, 'active', ?)",
    )
    .bind(&enrollment_id)
    .bind(workflow_id)
    .bind(contact_id)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| match &e {
      sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Constraint(
        "an active enrollment already exists for this workflow and contact".to_string(),
      ),
      _ => StoreError::Database(e),
    })?;

    sqlx::query(
      "INSERT INTO workflow_executions
         (execution_id, enrollment_id, current_node_id, status, next_run_at, attempts, max_attempts, execution_data)
       VALUES (?, ?, ?, 'waiting', ?, 0, ?, '{}')",
    )
    .bind(&execution_id)
    .bind(&enrollment_id)
    .bind(start_node_id)
    .bind(now)
    .bind(max_attempts)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let enrollment = Enrollment {
      enrollment_id: enrollment_id.clone(),
      workflow_id: workflow_id.to_string(),
      contact_id: contact_id.to_string(),
      status: EnrollmentStatus::Active,
      enrolled_at: now,
      completed_at: None,
      stopped_at: None,
      stop_reason: None,
    };
    let execution = Execution {
      execution_id,
      enrollment_id,
      current_node_id: start_node_id.to_string(),
      status: ExecutionStatus::Waiting,
      next_run_at: Some(now),
      last_run_at: None,
      attempts: 0,
      max_attempts,
      error_message: None,
      execution_data: sqlx::types::Json(serde_json::json!({})),
      lease_holder: None,
      lease_expires_at: None,
    };

    Ok((enrollment, execution))
  }

  async fn transition_enrollment(
    &self,
    enrollment_id: &str,
    status: EnrollmentStatus,
    reason: Option<String>,
  ) -> Result<(), StoreError> {
    let now = Utc::now();
    let (completed_at, stopped_at) = match status {
      EnrollmentStatus::Completed => (Some(now), None),
      EnrollmentStatus::Stopped => (None, Some(now)),
      EnrollmentStatus::Active | EnrollmentStatus::Failed => (None, None),
    };
    sqlx::query(
      "UPDATE workflow_enrollments
       SET status = ?, completed_at = COALESCE(?, completed_at), stopped_at = COALESCE(?, stopped_at),
           stop_reason = COALESCE(?, stop_reason)
       WHERE enrollment_id = ?",
    )
    .bind(status)
    .bind(completed_at)
    .bind(stopped_at)
    .bind(reason)
    .bind(enrollment_id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn claim_due_executions(
    &self,
    limit: u32,
    lease_ttl_s: i64,
    lease_holder: &str,
  ) -> Result<Vec<Execution>, StoreError> {
    let now = Utc::now();
    let lease_expires_at = now + Duration::seconds(lease_ttl_s);
    let mut tx = self.pool.begin().await?;

    let due: Vec<(String,)> = sqlx::query_as(
      "SELECT execution_id FROM workflow_executions
       WHERE (status = 'waiting' AND next_run_at <= ?)
          OR (status = 'processing' AND lease_expires_at IS NOT NULL AND lease_expires_at <= ?)
       ORDER BY next_run_at ASC
       LIMIT ?",
    )
    .bind(now)
    .bind(now)
    .bind(limit)
    .fetch_all(&mut *tx)
    .await?;

    let mut claimed = Vec::with_capacity(due.len());
    for (execution_id,) in due {
      sqlx::query(
        "UPDATE workflow_executions
         SET status = 'processing', attempts = attempts + 1, last_run_at = ?, lease_holder = ?, lease_expires_at = ?
         WHERE execution_id = ?",
      )
      .bind(now)
      .bind(lease_holder)
      .bind(lease_expires_at)
      .bind(&execution_id)
      .execute(&mut *tx)
      .await?;

      let execution: Execution = sqlx::query_as(
        "SELECT execution_id, enrollment_id, current_node_id, status, next_run_at, last_run_at,
                attempts, max_attempts, error_message, execution_data, lease_holder, lease_expires_at
         FROM workflow_executions WHERE execution_id = ?",
      )
      .bind(&execution_id)
      .fetch_one(&mut *tx)
      .await?;
      claimed.push(execution);
    }

    tx.commit().await?;
    Ok(claimed)
  }

  async fn get_execution(&self, execution_id: &str) -> Result<Execution, StoreError> {
    sqlx::query_as(
      "SELECT execution_id, enrollment_id, current_node_id, status, next_run_at, last_run_at,
              attempts, max_attempts, error_message, execution_data, lease_holder, lease_expires_at
       FROM workflow_executions WHERE execution_id = ?",
    )
    .bind(execution_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("execution {execution_id}")))
  }

  async fn get_execution_context(&self, execution_id: &str) -> Result<ExecutionContext, StoreError> {
    let execution = self.get_execution(execution_id).await?;
    let enrollment = self.get_enrollment(&execution.enrollment_id).await?;
    let contact = self.get_contact(&enrollment.contact_id).await?;
    let workflow = self.get_workflow(&enrollment.workflow_id).await?;
    Ok(ExecutionContext {
      execution,
      enrollment,
      contact,
      workflow,
    })
  }

  async fn advance_execution(
    &self,
    execution_id: &str,
    next_node_id: &str,
    next_run_at: Option<DateTime<Utc>>,
    execution_data_patch: &serde_json::Value,
  ) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await?;

    let (current_data,): (String,) =
      sqlx::query_as("SELECT execution_data FROM workflow_executions WHERE execution_id = ?")
        .bind(execution_id)
        .fetch_one(&mut *tx)
        .await?;
    let mut data: serde_json::Value = serde_json::from_str(&current_data)?;
    merge_shallow(&mut data, execution_data_patch);
    let data = serde_json::to_string(&data)?;

    // If `next_run_at` is set the walk loop yields for this tick;
    // otherwise it keeps processing in the same batch.
    let status = if next_run_at.is_some() {
      ExecutionStatus::Waiting
    } else {
      ExecutionStatus::Processing
    };

    sqlx::query(
      "UPDATE workflow_executions
       SET current_node_id = ?, status = ?, next_run_at = ?, error_message = NULL, execution_data = ?
       WHERE execution_id = ?",
    )
    .bind(next_node_id)
    .bind(status)
    .bind(next_run_at)
    .bind(data)
    .bind(execution_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
  }

  async fn reschedule_execution(
    &self,
    execution_id: &str,
    next_run_at: DateTime<Utc>,
    error_message: &str,
  ) -> Result<(), StoreError> {
    sqlx::query(
      "UPDATE workflow_executions SET status = 'waiting', next_run_at = ?, error_message = ?
       WHERE execution_id = ?",
    )
    .bind(next_run_at)
    .bind(error_message)
    .bind(execution_id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn complete_execution(&self, execution_id: &str) -> Result<(), StoreError> {
    sqlx::query("UPDATE workflow_executions SET status = 'completed', next_run_at = NULL WHERE execution_id = ?")
      .bind(execution_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn fail_execution(&self, execution_id: &str, error_message: &str) -> Result<(), StoreError> {
    sqlx::query(
      "UPDATE workflow_executions SET status = 'failed', error_message = ?, next_run_at = NULL
       WHERE execution_id = ?",
    )
    .bind(error_message)
    .bind(execution_id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn append_log(&self, log: &ExecutionLog) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO workflow_execution_logs
         (log_id, execution_id, enrollment_id, node_id, node_type, action, status, input, output, error, duration_ms, created_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&log.log_id)
    .bind(&log.execution_id)
    .bind(&log.enrollment_id)
    .bind(&log.node_id)
    .bind(&log.node_type)
    .bind(&log.action)
    .bind(log.status)
    .bind(&log.input)
    .bind(&log.output)
    .bind(&log.error)
    .bind(log.duration_ms)
    .bind(log.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn list_logs(&self, execution_id: &str) -> Result<Vec<ExecutionLog>, StoreError> {
    let logs = sqlx::query_as(
      "SELECT log_id, execution_id, enrollment_id, node_id, node_type, action, status, input, output, error, duration_ms, created_at
       FROM workflow_execution_logs WHERE execution_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(execution_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(logs)
  }

  async fn create_message(&self, message: &Message) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO messages
         (message_id, contact_id, channel, direction, subject, body, status, provider_id, provider_error, source, template_id, execution_id, created_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&message.message_id)
    .bind(&message.contact_id)
    .bind(message.channel.as_str())
    .bind(direction_as_str(message.direction))
    .bind(&message.subject)
    .bind(&message.body)
    .bind(message_status_as_str(message.status))
    .bind(&message.provider_id)
    .bind(&message.provider_error)
    .bind(&message.source)
    .bind(&message.template_id)
    .bind(&message.execution_id)
    .bind(message.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn update_message_status(
    &self,
    message_id: &str,
    status: MessageStatus,
    provider_id: Option<String>,
    provider_error: Option<String>,
  ) -> Result<(), StoreError> {
    sqlx::query(
      "UPDATE messages SET status = ?, provider_id = COALESCE(?, provider_id), provider_error = COALESCE(?, provider_error)
       WHERE message_id = ?",
    )
    .bind(message_status_as_str(status))
    .bind(provider_id)
    .bind(provider_error)
    .bind(message_id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn has_inbound_message_since(
    &self,
    contact_id: &str,
    since: DateTime<Utc>,
    channel: Option<Channel>,
  ) -> Result<bool, StoreError> {
    let (exists,): (bool,) = if let Some(channel) = channel {
      sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM messages WHERE contact_id = ? AND direction = 'inbound' AND created_at >= ? AND channel = ?)",
      )
      .bind(contact_id)
      .bind(since)
      .bind(channel.as_str())
      .fetch_one(&self.pool)
      .await?
    } else {
      sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM messages WHERE contact_id = ? AND direction = 'inbound' AND created_at >= ?)",
      )
      .bind(contact_id)
      .bind(since)
      .fetch_one(&self.pool)
      .await?
    };
    Ok(exists)
  }

  async fn get_template(&self, template_id: &str) -> Result<crate::Template, StoreError> {
    sqlx::query_as("SELECT template_id, channel, subject, body FROM templates WHERE template_id = ?")
      .bind(template_id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| StoreError::NotFound(format!("template {template_id}")))
  }

  async fn get_all_settings(&self) -> Result<std::collections::HashMap<String, String>, StoreError> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().collect())
  }
}

fn parse_edge_handle(s: &str) -> Result<EdgeHandle, StoreError> {
  match s {
    "yes" => Ok(EdgeHandle::Yes),
    "no" => Ok(EdgeHandle::No),
    other => Err(StoreError::Constraint(format!("unknown edge handle '{other}'"))),
  }
}

fn parse_contact_status(s: &str) -> Result<ContactStatus, StoreError> {
  match s {
    "new" => Ok(ContactStatus::New),
    "contacted" => Ok(ContactStatus::Contacted),
    "responded" => Ok(ContactStatus::Responded),
    "qualified" => Ok(ContactStatus::Qualified),
    "disqualified" => Ok(ContactStatus::Disqualified),
    other => Err(StoreError::Constraint(format!("unknown contact status '{other}'"))),
  }
}

fn direction_as_str(direction: MessageDirection) -> &'static str {
  match direction {
    MessageDirection::Outbound => "outbound",
    MessageDirection::Inbound => "inbound",
  }
}

fn message_status_as_str(status: MessageStatus) -> &'static str {
  match status {
    MessageStatus::Queued => "queued",
    MessageStatus::Scheduled => "scheduled",
    MessageStatus::Sent => "sent",
    MessageStatus::Failed => "failed",
    MessageStatus::Delivered => "delivered",
  }
}

fn merge_shallow(base: &mut serde_json::Value, patch: &serde_json::Value) {
  if let (Some(base_map), Some(patch_map)) = (base.as_object_mut(), patch.as_object()) {
    for (key, value) in patch_map {
      base_map.insert(key.clone(), value.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use loomwork_model::{Node, NodeKind, TriggerConfig};
  use sqlx::sqlite::SqlitePoolOptions;
  use std::collections::{HashMap, HashSet};

  async fn test_store() -> SqliteStore {
    let pool = SqlitePoolOptions::new()
      .connect("sqlite::memory:")
      .await
      .expect("open in-memory sqlite");
    let store = SqliteStore::new(pool);
    store.migrate().await.expect("run migrations");
    store
  }

  fn trigger_def(workflow_id: &str) -> WorkflowDef {
    WorkflowDef {
      workflow_id: workflow_id.to_string(),
      name: "Welcome".to_string(),
      description: None,
      enabled: true,
      nodes: vec![Node {
        node_id: "start".to_string(),
        workflow_id: workflow_id.to_string(),
        kind: NodeKind::TriggerStart {
          trigger: TriggerConfig::Manual,
        },
        position: (0.0, 0.0),
      }],
      edges: vec![],
    }
  }

  fn new_contact(contact_id: &str) -> Contact {
    Contact {
      contact_id: contact_id.to_string(),
      first_name: "Ana".to_string(),
      last_name: "Diaz".to_string(),
      email: "ana@example.com".to_string(),
      phone: "+15551234567".to_string(),
      status: ContactStatus::New,
      do_not_contact: false,
      tags: HashSet::new(),
      custom_fields: HashMap::new(),
      replied: false,
      last_contacted: None,
    }
  }

  #[tokio::test]
  async fn round_trips_a_workflow() {
    let store = test_store().await;
    let def = trigger_def("wf1");
    let saved = store.save_workflow(&def).await.unwrap();
    assert_eq!(saved.workflow_id, "wf1");

    let loaded = store.get_workflow("wf1").await.unwrap();
    assert_eq!(loaded.nodes.len(), 1);
    assert!(loaded.trigger_node().is_some());
  }

  #[tokio::test]
  async fn enrollment_uniqueness_is_enforced() {
    let store = test_store().await;
    store.save_workflow(&trigger_def("wf1")).await.unwrap();
    store.upsert_contact(&new_contact("c1")).await.unwrap();

    store.create_enrollment("wf1", "c1", "start", 3).await.unwrap();
    let err = store
      .create_enrollment("wf1", "c1", "start", 3)
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
  }

  #[tokio::test]
  async fn claim_due_executions_does_not_double_claim() {
    let store = test_store().await;
    store.save_workflow(&trigger_def("wf1")).await.unwrap();
    store.upsert_contact(&new_contact("c1")).await.unwrap();
    store.create_enrollment("wf1", "c1", "start", 3).await.unwrap();

    let first = store.claim_due_executions(10, 300, "runner-a").await.unwrap();
    assert_eq!(first.len(), 1);
    let second = store.claim_due_executions(10, 300, "runner-b").await.unwrap();
    assert!(second.is_empty());
  }

  #[tokio::test]
  async fn inbound_reply_query_respects_channel_filter() {
    let store = test_store().await;
    store.upsert_contact(&new_contact("c1")).await.unwrap();
    let since = Utc::now() - Duration::seconds(60);

    store
      .create_message(&Message {
        message_id: "m1".to_string(),
        contact_id: "c1".to_string(),
        channel: Channel::Sms,
        direction: MessageDirection::Inbound,
        subject: None,
        body: "STOP".to_string(),
        status: MessageStatus::Delivered,
        provider_id: None,
        provider_error: None,
        source: "webhook".to_string(),
        template_id: None,
        execution_id: None,
        created_at: Utc::now(),
      })
      .await
      .unwrap();

    assert!(store
      .has_inbound_message_since("c1", since, Some(Channel::Sms))
      .await
      .unwrap());
    assert!(!store
      .has_inbound_message_since("c1", since, Some(Channel::Email))
      .await
      .unwrap());
  }
}
