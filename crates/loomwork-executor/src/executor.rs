use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use loomwork_adapters::{EmailAdapter, SmsAdapter};
use loomwork_config::EngineConfig;
use loomwork_processors::{NodeContext, ProcessorRegistry};
use loomwork_store::{EnrollmentStatus, ExecutionLog, ExecutionStore, LogStatus};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::ExecutorError;
use crate::result::{BatchOutcome, ExecutionResult};

/// The heart of the engine: walks one execution through its
/// workflow graph, node by node, until it hits a wait point, a terminal
/// node, or the cycle-limit guard, persisting every transition through the
/// [`ExecutionStore`] as it goes. Processors never persist state
/// themselves; this is the only writer of enrollment/execution status.
pub struct ExecutorCore {
  store: Arc<dyn ExecutionStore>,
  registry: Arc<ProcessorRegistry>,
  sms: Arc<dyn SmsAdapter>,
  email: Arc<dyn EmailAdapter>,
  config: EngineConfig,
}

impl ExecutorCore {
  pub fn new(
    store: Arc<dyn ExecutionStore>,
    registry: Arc<ProcessorRegistry>,
    sms: Arc<dyn SmsAdapter>,
    email: Arc<dyn EmailAdapter>,
    config: EngineConfig,
  ) -> Self {
    Self {
      store,
      registry,
      sms,
      email,
      config,
    }
  }

  /// Run one batch for `execution_id`. The caller (the Tick Scheduler) is
  /// responsible for having already claimed the row — `claim_due_executions`
  /// transitions it to `processing`, bumps `attempts`, and stamps
  /// `last_run_at` atomically with the claim, so this method assumes the
  /// execution is already `processing` on entry.
  #[instrument(name = "executor_run", skip(self), fields(execution_id = %execution_id))]
  pub async fn run(&self, execution_id: &str) -> Result<ExecutionResult, ExecutorError> {
    let loomwork_store::ExecutionContext {
      execution,
      enrollment,
      contact,
      workflow,
    } = self.store.get_execution_context(execution_id).await?;

    if enrollment.status != EnrollmentStatus::Active {
      return Ok(self.result(execution_id, 0, BatchOutcome::NoWork));
    }

    if !workflow.enabled {
      let reason = ExecutorError::WorkflowDisabled.to_string();
      self.store.fail_execution(execution_id, &reason).await?;
      warn!(workflow_id = %workflow.workflow_id, "execution failed: workflow disabled");
      return Ok(self.result(execution_id, 0, BatchOutcome::Failed { reason }));
    }

    let settings = self.store.get_all_settings().await?;
    let mut current_node_id = execution.current_node_id.clone();
    let mut nodes_processed: u32 = 0;

    loop {
      if nodes_processed > self.config.nodes_per_batch_limit {
        let reason = ExecutorError::CycleLimitExceeded.to_string();
        self.store.fail_execution(execution_id, &reason).await?;
        error!(execution_id, nodes_processed, "cycle limit exceeded");
        return Ok(self.result(execution_id, nodes_processed, BatchOutcome::Failed { reason }));
      }

      let node = match workflow.get_node(&current_node_id) {
        Some(node) => node.clone(),
        None => {
          let reason = ExecutorError::NodeNotFound(current_node_id.clone()).to_string();
          self.store.fail_execution(execution_id, &reason).await?;
          error!(execution_id, node_id = %current_node_id, "node not found");
          return Ok(self.result(execution_id, nodes_processed, BatchOutcome::Failed { reason }));
        }
      };

      let fresh_execution = self.store.get_execution(execution_id).await?;
      let node_context = NodeContext {
        workflow: workflow.clone(),
        enrollment: enrollment.clone(),
        execution: fresh_execution.clone(),
        contact: contact.clone(),
        store: self.store.clone(),
        sms: self.sms.clone(),
        email: self.email.clone(),
        settings: settings.clone(),
      };

      let started = Instant::now();
      let dispatch_result = self.registry.dispatch(&node, &node_context).await;
      let duration_ms = started.elapsed().as_millis() as i64;

      let step = match dispatch_result {
        Ok(step) => step,
        Err(processor_error) => {
          self
            .store
            .append_log(&ExecutionLog::new(
              Uuid::new_v4().to_string(),
              execution_id.to_string(),
              enrollment.enrollment_id.clone(),
              node.node_id.clone(),
              node.kind.type_name().to_string(),
              "execute".to_string(),
              LogStatus::Failed,
              None,
              None,
              Some(processor_error.to_string()),
              duration_ms,
              Utc::now(),
            ))
            .await?;

          if processor_error.is_fatal() {
            self.store.fail_execution(execution_id, &processor_error.to_string()).await?;
            error!(execution_id, node_id = %node.node_id, error = %processor_error, "fatal processor error");
            return Ok(self.result(
              execution_id,
              nodes_processed,
              BatchOutcome::Failed {
                reason: processor_error.to_string(),
              },
            ));
          }

          if fresh_execution.attempts < fresh_execution.max_attempts {
            let next_run_at = Utc::now() + Duration::seconds(self.config.retry_delay_s as i64);
            self
              .store
              .reschedule_execution(execution_id, next_run_at, &processor_error.to_string())
              .await?;
            warn!(execution_id, node_id = %node.node_id, error = %processor_error, "recoverable error, rescheduled");
            return Ok(self.result(execution_id, nodes_processed, BatchOutcome::Waiting));
          }

          let reason = format!("attempts exhausted: {processor_error}");
          self.store.fail_execution(execution_id, &reason).await?;
          error!(execution_id, node_id = %node.node_id, "attempts exhausted");
          return Ok(self.result(execution_id, nodes_processed, BatchOutcome::Failed { reason }));
        }
      };

      let action = if step.stop_enrollment { "stop" } else { "execute" };
      let log_status = if step.error.is_some() { LogStatus::Failed } else { LogStatus::Completed };

      // Logs are appended before the transitions they describe become
      // observable.
      self
        .store
        .append_log(&ExecutionLog::new(
          Uuid::new_v4().to_string(),
          execution_id.to_string(),
          enrollment.enrollment_id.clone(),
          node.node_id.clone(),
          node.kind.type_name().to_string(),
          action.to_string(),
          log_status,
          None,
          step.output_data.clone(),
          step.error.clone(),
          duration_ms,
          Utc::now(),
        ))
        .await?;

      if step.stop_enrollment {
        let reason = step.stop_reason.unwrap_or_else(|| "stopped".to_string());
        self
          .store
          .transition_enrollment(&enrollment.enrollment_id, EnrollmentStatus::Stopped, Some(reason.clone()))
          .await?;
        self.store.complete_execution(execution_id).await?;
        info!(execution_id, node_id = %node.node_id, reason = %reason, "enrollment stopped");
        return Ok(self.result(execution_id, nodes_processed + 1, BatchOutcome::Stopped { reason }));
      }

      if step.next_node_id.is_none() {
        self
          .store
          .transition_enrollment(&enrollment.enrollment_id, EnrollmentStatus::Completed, None)
          .await?;
        self.store.complete_execution(execution_id).await?;
        info!(execution_id, node_id = %node.node_id, "enrollment completed");
        return Ok(self.result(execution_id, nodes_processed + 1, BatchOutcome::Completed));
      }

      let next_node_id = step.next_node_id.expect("checked above");
      let execution_data_patch = step.execution_data.clone().unwrap_or(serde_json::Value::Null);

      if let Some(next_run_at) = step.next_run_at {
        self
          .store
          .advance_execution(execution_id, &next_node_id, Some(next_run_at), &execution_data_patch)
          .await?;
        return Ok(self.result(execution_id, nodes_processed + 1, BatchOutcome::Waiting));
      }

      self
        .store
        .advance_execution(execution_id, &next_node_id, None, &execution_data_patch)
        .await?;

      current_node_id = next_node_id;
      nodes_processed += 1;
    }
  }

  fn result(&self, execution_id: &str, nodes_processed: u32, outcome: BatchOutcome) -> ExecutionResult {
    ExecutionResult {
      execution_id: execution_id.to_string(),
      nodes_processed,
      outcome,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use loomwork_adapters::{FakeEmailAdapter, FakeSmsAdapter};
  use loomwork_model::{ContactStatus, DurationUnit, Edge, Node, NodeKind, TriggerConfig, WorkflowDef};
  use loomwork_store::SqliteStore;
  use std::collections::{HashMap, HashSet};

  async fn test_store() -> Arc<dyn ExecutionStore> {
    let store = SqliteStore::connect("sqlite::memory:").await.expect("open in-memory sqlite");
    Arc::new(store)
  }

  fn make_core(store: Arc<dyn ExecutionStore>) -> ExecutorCore {
    ExecutorCore::new(
      store,
      Arc::new(ProcessorRegistry::new()),
      Arc::new(FakeSmsAdapter::new()),
      Arc::new(FakeEmailAdapter::new()),
      EngineConfig::default(),
    )
  }

  fn contact(contact_id: &str) -> loomwork_model::Contact {
    loomwork_model::Contact {
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
  async fn walks_trigger_then_update_status_to_completion() {
    let store = test_store().await;
    let def = WorkflowDef {
      workflow_id: "wf1".to_string(),
      name: "Onboarding".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: "wf1".to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "mark".to_string(),
          workflow_id: "wf1".to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (1.0, 0.0),
        },
      ],
      edges: vec![Edge {
        source_node_id: "start".to_string(),
        target_node_id: "mark".to_string(),
        source_handle: None,
        label: None,
      }],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf1", "c1", "start", 3).await.unwrap();

    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert_eq!(result.outcome, BatchOutcome::Completed);
    assert_eq!(result.nodes_processed, 2);

    let updated = store.get_contact("c1").await.unwrap();
    assert_eq!(updated.status, ContactStatus::Contacted);
  }

  /// A processor that always throws a recoverable (non-fatal) error, to
  /// exercise the attempts-level retry loop.
  struct AlwaysThrowsProcessor;

  #[async_trait::async_trait]
  impl loomwork_processors::NodeProcessor for AlwaysThrowsProcessor {
    async fn execute(
      &self,
      _node: &loomwork_model::Node,
      _ctx: &loomwork_processors::NodeContext,
    ) -> Result<loomwork_processors::StepResult, loomwork_processors::ProcessorError> {
      Err(loomwork_processors::ProcessorError::ProviderCall(anyhow::anyhow!(
        "simulated provider outage"
      )))
    }
  }

  fn linear_def(workflow_id: &str) -> WorkflowDef {
    WorkflowDef {
      workflow_id: workflow_id.to_string(),
      name: "Retryable".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "mark".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (1.0, 0.0),
        },
      ],
      edges: vec![Edge {
        source_node_id: "start".to_string(),
        target_node_id: "mark".to_string(),
        source_handle: None,
        label: None,
      }],
    }
  }

  #[tokio::test]
  async fn retry_exhaustion_fails_after_max_attempts_with_exactly_that_many_failed_logs() {
    let store = test_store().await;
    store.save_workflow(&linear_def("wf_retry")).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf_retry", "c1", "start", 3).await.unwrap();

    let mut registry = ProcessorRegistry::new();
    registry.register("update_status", Box::new(AlwaysThrowsProcessor));
    let core = ExecutorCore::new(
      store.clone(),
      Arc::new(registry),
      Arc::new(FakeSmsAdapter::new()),
      Arc::new(FakeEmailAdapter::new()),
      EngineConfig::default(),
    );

    for attempt in 1..=3 {
      store.claim_due_executions(10, 300, "runner-a").await.unwrap();
      let result = core.run(&execution.execution_id).await.unwrap();
      if attempt < 3 {
        assert_eq!(result.outcome, BatchOutcome::Waiting, "attempt {attempt} should reschedule");
      } else {
        assert!(
          matches!(result.outcome, BatchOutcome::Failed { .. }),
          "attempt {attempt} should exhaust retries"
        );
      }
    }

    let reloaded = store.get_execution(&execution.execution_id).await.unwrap();
    assert_eq!(reloaded.status, loomwork_store::ExecutionStatus::Failed);

    let logs = store.list_logs(&execution.execution_id).await.unwrap();
    let failed_count = logs
      .iter()
      .filter(|l| l.status == loomwork_store::LogStatus::Failed)
      .count();
    assert_eq!(failed_count, 3, "exactly max_attempts failed logs");
  }

  #[tokio::test]
  async fn cycle_limit_exceeded_on_a_self_loop() {
    let store = test_store().await;
    let workflow_id = "wf_cycle";
    let def = WorkflowDef {
      workflow_id: workflow_id.to_string(),
      name: "Looping".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "loop".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (1.0, 0.0),
        },
      ],
      edges: vec![
        Edge {
          source_node_id: "start".to_string(),
          target_node_id: "loop".to_string(),
          source_handle: None,
          label: None,
        },
        // Self-loop: cycles are legal at the graph level; the executor's
        // hard cap on nodes processed is what breaks them.
        Edge {
          source_node_id: "loop".to_string(),
          target_node_id: "loop".to_string(),
          source_handle: None,
          label: None,
        },
      ],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment(workflow_id, "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert!(matches!(result.outcome, BatchOutcome::Failed { .. }));
    let reloaded = store.get_execution(&execution.execution_id).await.unwrap();
    assert_eq!(reloaded.status, loomwork_store::ExecutionStatus::Failed);
    assert!(reloaded.error_message.unwrap().contains("too many nodes processed"));
  }

  #[tokio::test]
  async fn time_delay_yields_without_advancing_past_it() {
    let store = test_store().await;
    let def = WorkflowDef {
      workflow_id: "wf2".to_string(),
      name: "Drip".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: "wf2".to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "wait".to_string(),
          workflow_id: "wf2".to_string(),
          kind: NodeKind::TimeDelay {
            duration: 1,
            unit: DurationUnit::Days,
          },
          position: (1.0, 0.0),
        },
        Node {
          node_id: "mark".to_string(),
          workflow_id: "wf2".to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (2.0, 0.0),
        },
      ],
      edges: vec![
        Edge {
          source_node_id: "start".to_string(),
          target_node_id: "wait".to_string(),
          source_handle: None,
          label: None,
        },
        Edge {
          source_node_id: "wait".to_string(),
          target_node_id: "mark".to_string(),
          source_handle: None,
          label: None,
        },
      ],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf2", "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert_eq!(result.outcome, BatchOutcome::Waiting);
    let reloaded = store.get_execution(&execution.execution_id).await.unwrap();
    // `current_node_id` already points past the delay node (the delay's
    // successor): the node advances, the *tick* is what yields.
    assert_eq!(reloaded.current_node_id, "mark");
    assert!(reloaded.next_run_at.unwrap() > Utc::now() + Duration::hours(23));
  }

  #[tokio::test]
  async fn disabled_workflow_fails_the_execution() {
    let store = test_store().await;
    let def = WorkflowDef {
      workflow_id: "wf3".to_string(),
      name: "Paused".to_string(),
      description: None,
      enabled: false,
      nodes: vec![Node {
        node_id: "start".to_string(),
        workflow_id: "wf3".to_string(),
        kind: NodeKind::TriggerStart {
          trigger: TriggerConfig::Manual,
        },
        position: (0.0, 0.0),
      }],
      edges: vec![],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf3", "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert!(matches!(result.outcome, BatchOutcome::Failed { .. }));
    let reloaded = store.get_execution(&execution.execution_id).await.unwrap();
    assert_eq!(reloaded.status, loomwork_store::ExecutionStatus::Failed);
  }

  /// Seed scenario 1 (spec.md §8): `trigger_start -> send_sms(T) ->
  /// update_status(contacted)`. After one tick: one outbound message with
  /// the template's placeholder substituted, contact status `contacted`,
  /// enrollment `completed`.
  #[tokio::test]
  async fn linear_send_substitutes_placeholder_and_completes() {
    let store = SqliteStore::connect("sqlite::memory:").await.expect("open in-memory sqlite");
    store
      .put_template(&loomwork_store::Template {
        template_id: "welcome".to_string(),
        channel: "sms".to_string(),
        subject: None,
        body: "Hi {{first_name}}".to_string(),
      })
      .await
      .unwrap();
    store.put_setting("account_sid", "AC1").await.unwrap();
    store.put_setting("auth_token", "tok").await.unwrap();
    store.put_setting("phone_number", "+15550000000").await.unwrap();

    let def = WorkflowDef {
      workflow_id: "wf_send".to_string(),
      name: "Linear send".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: "wf_send".to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "send".to_string(),
          workflow_id: "wf_send".to_string(),
          kind: NodeKind::SendSms {
            template_id: "welcome".to_string(),
            from_number_override: None,
            label: None,
          },
          position: (1.0, 0.0),
        },
        Node {
          node_id: "mark".to_string(),
          workflow_id: "wf_send".to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (2.0, 0.0),
        },
      ],
      edges: vec![
        Edge {
          source_node_id: "start".to_string(),
          target_node_id: "send".to_string(),
          source_handle: None,
          label: None,
        },
        Edge {
          source_node_id: "send".to_string(),
          target_node_id: "mark".to_string(),
          source_handle: None,
          label: None,
        },
      ],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf_send", "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let sms = Arc::new(FakeSmsAdapter::new());
    let store: Arc<dyn ExecutionStore> = Arc::new(store);
    let core = ExecutorCore::new(
      store.clone(),
      Arc::new(ProcessorRegistry::new()),
      sms.clone(),
      Arc::new(FakeEmailAdapter::new()),
      EngineConfig::default(),
    );

    let result = core.run(&execution.execution_id).await.unwrap();
    assert_eq!(result.outcome, BatchOutcome::Completed);

    assert_eq!(sms.sent_count().await, 1);
    let sent = sms.sent.lock().await;
    assert_eq!(sent[0].body, "Hi Ana");

    let updated_contact = store.get_contact("c1").await.unwrap();
    assert_eq!(updated_contact.status, ContactStatus::Contacted);

    let reloaded = store.get_execution(&execution.execution_id).await.unwrap();
    let data = reloaded.data_map();
    let ids = data.get("sent_message_ids").and_then(|v| v.as_array()).unwrap();
    assert_eq!(ids.len(), 1);
  }

  /// Two `send_sms` nodes in sequence accumulate into
  /// `execution_data.sent_message_ids` rather than the second clobbering
  /// the first (the Executor Core's merge is shallow per spec §4.4.e; the
  /// processor itself is responsible for carrying the prior array forward).
  #[tokio::test]
  async fn sent_message_ids_accumulate_across_multiple_sends() {
    let store = SqliteStore::connect("sqlite::memory:").await.expect("open in-memory sqlite");
    store
      .put_template(&loomwork_store::Template {
        template_id: "t1".to_string(),
        channel: "sms".to_string(),
        subject: None,
        body: "first".to_string(),
      })
      .await
      .unwrap();
    store
      .put_template(&loomwork_store::Template {
        template_id: "t2".to_string(),
        channel: "sms".to_string(),
        subject: None,
        body: "second".to_string(),
      })
      .await
      .unwrap();
    store.put_setting("account_sid", "AC1").await.unwrap();
    store.put_setting("auth_token", "tok").await.unwrap();
    store.put_setting("phone_number", "+15550000000").await.unwrap();

    let def = WorkflowDef {
      workflow_id: "wf_double_send".to_string(),
      name: "Double send".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: "wf_double_send".to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "send1".to_string(),
          workflow_id: "wf_double_send".to_string(),
          kind: NodeKind::SendSms {
            template_id: "t1".to_string(),
            from_number_override: None,
            label: None,
          },
          position: (1.0, 0.0),
        },
        Node {
          node_id: "send2".to_string(),
          workflow_id: "wf_double_send".to_string(),
          kind: NodeKind::SendSms {
            template_id: "t2".to_string(),
            from_number_override: None,
            label: None,
          },
          position: (2.0, 0.0),
        },
      ],
      edges: vec![
        Edge {
          source_node_id: "start".to_string(),
          target_node_id: "send1".to_string(),
          source_handle: None,
          label: None,
        },
        Edge {
          source_node_id: "send1".to_string(),
          target_node_id: "send2".to_string(),
          source_handle: None,
          label: None,
        },
      ],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf_double_send", "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let sms = Arc::new(FakeSmsAdapter::new());
    let store: Arc<dyn ExecutionStore> = Arc::new(store);
    let core = ExecutorCore::new(
      store.clone(),
      Arc::new(ProcessorRegistry::new()),
      sms.clone(),
      Arc::new(FakeEmailAdapter::new()),
      EngineConfig::default(),
    );

    let result = core.run(&execution.execution_id).await.unwrap();
    assert_eq!(result.outcome, BatchOutcome::Completed);
    assert_eq!(sms.sent_count().await, 2);

    let reloaded = store.get_execution(&execution.execution_id).await.unwrap();
    let data = reloaded.data_map();
    let ids = data.get("sent_message_ids").and_then(|v| v.as_array()).unwrap();
    assert_eq!(ids.len(), 2, "both sends' ids must be present, not just the last one");
  }

  fn conditional_split_def(workflow_id: &str) -> WorkflowDef {
    use loomwork_model::{BoolOperator, Condition, ConditionGroup, ConditionOperator, Expression};

    WorkflowDef {
      workflow_id: workflow_id.to_string(),
      name: "Branch on status".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "split".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::ConditionalSplit {
            expression: Expression {
              groups: vec![ConditionGroup {
                conditions: vec![Condition {
                  field: "status".to_string(),
                  operator: ConditionOperator::Equals,
                  value: "new".to_string(),
                }],
                logical_operator: BoolOperator::And,
              }],
              group_operator: BoolOperator::And,
            },
          },
          position: (1.0, 0.0),
        },
        Node {
          node_id: "yes_branch".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (2.0, 0.0),
        },
        Node {
          node_id: "no_branch".to_string(),
          workflow_id: workflow_id.to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Qualified,
          },
          position: (2.0, 1.0),
        },
      ],
      edges: vec![
        Edge {
          source_node_id: "start".to_string(),
          target_node_id: "split".to_string(),
          source_handle: None,
          label: None,
        },
        Edge {
          source_node_id: "split".to_string(),
          target_node_id: "yes_branch".to_string(),
          source_handle: Some(loomwork_model::EdgeHandle::Yes),
          label: None,
        },
        Edge {
          source_node_id: "split".to_string(),
          target_node_id: "no_branch".to_string(),
          source_handle: Some(loomwork_model::EdgeHandle::No),
          label: None,
        },
      ],
    }
  }

  /// Seed scenario 3 (spec.md §8): `status equals "new"` takes the `yes`
  /// branch, anything else takes `no`.
  #[tokio::test]
  async fn conditional_split_takes_yes_branch_for_matching_contact() {
    let store = test_store().await;
    store.save_workflow(&conditional_split_def("wf_branch")).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf_branch", "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert_eq!(result.outcome, BatchOutcome::Completed);
    let updated = store.get_contact("c1").await.unwrap();
    assert_eq!(updated.status, ContactStatus::Contacted, "new contacts take the yes branch");
  }

  #[tokio::test]
  async fn conditional_split_takes_no_branch_for_non_matching_contact() {
    let store = test_store().await;
    store.save_workflow(&conditional_split_def("wf_branch2")).await.unwrap();
    let mut qualified = contact("c1");
    qualified.status = ContactStatus::Qualified;
    store.upsert_contact(&qualified).await.unwrap();
    let (_enrollment, execution) = store.create_enrollment("wf_branch2", "c1", "start", 3).await.unwrap();
    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert_eq!(result.outcome, BatchOutcome::Completed);
    let updated = store.get_contact("c1").await.unwrap();
    assert_eq!(
      updated.status,
      ContactStatus::Qualified,
      "the no branch's update_status is a same-value no-op here, but it must still be the node reached"
    );
  }

  /// Seed scenario 4 (spec.md §8): an inbound reply recorded before
  /// `stop_on_reply` runs stops the enrollment instead of advancing to the
  /// followup node.
  #[tokio::test]
  async fn stop_on_reply_stops_enrollment_when_a_reply_exists() {
    let store = test_store().await;
    let def = WorkflowDef {
      workflow_id: "wf_stop".to_string(),
      name: "Stop on reply".to_string(),
      description: None,
      enabled: true,
      nodes: vec![
        Node {
          node_id: "start".to_string(),
          workflow_id: "wf_stop".to_string(),
          kind: NodeKind::TriggerStart {
            trigger: TriggerConfig::Manual,
          },
          position: (0.0, 0.0),
        },
        Node {
          node_id: "gate".to_string(),
          workflow_id: "wf_stop".to_string(),
          kind: NodeKind::StopOnReply {
            channel: loomwork_model::ChannelFilter::Sms,
          },
          position: (1.0, 0.0),
        },
        Node {
          node_id: "followup".to_string(),
          workflow_id: "wf_stop".to_string(),
          kind: NodeKind::UpdateStatus {
            status: ContactStatus::Contacted,
          },
          position: (2.0, 0.0),
        },
      ],
      edges: vec![
        Edge {
          source_node_id: "start".to_string(),
          target_node_id: "gate".to_string(),
          source_handle: None,
          label: None,
        },
        Edge {
          source_node_id: "gate".to_string(),
          target_node_id: "followup".to_string(),
          source_handle: None,
          label: None,
        },
      ],
    };
    store.save_workflow(&def).await.unwrap();
    store.upsert_contact(&contact("c1")).await.unwrap();
    let (enrollment, execution) = store.create_enrollment("wf_stop", "c1", "start", 3).await.unwrap();

    store
      .create_message(&loomwork_store::Message {
        message_id: "inbound1".to_string(),
        contact_id: "c1".to_string(),
        channel: loomwork_model::Channel::Sms,
        direction: loomwork_model::MessageDirection::Inbound,
        subject: None,
        body: "Stop texting me".to_string(),
        status: loomwork_model::MessageStatus::Delivered,
        provider_id: None,
        provider_error: None,
        source: "webhook".to_string(),
        template_id: None,
        execution_id: None,
        created_at: Utc::now() + Duration::seconds(1),
      })
      .await
      .unwrap();

    store.claim_due_executions(10, 300, "runner-a").await.unwrap();

    let core = make_core(store.clone());
    let result = core.run(&execution.execution_id).await.unwrap();

    assert!(matches!(result.outcome, BatchOutcome::Stopped { .. }));
    if let BatchOutcome::Stopped { reason } = &result.outcome {
      assert_eq!(reason, "Contact replied via sms");
    }

    let reloaded_enrollment = store.get_active_enrollment("wf_stop", "c1").await.unwrap();
    assert!(reloaded_enrollment.is_none(), "the enrollment is no longer active");
    let _ = enrollment;
  }
}
