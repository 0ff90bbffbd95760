use std::sync::Arc;

use loomwork_config::EngineConfig;
use loomwork_executor::{ExecutionResult, ExecutorCore};
use loomwork_store::ExecutionStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::SchedulerError;

/// Claims due executions at a configurable cadence and hands each to the
/// Executor Core, independently: each dispatched execution is processed
/// on its own, so a failure in one never blocks the others.
pub struct TickScheduler {
  store: Arc<dyn ExecutionStore>,
  executor: Arc<ExecutorCore>,
  config: EngineConfig,
  lease_holder: String,
}

impl TickScheduler {
  pub fn new(store: Arc<dyn ExecutionStore>, executor: Arc<ExecutorCore>, config: EngineConfig) -> Self {
    let lease_holder = format!("worker-{}", uuid::Uuid::new_v4());
    Self {
      store,
      executor,
      config,
      lease_holder,
    }
  }

  /// Claim up to `claim_batch_size` due executions and run each to its next
  /// wait/terminal point, fanning out across tasks (the worker pool) and
  /// awaiting them all before the tick ends.
  #[instrument(name = "scheduler_tick", skip(self))]
  pub async fn tick(&self) -> Result<Vec<ExecutionResult>, SchedulerError> {
    let claimed = self
      .store
      .claim_due_executions(self.config.claim_batch_size, self.config.lease_ttl_s as i64, &self.lease_holder)
      .await?;

    if claimed.is_empty() {
      return Ok(Vec::new());
    }
    info!(count = claimed.len(), "claimed due executions");

    let handles: Vec<_> = claimed
      .into_iter()
      .map(|execution| {
        let executor = self.executor.clone();
        tokio::spawn(async move { executor.run(&execution.execution_id).await })
      })
      .collect();

    let joined = futures::future::join_all(handles).await;

    let mut results = Vec::with_capacity(joined.len());
    for outcome in joined {
      match outcome {
        Ok(Ok(result)) => results.push(result),
        Ok(Err(e)) => error!(error = %e, "execution batch failed"),
        Err(e) => error!(error = %e, "executor task panicked or was cancelled"),
      }
    }
    Ok(results)
  }

  /// Run the tick loop until `cancel` fires. Each tick is independent of the
  /// next; a slow or failing batch never blocks the loop from advancing.
  pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(self.config.tick_interval_ms));
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("tick scheduler cancelled");
          break;
        }
        _ = interval.tick() => {
          if let Err(e) = self.tick().await {
            warn!(error = %e, "tick failed");
          }
        }
      }
    }
  }
}
