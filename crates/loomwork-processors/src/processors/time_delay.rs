use async_trait::async_trait;
use chrono::{Duration, Utc};
use loomwork_model::{Node, NodeKind};

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::successor;
use crate::step::StepResult;

/// `next_run_at = now + duration·unit`. The executor must persist and
/// yield — an execution never advances past a `time_delay` within one
/// batch. `time_delay(0, _)` still yields:
/// it schedules `next_run_at = now`, relying on the next tick to pick it
/// back up rather than looping through it in the same batch.
pub struct TimeDelayProcessor;

#[async_trait]
impl NodeProcessor for TimeDelayProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::TimeDelay { duration, unit } = &node.kind else {
      unreachable!("registry dispatches by node type");
    };

    let seconds = (*duration as i64).saturating_mul(unit.as_seconds());
    let next_run_at = Utc::now() + Duration::seconds(seconds);

    Ok(StepResult::delay(
      successor(&ctx.workflow, &node.node_id, None),
      next_run_at,
    ))
  }
}
