use async_trait::async_trait;
use loomwork_model::Node;

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::successor;
use crate::step::StepResult;

/// Pure pass-through: the enrollment was just created pointing at this
/// node, so there is nothing to evaluate. Advances immediately.
pub struct TriggerStartProcessor;

#[async_trait]
impl NodeProcessor for TriggerStartProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    Ok(StepResult::advance(successor(&ctx.workflow, &node.node_id, None)))
  }
}
