use async_trait::async_trait;
use loomwork_model::{EdgeHandle, Node, NodeKind};

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::successor;
use crate::step::StepResult;

/// Evaluates the expression tree and picks the successor by handle. If the
/// chosen branch has no edge, the workflow completes gracefully — this is a
/// `None` `next_node_id`, not an error.
pub struct ConditionalSplitProcessor;

#[async_trait]
impl NodeProcessor for ConditionalSplitProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::ConditionalSplit { expression } = &node.kind else {
      unreachable!("registry dispatches by node type");
    };

    let result = loomwork_condition::evaluate(expression, &ctx.contact);
    let handle = if result { EdgeHandle::Yes } else { EdgeHandle::No };
    let next_node_id = successor(&ctx.workflow, &node.node_id, Some(handle));

    Ok(
      StepResult::advance(next_node_id)
        .with_execution_data(serde_json::json!({ "last_condition_result": result })),
    )
  }
}
