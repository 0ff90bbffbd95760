use async_trait::async_trait;
use loomwork_model::{Node, NodeKind};

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::step::StepResult;
use crate::template::{placeholder_map, substitute};

/// Terminal node: the executor marks the enrollment `completed` because
/// `next_node_id` comes back `None`. Output-variable expressions are
/// resolved against the contact (the same `{{placeholder}}` substitution
/// as message bodies) and recorded on the final log's `output_data` for a
/// parent workflow's `call_sub_workflow` node to consume.
pub struct ReturnToParentProcessor;

#[async_trait]
impl NodeProcessor for ReturnToParentProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::ReturnToParent { status, outputs } = &node.kind else {
      unreachable!("registry dispatches by node type");
    };

    let map = placeholder_map(&ctx.contact);
    let resolved_outputs: serde_json::Map<String, serde_json::Value> = outputs
      .iter()
      .map(|(key, expr)| (key.clone(), serde_json::Value::String(substitute(expr, &map))))
      .collect();

    Ok(StepResult::advance(None).with_output_data(serde_json::json!({
      "status": status,
      "outputs": resolved_outputs,
    })))
  }
}
