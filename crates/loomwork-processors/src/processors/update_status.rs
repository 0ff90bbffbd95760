use async_trait::async_trait;
use loomwork_model::{Node, NodeKind};

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::successor;
use crate::step::StepResult;

/// Mutates the contact's `status`. Non-retryable: a store failure here is
/// surfaced as fatal rather than handed to the executor's normal
/// recoverable-retry path.
pub struct UpdateStatusProcessor;

#[async_trait]
impl NodeProcessor for UpdateStatusProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::UpdateStatus { status } = &node.kind else {
      unreachable!("registry dispatches by node type");
    };

    ctx
      .store
      .update_contact_status(&ctx.contact.contact_id, *status)
      .await
      .map_err(|e| ProcessorError::UpdateStatusFailed(e.to_string()))?;

    Ok(
      StepResult::advance(successor(&ctx.workflow, &node.node_id, None))
        .with_output_data(serde_json::json!({ "status": status.as_str() })),
    )
  }
}
