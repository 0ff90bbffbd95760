use async_trait::async_trait;
use loomwork_model::{Node, NodeKind, OnFailure, TriggerConfig};

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::successor;
use crate::step::StepResult;

/// Invokes another workflow for the same contact.
///
/// Rejects targets that aren't `sub_workflow`-triggered and circular
/// references (the contact already has an active enrollment in the
/// target). `mode=sync` is implemented as start-and-proceed with a pending
/// marker recorded in `execution_data.sub_workflow_calls` — no blocking
/// join is attempted; this is at least as safe as `mode=async` (no
/// deadlock, no lost child).
pub struct CallSubWorkflowProcessor;

#[async_trait]
impl NodeProcessor for CallSubWorkflowProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::CallSubWorkflow {
      target_workflow_id,
      input_mappings,
      mode,
      on_failure,
    } = &node.kind
    else {
      unreachable!("registry dispatches by node type");
    };

    let next_node_id = successor(&ctx.workflow, &node.node_id, None);

    match self.invoke(ctx, target_workflow_id, input_mappings, *mode).await {
      Ok(data) => Ok(StepResult::advance(next_node_id).with_execution_data(data)),
      Err(reason) => match on_failure {
        OnFailure::Continue => Ok(StepResult::advance(next_node_id).with_error(reason)),
        OnFailure::Fail => Err(ProcessorError::SubWorkflowFailed(reason)),
      },
    }
  }
}

impl CallSubWorkflowProcessor {
  async fn invoke(
    &self,
    ctx: &NodeContext,
    target_workflow_id: &str,
    input_mappings: &std::collections::HashMap<String, String>,
    mode: loomwork_model::SubWorkflowMode,
  ) -> Result<serde_json::Value, String> {
    let target = ctx
      .store
      .get_workflow(target_workflow_id)
      .await
      .map_err(|e| format!("target workflow not found: {e}"))?;

    let trigger = target
      .trigger_node()
      .ok_or_else(|| "target workflow has no trigger_start node".to_string())?;
    let trigger_config = match &trigger.kind {
      NodeKind::TriggerStart { trigger } => trigger,
      _ => unreachable!("trigger_node() only returns TriggerStart nodes"),
    };
    if !matches!(trigger_config, TriggerConfig::SubWorkflow) {
      return Err(format!(
        "workflow '{target_workflow_id}' is not invokable as a sub-workflow (trigger is not sub_workflow)"
      ));
    }

    if ctx
      .store
      .get_active_enrollment(target_workflow_id, &ctx.contact.contact_id)
      .await
      .map_err(|e| e.to_string())?
      .is_some()
    {
      return Err("circular_reference".to_string());
    }

    let resolved_inputs: std::collections::HashMap<String, String> = input_mappings
      .iter()
      .map(|(key, expr)| (key.clone(), resolve_input_mapping(expr, &ctx.contact)))
      .collect();

    let (child_enrollment, _child_execution) = ctx
      .store
      .create_enrollment(
        target_workflow_id,
        &ctx.contact.contact_id,
        &trigger.node_id,
        ctx.execution.max_attempts,
      )
      .await
      .map_err(|e| e.to_string())?;

    Ok(serde_json::json!({
      "sub_workflow_calls": [{
        "target_workflow_id": target_workflow_id,
        "child_enrollment_id": child_enrollment.enrollment_id,
        "mode": mode,
        "inputs": resolved_inputs,
        "status": "pending",
      }]
    }))
  }
}

/// Currently supported mapping form is `{{contact.<field>}}`; anything else
/// passes through as a literal.
fn resolve_input_mapping(expr: &str, contact: &loomwork_model::Contact) -> String {
  let trimmed = expr.trim();
  if let Some(inner) = trimmed.strip_prefix("{{").and_then(|s| s.strip_suffix("}}")) {
    if let Some(field) = inner.trim().strip_prefix("contact.") {
      return contact.resolve_field(field.trim());
    }
  }
  expr.to_string()
}
