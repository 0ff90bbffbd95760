mod call_sub_workflow;
mod conditional_split;
mod return_to_parent;
mod send_email;
mod send_sms;
mod stop_on_reply;
mod time_delay;
mod trigger_start;
mod update_status;

pub use call_sub_workflow::CallSubWorkflowProcessor;
pub use conditional_split::ConditionalSplitProcessor;
pub use return_to_parent::ReturnToParentProcessor;
pub use send_email::SendEmailProcessor;
pub use send_sms::SendSmsProcessor;
pub use stop_on_reply::StopOnReplyProcessor;
pub use time_delay::TimeDelayProcessor;
pub use trigger_start::TriggerStartProcessor;
pub use update_status::UpdateStatusProcessor;

use loomwork_model::{EdgeHandle, Workflow};

/// Shared helper: resolve a node's successor through the workflow's
/// adjacency, by handle. Every processor except `stop_on_reply` and
/// `return_to_parent` calls this with `handle = None`; `conditional_split`
/// calls it once per branch.
pub(crate) fn successor(workflow: &Workflow, node_id: &str, handle: Option<EdgeHandle>) -> Option<String> {
  workflow.graph().successor(node_id, handle).map(str::to_string)
}

/// `execution_data.sent_message_ids` accumulates across every `send_sms`/
/// `send_email` node an execution passes through (spec §3's "accumulates
/// outputs"), but the Executor Core's merge into `execution_data` is
/// shallow (spec §4.4.e) — a bare `{"sent_message_ids": [id]}` patch would
/// clobber ids recorded by an earlier send node in the same enrollment.
/// Processors read the prior array off the freshly-loaded `ctx.execution`
/// and hand back the full accumulated array as their patch instead.
pub(crate) fn append_sent_message_id(ctx: &crate::context::NodeContext, message_id: &str) -> serde_json::Value {
  let mut ids: Vec<serde_json::Value> = ctx
    .execution
    .data_map()
    .get("sent_message_ids")
    .and_then(|v| v.as_array())
    .cloned()
    .unwrap_or_default();
  ids.push(serde_json::Value::String(message_id.to_string()));
  serde_json::json!({ "sent_message_ids": ids })
}
