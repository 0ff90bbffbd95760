//! Node types and their payloads.
//!
//! `NodeDef`/`NodeKindDef` (see `def.rs`) are the raw, as-authored shape; a
//! `Node` here is that same payload after the graph it belongs to has passed
//! validation (see `workflow.rs`). Validating a node payload does not change
//! its shape, so `Node`/`NodeKind` are reused directly as both the raw and
//! the locked representation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::condition::Expression;
use crate::enums::{ChannelFilter, ContactStatus, DurationUnit, OnFailure, SubWorkflowMode};

/// A node belonging to exactly one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub node_id: String,
  pub workflow_id: String,
  #[serde(flatten)]
  pub kind: NodeKind,
  /// Editor metadata only; not semantic to execution.
  #[serde(default)]
  pub position: (f64, f64),
}

/// Trigger configuration carried by a `trigger_start` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger_type", rename_all = "snake_case")]
pub enum TriggerConfig {
  Manual,
  ContactAdded,
  TagAdded { tag: String },
  StatusChanged { to_status: Option<ContactStatus> },
  Scheduled { cron: String },
  /// Marks this workflow as invokable via `call_sub_workflow` from another
  /// workflow. A `call_sub_workflow` node's target must resolve to a
  /// workflow whose `trigger_start` is of this variant.
  SubWorkflow,
}

/// The closed set of node types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
  TriggerStart {
    trigger: TriggerConfig,
  },
  TimeDelay {
    duration: u64,
    unit: DurationUnit,
  },
  ConditionalSplit {
    expression: Expression,
  },
  SendSms {
    template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_number_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
  },
  SendEmail {
    template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_email_override: Option<String>,
  },
  UpdateStatus {
    status: ContactStatus,
  },
  StopOnReply {
    channel: ChannelFilter,
  },
  CallSubWorkflow {
    target_workflow_id: String,
    #[serde(default)]
    input_mappings: HashMap<String, String>,
    mode: SubWorkflowMode,
    on_failure: OnFailure,
  },
  ReturnToParent {
    status: ReturnStatus,
    #[serde(default)]
    outputs: HashMap<String, String>,
  },
}

impl NodeKind {
  /// The `type` discriminant used for processor dispatch and wire encoding.
  pub fn type_name(&self) -> &'static str {
    match self {
      NodeKind::TriggerStart { .. } => "trigger_start",
      NodeKind::TimeDelay { .. } => "time_delay",
      NodeKind::ConditionalSplit { .. } => "conditional_split",
      NodeKind::SendSms { .. } => "send_sms",
      NodeKind::SendEmail { .. } => "send_email",
      NodeKind::UpdateStatus { .. } => "update_status",
      NodeKind::StopOnReply { .. } => "stop_on_reply",
      NodeKind::CallSubWorkflow { .. } => "call_sub_workflow",
      NodeKind::ReturnToParent { .. } => "return_to_parent",
    }
  }

  /// Whether a node of this kind may carry an outgoing edge tagged with a
  /// `conditional_split` handle (`yes`/`no`).
  pub fn supports_handles(&self) -> bool {
    matches!(self, NodeKind::ConditionalSplit { .. })
  }
}

/// Return status recorded by a `return_to_parent` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
  Success,
  Failure,
}
