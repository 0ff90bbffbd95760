use std::collections::HashMap;

use loomwork_model::Node;

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::{
  CallSubWorkflowProcessor, ConditionalSplitProcessor, ReturnToParentProcessor, SendEmailProcessor,
  SendSmsProcessor, StopOnReplyProcessor, TimeDelayProcessor, TriggerStartProcessor, UpdateStatusProcessor,
};
use crate::step::StepResult;

/// Dispatches a node to its processor by `NodeKind::type_name()`. The set of
/// node types is closed; this table just maps each to its implementation.
pub struct ProcessorRegistry {
  processors: HashMap<&'static str, Box<dyn NodeProcessor>>,
}

impl ProcessorRegistry {
  pub fn new() -> Self {
    let mut processors: HashMap<&'static str, Box<dyn NodeProcessor>> = HashMap::new();
    processors.insert("trigger_start", Box::new(TriggerStartProcessor));
    processors.insert("time_delay", Box::new(TimeDelayProcessor));
    processors.insert("conditional_split", Box::new(ConditionalSplitProcessor));
    processors.insert("send_sms", Box::new(SendSmsProcessor));
    processors.insert("send_email", Box::new(SendEmailProcessor));
    processors.insert("update_status", Box::new(UpdateStatusProcessor));
    processors.insert("stop_on_reply", Box::new(StopOnReplyProcessor));
    processors.insert("call_sub_workflow", Box::new(CallSubWorkflowProcessor));
    processors.insert("return_to_parent", Box::new(ReturnToParentProcessor));
    Self { processors }
  }

  /// Override (or add) the processor for a node type. The node-type set
  /// itself is closed, but dispatch is pluggable — this is the seam tests
  /// use to substitute a misbehaving processor without standing up a real
  /// provider outage.
  pub fn register(&mut self, node_type: &'static str, processor: Box<dyn NodeProcessor>) {
    self.processors.insert(node_type, processor);
  }

  pub async fn dispatch(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let processor = self
      .processors
      .get(node.kind.type_name())
      .ok_or_else(|| ProcessorError::UnknownNodeType(node.kind.type_name().to_string()))?;
    processor.execute(node, ctx).await
  }
}

impl Default for ProcessorRegistry {
  fn default() -> Self {
    Self::new()
  }
}
