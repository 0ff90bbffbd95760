use async_trait::async_trait;
use loomwork_model::Node;

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::step::StepResult;

/// One implementation per node type. A processor reads from
/// `ctx` and returns the transition it wants; it never writes enrollment,
/// execution, or contact state itself — the Executor Core persists
/// whatever the `StepResult` describes.
#[async_trait]
pub trait NodeProcessor: Send + Sync {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError>;
}
