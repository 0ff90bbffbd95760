//! Node Processor Registry: one `NodeProcessor` implementation per workflow
//! node type, dispatched by `ProcessorRegistry` and fed by a `NodeContext`
//! the Executor Core assembles per step.

mod context;
mod error;
mod processor;
mod processors;
mod registry;
mod step;
mod template;

pub use context::NodeContext;
pub use error::ProcessorError;
pub use processor::NodeProcessor;
pub use processors::{
  CallSubWorkflowProcessor, ConditionalSplitProcessor, ReturnToParentProcessor, SendEmailProcessor,
  SendSmsProcessor, StopOnReplyProcessor, TimeDelayProcessor, TriggerStartProcessor, UpdateStatusProcessor,
};
pub use registry::ProcessorRegistry;
pub use step::StepResult;
pub use template::{placeholder_map, substitute};
