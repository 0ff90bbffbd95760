use std::collections::HashMap;
use std::sync::Arc;

use loomwork_adapters::{EmailAdapter, SmsAdapter};
use loomwork_model::{Contact, Workflow};
use loomwork_store::{Enrollment, Execution, ExecutionStore};

/// `(node, context) → StepResult`.
///
/// Carries everything a processor needs to act: the locked workflow graph
/// (so a processor can resolve its own successor via `workflow.graph()`),
/// the enrollment and contact, a handle to the store for the few
/// processors that read/write beyond the execution itself (messages,
/// contact status, sub-workflow enrollments, reply queries), and the
/// provider adapters. Settings are loaded once per tick and passed in; no
/// caching across ticks.
pub struct NodeContext {
  pub workflow: Workflow,
  pub enrollment: Enrollment,
  pub execution: Execution,
  pub contact: Contact,
  pub store: Arc<dyn ExecutionStore>,
  pub sms: Arc<dyn SmsAdapter>,
  pub email: Arc<dyn EmailAdapter>,
  pub settings: HashMap<String, String>,
}
