//! loomwork workflow graph and contact model.
//!
//! This crate provides the raw, as-authored workflow shape (`WorkflowDef`,
//! `Node`, `Edge`) and the validated, locked graph ready for execution
//! (`Workflow`), plus the `Contact` record the condition evaluator and
//! processors operate against.
//!
//! Key difference from a pre-validated def: graph structure is checked (one
//! trigger, unique node ids, no orphan edges, no duplicate
//! `conditional_split` handles) and `Graph` adjacency is built for O(1)
//! successor lookup.

mod condition;
mod contact;
mod def;
mod edge;
mod enums;
mod error;
mod graph;
mod node;
mod workflow;

pub use condition::{Condition, ConditionGroup, ConditionOperator, Expression};
pub use contact::Contact;
pub use def::WorkflowDef;
pub use edge::Edge;
pub use enums::{
  BoolOperator, Channel, ChannelFilter, ContactStatus, DurationUnit, EdgeHandle,
  MessageDirection, MessageStatus, OnFailure, SubWorkflowMode,
};
pub use error::WorkflowError;
pub use graph::Graph;
pub use node::{Node, NodeKind, ReturnStatus, TriggerConfig};
pub use workflow::Workflow;
