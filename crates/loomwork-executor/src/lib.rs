//! Executor Core: advances one execution through its workflow graph at a
//! time, dispatching each node to the [`loomwork_processors`] registry and
//! persisting every transition through an [`loomwork_store::ExecutionStore`].

mod error;
mod executor;
mod result;

pub use executor::ExecutorCore;
pub use error::ExecutorError;
pub use result::{BatchOutcome, ExecutionResult};
