//! Tick Scheduler: periodically claims due executions and hands them to
//! the Executor Core, and hosts the enrollment-trigger fan-out
//! (`enroll_contact` and its event-driven callers).

mod enroll;
mod error;
mod scheduler;
mod triggers;

pub use enroll::{enroll_contact, EnrollOutcome};
pub use error::SchedulerError;
pub use scheduler::TickScheduler;
pub use triggers::{contact_added, manual, scheduled, status_changed, tag_added};
