//! Follow-up scheduling, execution, and response-driven cancellation

mod executor;
mod monitor;
mod scheduler;
mod worker;

pub use executor::{FireOutcome, FollowUpError, FollowUpExecutor, SweepReport};
pub use monitor::ResponseMonitor;
pub use scheduler::FollowUpScheduler;
pub use worker::FollowUpWorker;
