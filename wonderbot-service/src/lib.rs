pub mod processor;
pub mod scheduler;

pub use processor::{BatchProcessor, BatchSummary, Outcome, PassSummary};
pub use scheduler::Scheduler;
