//! Background Tasks Module
//!
//! Tasks run by the workload driver alongside a shared cache.
//!
//! # Tasks
//! - Stats report: logs cache statistics at a configured interval
//! - Workload: drives a deterministic operation mix from blocking workers

mod report;
mod workload;

pub use report::spawn_report_task;
pub use workload::{run_worker, WorkerSummary};
