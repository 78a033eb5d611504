/// Monitoring engine module
///
/// This module is responsible for:
/// - Probing HTTP endpoints and classifying outcomes
/// - Tracking per-endpoint downtime streaks and alert debouncing
/// - Running full check cycles and driving them on a fixed period
pub mod cycle;
pub mod prober;
pub mod scheduler;
pub mod tracker;
pub mod types;


pub use cycle::CheckCycleRunner;
pub use prober::Probe;
pub use scheduler::Scheduler;
