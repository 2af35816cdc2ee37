/// Monitoring engine module - the uptime worker's core pipeline
///
/// This module is responsible for:
/// - Validating raw check records before they are probed
/// - Executing HTTP/HTTPS probes with per-check timeouts
/// - Folding probe outcomes into persisted check state and alerts
/// - Scheduling probe and log-rotation passes
pub mod prober;
pub mod processor;
pub mod scheduler;
pub mod types;
pub mod validation;


pub use prober::Prober;
pub use processor::OutcomeProcessor;
pub use scheduler::{Worker, WorkerSettings};
pub use types::{Check, CheckState, Outcome};
