pub mod config;
pub mod lifecycle;
pub mod types;
pub mod worker;

#[cfg(test)]
pub mod test_utils;

pub use config::{AgentConfig, ReporterFailurePolicy, ShutdownConfig};
pub use lifecycle::{Reporter, Schedulable, SchedulableSet, ShutdownCoordinator};
pub use types::error::{AgentError, Result};
