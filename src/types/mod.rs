pub mod error;
pub mod report;

pub use error::{AgentError, Result};
pub use report::{ShutdownReport, StopOutcome, StopRecord};
