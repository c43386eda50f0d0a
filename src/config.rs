use std::time::Duration;

use crate::types::{AgentError, Result};

/// What a failing reporter stop does to the outcome of the whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReporterFailurePolicy {
    /// Return the reporter's failure to the caller of `run_shutdown`.
    #[default]
    Propagate,
    /// Record the failure in the report like any schedulable failure.
    BestEffort,
}

impl std::str::FromStr for ReporterFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            _ => Err(format!("Unknown reporter policy: {}", s)),
        }
    }
}

impl std::fmt::Display for ReporterFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagate"),
            Self::BestEffort => write!(f, "best_effort"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Upper bound for each individual `stop()` call. `None` waits forever.
    pub stop_timeout: Option<Duration>,
    pub reporter_policy: ReporterFailurePolicy,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Some(Duration::from_secs(10)),
            reporter_policy: ReporterFailurePolicy::Propagate,
        }
    }
}

impl ShutdownConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stop_timeout == Some(Duration::ZERO) {
            return Err(AgentError::Config(
                "stop timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub shutdown: ShutdownConfig,
    pub sample_interval: Duration,
    pub log_level: String,
}
