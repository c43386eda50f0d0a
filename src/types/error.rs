use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reporter '{name}' failed to stop: {reason}")]
    ReporterStop { name: &'static str, reason: String },

    #[error("Component '{name}' did not stop within {timeout:?}")]
    Timeout {
        name: &'static str,
        timeout: Duration,
    },

    #[error("Component '{name}' panicked while stopping: {message}")]
    Panicked { name: &'static str, message: String },

    #[error("Signal error: {0}")]
    Signal(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_stop_display() {
        let err = AgentError::ReporterStop {
            name: "log_reporter",
            reason: "sink closed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Reporter 'log_reporter' failed to stop: sink closed"
        );
    }
}
