//! Host-side trigger: waits for a process termination signal and hands off
//! to a [`ShutdownCoordinator`].

use std::future::Future;

use super::ShutdownCoordinator;
use crate::types::{AgentError, Result, ShutdownReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl TerminationSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "sigint",
            Self::Terminate => "sigterm",
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn wait_for_termination() -> Result<TerminationSignal> {
    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|e| AgentError::Signal(e.to_string()))?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.map_err(|e| AgentError::Signal(e.to_string()))?;
            Ok(TerminationSignal::Interrupt)
        },
        _ = async {
            #[cfg(unix)]
            {
                terminate.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => Ok(TerminationSignal::Terminate),
    }
}

/// Waits for `trigger` and then runs the termination sequence.
pub async fn run_on<F>(
    coordinator: &ShutdownCoordinator,
    trigger: F,
) -> Result<Option<ShutdownReport>>
where
    F: Future<Output = Result<TerminationSignal>>,
{
    let signal = trigger.await?;
    tracing::info!(signal = signal.as_str(), "Termination signal received");
    coordinator.run_shutdown().await
}

pub async fn run_on_termination(
    coordinator: &ShutdownCoordinator,
) -> Result<Option<ShutdownReport>> {
    run_on(coordinator, wait_for_termination()).await
}
