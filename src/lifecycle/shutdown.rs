use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use super::{Reporter, SchedulableSet};
use crate::config::{ReporterFailurePolicy, ShutdownConfig};
use crate::types::{AgentError, Result, ShutdownReport, StopOutcome, StopRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    NotStarted,
    StoppingSchedulables,
    StoppingReporter,
    Completed,
}

/// Runs the termination sequence: every schedulable is stopped in order,
/// each inside its own failure boundary, then the reporter is stopped once.
pub struct ShutdownCoordinator {
    sequence: Arc<ShutdownSequence>,
    triggered: AtomicBool,
    phase_rx: watch::Receiver<ShutdownPhase>,
}

/// State the spawned sequence task owns a share of.
struct ShutdownSequence {
    schedulables: SchedulableSet,
    reporter: Arc<dyn Reporter>,
    config: ShutdownConfig,
    phase_tx: watch::Sender<ShutdownPhase>,
}

impl ShutdownCoordinator {
    pub fn new(
        schedulables: SchedulableSet,
        reporter: Arc<dyn Reporter>,
        config: ShutdownConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (phase_tx, phase_rx) = watch::channel(ShutdownPhase::NotStarted);
        Ok(Self {
            sequence: Arc::new(ShutdownSequence {
                schedulables,
                reporter,
                config,
                phase_tx,
            }),
            triggered: AtomicBool::new(false),
            phase_rx,
        })
    }

    pub fn builder() -> ShutdownCoordinatorBuilder {
        ShutdownCoordinatorBuilder::default()
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase_rx.borrow()
    }

    pub fn phase_receiver(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase_rx.clone()
    }

    /// Resolves once the sequence has run to the end.
    pub async fn wait_completed(&self) {
        let mut rx = self.phase_rx.clone();
        let _ = rx.wait_for(|phase| *phase == ShutdownPhase::Completed).await;
    }

    /// Runs the sequence on the first call. Later or concurrent calls return
    /// `Ok(None)` without touching any component.
    ///
    /// The sequence runs on its own task, so dropping or aborting the caller
    /// does not interrupt it; use [`Self::wait_completed`] to observe the end.
    ///
    /// Schedulable failures (errors, panics, timeouts) are logged and recorded
    /// in the report. A reporter failure is returned as an error under
    /// [`ReporterFailurePolicy::Propagate`] and recorded otherwise.
    pub async fn run_shutdown(&self) -> Result<Option<ShutdownReport>> {
        if self.triggered.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown already triggered, ignoring");
            return Ok(None);
        }

        let sequence = self.sequence.clone();
        match tokio::spawn(async move { sequence.run().await }).await {
            Ok(result) => result.map(Some),
            Err(e) => Err(AgentError::Internal(format!(
                "shutdown sequence task failed: {}",
                e
            ))),
        }
    }
}

impl ShutdownSequence {
    async fn run(&self) -> Result<ShutdownReport> {
        let started = Instant::now();

        let _ = self.phase_tx.send(ShutdownPhase::StoppingSchedulables);
        tracing::info!(count = self.schedulables.len(), "Stopping schedulables");

        let mut records = Vec::with_capacity(self.schedulables.len());
        for schedulable in self.schedulables.iter() {
            let name = schedulable.name();
            let handle = schedulable.clone();
            let record = self
                .stop_isolated(name, async move { handle.stop().await })
                .await;

            match &record.outcome {
                StopOutcome::Stopped => {
                    tracing::debug!(name, elapsed_ms = record.elapsed_ms, "Schedulable stopped")
                }
                StopOutcome::Failed { reason } => {
                    tracing::error!(name, error = %reason, "Schedulable failed to stop")
                }
                StopOutcome::Panicked { message } => {
                    tracing::error!(name, panic = %message, "Schedulable panicked while stopping")
                }
                StopOutcome::TimedOut { timeout_ms } => {
                    tracing::warn!(name, timeout_ms, "Schedulable stop timed out")
                }
            }
            records.push(record);
        }

        let _ = self.phase_tx.send(ShutdownPhase::StoppingReporter);
        let reporter_name = self.reporter.name();
        tracing::info!(name = reporter_name, "Stopping reporter");

        let reporter = self.reporter.clone();
        let reporter_record = self
            .stop_isolated(reporter_name, async move { reporter.stop().await })
            .await;

        let _ = self.phase_tx.send(ShutdownPhase::Completed);

        if let Some(err) = reporter_error(&reporter_record) {
            match self.config.reporter_policy {
                ReporterFailurePolicy::Propagate => {
                    tracing::error!(name = reporter_name, error = %err, "Reporter failed to stop");
                    return Err(err);
                }
                ReporterFailurePolicy::BestEffort => {
                    tracing::warn!(
                        name = reporter_name,
                        error = %err,
                        "Reporter failed to stop, continuing"
                    );
                }
            }
        }

        let report = ShutdownReport {
            schedulables: records,
            reporter: reporter_record,
            elapsed_ms: elapsed_ms(started),
        };
        tracing::info!(
            elapsed_ms = report.elapsed_ms,
            failures = report.failures().count(),
            "Shutdown complete"
        );

        Ok(report)
    }

    /// Runs one `stop()` on its own task so that a panic or a hang is
    /// contained to that component.
    async fn stop_isolated<F>(&self, name: &'static str, stop: F) -> StopRecord
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let started = Instant::now();
        let mut task = tokio::spawn(stop);

        let joined = match self.config.stop_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    return StopRecord {
                        name,
                        outcome: StopOutcome::TimedOut {
                            timeout_ms: timeout.as_millis() as u64,
                        },
                        elapsed_ms: elapsed_ms(started),
                    };
                }
            },
            None => task.await,
        };

        let outcome = match joined {
            Ok(Ok(())) => StopOutcome::Stopped,
            Ok(Err(e)) => StopOutcome::Failed {
                reason: format!("{:#}", e),
            },
            Err(e) if e.is_panic() => StopOutcome::Panicked {
                message: panic_message(e.into_panic()),
            },
            Err(e) => StopOutcome::Failed {
                reason: e.to_string(),
            },
        };

        StopRecord {
            name,
            outcome,
            elapsed_ms: elapsed_ms(started),
        }
    }
}

#[derive(Default)]
pub struct ShutdownCoordinatorBuilder {
    schedulables: SchedulableSet,
    reporter: Option<Arc<dyn Reporter>>,
    config: ShutdownConfig,
}

impl ShutdownCoordinatorBuilder {
    pub fn schedulable(mut self, schedulable: Arc<dyn super::Schedulable>) -> Self {
        self.schedulables.register(schedulable);
        self
    }

    pub fn schedulables(mut self, schedulables: SchedulableSet) -> Self {
        self.schedulables = schedulables;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn config(mut self, config: ShutdownConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ShutdownCoordinator> {
        let reporter = self
            .reporter
            .ok_or_else(|| AgentError::Config("no reporter configured".to_string()))?;
        ShutdownCoordinator::new(self.schedulables, reporter, self.config)
    }
}

/// The error a failed reporter stop surfaces as; `None` when it stopped.
fn reporter_error(record: &StopRecord) -> Option<AgentError> {
    let name = record.name;
    match &record.outcome {
        StopOutcome::Stopped => None,
        StopOutcome::Failed { reason } => Some(AgentError::ReporterStop {
            name,
            reason: reason.clone(),
        }),
        StopOutcome::Panicked { message } => Some(AgentError::Panicked {
            name,
            message: message.clone(),
        }),
        StopOutcome::TimedOut { timeout_ms } => Some(AgentError::Timeout {
            name,
            timeout: Duration::from_millis(*timeout_ms),
        }),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
