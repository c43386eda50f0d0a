use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use super::Sample;
use crate::lifecycle::Schedulable;

/// Runs a probe on a fixed interval and forwards each reading to a sink.
pub struct IntervalSampler {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<u64>>>,
}

impl IntervalSampler {
    pub fn spawn<P>(
        name: &'static str,
        period: Duration,
        sink: mpsc::Sender<Sample>,
        mut probe: P,
    ) -> Self
    where
        P: FnMut() -> u64 + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut taken = 0u64;

            loop {
                tokio::select! {
                    biased;

                    _ = stop_rx.changed() => break,

                    _ = interval.tick() => {
                        let sample = Sample {
                            source: name,
                            value: probe(),
                        };
                        if sink.send(sample).await.is_err() {
                            tracing::warn!(name, "Sample sink closed, sampler exiting");
                            break;
                        }
                        taken += 1;
                    }
                }
            }

            taken
        });

        tracing::info!(name, period_ms = period.as_millis() as u64, "Sampler started");

        Self {
            name,
            stop_tx,
            handle: Mutex::new(Some(handle)),
        }
    }
}

#[async_trait]
impl Schedulable for IntervalSampler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let _ = self.stop_tx.send(true);

        let Some(handle) = self.handle.lock().await.take() else {
            tracing::debug!(name = self.name, "Sampler already stopped");
            return Ok(());
        };

        let taken = handle
            .await
            .with_context(|| format!("sampler '{}' task failed", self.name))?;
        tracing::info!(name = self.name, samples = taken, "Sampler stopped");
        Ok(())
    }
}
