use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use super::Sample;
use crate::lifecycle::Reporter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub count: u64,
    pub sum: u64,
    pub last: u64,
}

impl SourceStats {
    fn record(&mut self, value: u64) {
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
        self.last = value;
    }
}

pub type SampleTotals = BTreeMap<&'static str, SourceStats>;

/// Aggregates samples per source and flushes the totals when stopped.
pub struct SampleReporter {
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<SampleTotals>>>,
    flushed: std::sync::Mutex<Option<SampleTotals>>,
}

impl SampleReporter {
    /// Starts the aggregation task. Producers send to the returned sender.
    pub fn spawn(capacity: usize) -> (Self, mpsc::Sender<Sample>) {
        let (tx, mut rx) = mpsc::channel::<Sample>(capacity);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut totals = SampleTotals::new();

            loop {
                tokio::select! {
                    biased;

                    _ = &mut stop_rx => break,

                    maybe = rx.recv() => match maybe {
                        Some(sample) => totals.entry(sample.source).or_default().record(sample.value),
                        None => break,
                    },
                }
            }

            rx.close();
            let mut drained = 0usize;
            while let Some(sample) = rx.recv().await {
                totals.entry(sample.source).or_default().record(sample.value);
                drained += 1;
            }
            if drained > 0 {
                tracing::debug!(drained, "Drained buffered samples");
            }

            totals
        });

        let reporter = Self {
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
            flushed: std::sync::Mutex::new(None),
        };
        (reporter, tx)
    }

    /// Totals from the final flush, once `stop` has completed.
    pub fn flushed(&self) -> Option<SampleTotals> {
        self.flushed.lock().ok().and_then(|f| f.clone())
    }
}

#[async_trait]
impl Reporter for SampleReporter {
    fn name(&self) -> &'static str {
        "sample_reporter"
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if let Some(stop_tx) = self.stop_tx.lock().await.take() {
            let _ = stop_tx.send(());
        }

        let Some(handle) = self.handle.lock().await.take() else {
            tracing::debug!("Reporter already stopped");
            return Ok(());
        };

        let totals = handle.await.context("reporter task failed")?;
        for (source, stats) in &totals {
            tracing::info!(
                source,
                count = stats.count,
                sum = stats.sum,
                last = stats.last,
                "Flushed samples"
            );
        }

        if let Ok(mut flushed) = self.flushed.lock() {
            *flushed = Some(totals);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flush_includes_buffered_samples() {
        let (reporter, tx) = SampleReporter::spawn(16);

        for value in [1, 2, 3] {
            tx.send(Sample {
                source: "cpu",
                value,
            })
            .await
            .unwrap();
        }
        tx.send(Sample {
            source: "heap",
            value: 10,
        })
        .await
        .unwrap();

        reporter.stop().await.unwrap();

        let totals = reporter.flushed().unwrap();
        assert_eq!(
            totals["cpu"],
            SourceStats {
                count: 3,
                sum: 6,
                last: 3
            }
        );
        assert_eq!(totals["heap"].count, 1);
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_flushed_empty_before_stop() {
        let (reporter, _tx) = SampleReporter::spawn(4);
        assert!(reporter.flushed().is_none());

        reporter.stop().await.unwrap();
        assert_eq!(reporter.flushed(), Some(SampleTotals::new()));

        reporter.stop().await.unwrap();
    }
}
