use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::lifecycle::{Reporter, Schedulable};

/// Shared, ordered record of `stop()` calls across mocks.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == entry).count()
    }
}

#[derive(Clone, Copy)]
pub enum Behavior {
    Ok,
    Fail,
    Panic,
    Hang,
    Delay(Duration),
}

async fn act(name: &'static str, behavior: Behavior, log: &CallLog) -> anyhow::Result<()> {
    log.push(name);
    match behavior {
        Behavior::Ok => Ok(()),
        Behavior::Fail => Err(anyhow::anyhow!("{} refused to stop", name)),
        Behavior::Panic => panic!("{} exploded", name),
        Behavior::Hang => {
            std::future::pending::<()>().await;
            Ok(())
        }
        Behavior::Delay(delay) => {
            tokio::time::sleep(delay).await;
            log.push(format!("{}:done", name));
            Ok(())
        }
    }
}

pub struct MockSchedulable {
    name: &'static str,
    behavior: Behavior,
    log: CallLog,
}

impl MockSchedulable {
    pub fn new(name: &'static str, behavior: Behavior, log: &CallLog) -> Self {
        Self {
            name,
            behavior,
            log: log.clone(),
        }
    }

    pub fn ok(name: &'static str, log: &CallLog) -> Self {
        Self::new(name, Behavior::Ok, log)
    }

    pub fn failing(name: &'static str, log: &CallLog) -> Self {
        Self::new(name, Behavior::Fail, log)
    }

    pub fn panicking(name: &'static str, log: &CallLog) -> Self {
        Self::new(name, Behavior::Panic, log)
    }

    pub fn hanging(name: &'static str, log: &CallLog) -> Self {
        Self::new(name, Behavior::Hang, log)
    }

    pub fn delayed(name: &'static str, log: &CallLog, delay: Duration) -> Self {
        Self::new(name, Behavior::Delay(delay), log)
    }
}

#[async_trait]
impl Schedulable for MockSchedulable {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn stop(&self) -> anyhow::Result<()> {
        act(self.name, self.behavior, &self.log).await
    }
}

pub struct MockReporter {
    behavior: Behavior,
    log: CallLog,
}

impl MockReporter {
    fn new(behavior: Behavior, log: &CallLog) -> Self {
        Self {
            behavior,
            log: log.clone(),
        }
    }

    pub fn ok(log: &CallLog) -> Self {
        Self::new(Behavior::Ok, log)
    }

    pub fn failing(log: &CallLog) -> Self {
        Self::new(Behavior::Fail, log)
    }

    pub fn panicking(log: &CallLog) -> Self {
        Self::new(Behavior::Panic, log)
    }

    pub fn hanging(log: &CallLog) -> Self {
        Self::new(Behavior::Hang, log)
    }
}

#[async_trait]
impl Reporter for MockReporter {
    async fn stop(&self) -> anyhow::Result<()> {
        if let Behavior::Fail = self.behavior {
            self.log.push(self.name());
            anyhow::bail!("flush failed");
        }
        act(self.name(), self.behavior, &self.log).await
    }
}

/// In-memory sink for `tracing` output, installed as the thread's default
/// subscriber for the lifetime of the returned guard.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
