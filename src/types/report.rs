use serde::Serialize;

/// How a single `stop()` attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    Failed { reason: String },
    Panicked { message: String },
    TimedOut { timeout_ms: u64 },
}

impl StopOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, StopOutcome::Stopped)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StopRecord {
    pub name: &'static str,
    pub outcome: StopOutcome,
    pub elapsed_ms: u64,
}

/// Per-handle outcomes of one completed termination sequence, in stop order.
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownReport {
    pub schedulables: Vec<StopRecord>,
    pub reporter: StopRecord,
    pub elapsed_ms: u64,
}

impl ShutdownReport {
    pub fn failures(&self) -> impl Iterator<Item = &StopRecord> {
        self.schedulables
            .iter()
            .chain(std::iter::once(&self.reporter))
            .filter(|r| !r.outcome.is_stopped())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}
