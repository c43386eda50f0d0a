use async_trait::async_trait;

/// A sampling or profiling unit that runs on a schedule until stopped.
///
/// `stop` may be called while the unit still has work in flight on other
/// tasks; implementors are responsible for making that safe.
#[async_trait]
pub trait Schedulable: Send + Sync {
    fn name(&self) -> &'static str;

    async fn stop(&self) -> anyhow::Result<()>;
}

/// The sink that delivers collected data. Stopped once, after every
/// [`Schedulable`] has been asked to stop, so it can flush what they produced.
#[async_trait]
pub trait Reporter: Send + Sync {
    fn name(&self) -> &'static str {
        "reporter"
    }

    async fn stop(&self) -> anyhow::Result<()>;
}
