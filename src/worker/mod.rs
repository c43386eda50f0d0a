mod reporter;
mod sampler;

pub use reporter::{SampleReporter, SampleTotals, SourceStats};
pub use sampler::IntervalSampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub source: &'static str,
    pub value: u64,
}
