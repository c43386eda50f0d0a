use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};

use babar_agent::config::{AgentConfig, ReporterFailurePolicy, ShutdownConfig};
use babar_agent::lifecycle::{signal, ShutdownCoordinator};
use babar_agent::worker::{IntervalSampler, SampleReporter};

#[derive(Parser)]
#[command(name = "babar-agent")]
#[command(about = "Monitoring agent with ordered, fault-isolated shutdown")]
struct Cli {
    /// Upper bound for each component's stop, in milliseconds. 0 = wait forever.
    #[arg(long, env = "STOP_TIMEOUT_MS", default_value = "10000")]
    stop_timeout_ms: u64,

    #[arg(long, env, default_value = "propagate")]
    reporter_policy: String,

    #[arg(long, env = "SAMPLE_INTERVAL_MS", default_value = "1000")]
    sample_interval_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print the shutdown report as JSON on stdout.
    #[arg(long)]
    report_json: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<AgentConfig> {
        let reporter_policy: ReporterFailurePolicy = self
            .reporter_policy
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        Ok(AgentConfig {
            shutdown: ShutdownConfig {
                stop_timeout: (self.stop_timeout_ms > 0)
                    .then(|| Duration::from_millis(self.stop_timeout_ms)),
                reporter_policy,
            },
            sample_interval: Duration::from_millis(self.sample_interval_ms.max(1)),
            log_level: self.log_level,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let report_json = cli.report_json;
    let config = cli.into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_writer(std::io::stderr)
        .init();

    let (reporter, sink) = SampleReporter::spawn(1000);
    let reporter = Arc::new(reporter);

    let mut heartbeat = 0u64;
    let heartbeat_sampler = IntervalSampler::spawn(
        "heartbeat",
        config.sample_interval,
        sink.clone(),
        move || {
            heartbeat += 1;
            heartbeat
        },
    );

    let started = Instant::now();
    let uptime_sampler = IntervalSampler::spawn("uptime_ms", config.sample_interval, sink, move || {
        started.elapsed().as_millis() as u64
    });

    let coordinator = ShutdownCoordinator::builder()
        .schedulable(Arc::new(heartbeat_sampler))
        .schedulable(Arc::new(uptime_sampler))
        .reporter(reporter.clone())
        .config(config.shutdown.clone())
        .build()?;

    tracing::info!(
        stop_timeout_ms = config.shutdown.stop_timeout.map(|t| t.as_millis() as u64),
        reporter_policy = %config.shutdown.reporter_policy,
        "Agent started, waiting for signals..."
    );

    let report = match signal::run_on_termination(&coordinator).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Shutdown failed: {}", e);
            return Err(e.into());
        }
    };

    if report_json {
        if let Some(report) = report {
            let output = serde_json::json!({
                "shutdown": report,
                "samples": reporter.flushed(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
