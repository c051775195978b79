use crate::traits::{RunStats, Workflow};
use anyhow::Result;
use rand::Rng;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Pause between the end of one run and the start of the next.
    pub interval: Duration,
    /// Upper bound of a random delay added to each pause.
    pub max_jitter: Duration,
    /// Stop after this many runs. `None` runs until cancelled.
    pub max_runs: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_jitter: Duration::ZERO,
            max_runs: None,
        }
    }
}

impl RunnerConfig {
    pub fn once() -> Self {
        Self {
            max_runs: Some(1),
            ..Default::default()
        }
    }

    fn next_delay(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return self.interval;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64);
        self.interval + Duration::from_millis(jitter_ms)
    }
}

pub struct WorkerRunner;

impl WorkerRunner {
    /// Returns a token that is cancelled when the process receives Ctrl+C.
    pub fn shutdown_on_ctrl_c() -> CancellationToken {
        let token = CancellationToken::new();
        let cloned_token = token.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("🛑 Received Ctrl+C. Stopping after the current run...");
                    cloned_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        token
    }

    /// Runs `workflow` immediately, then once per interval until the token is
    /// cancelled or `max_runs` is reached. Cancellation is only observed
    /// between runs; an in-flight run always completes.
    pub async fn run_periodic(
        workflow: &dyn Workflow,
        config: &RunnerConfig,
        token: CancellationToken,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let start_time = std::time::Instant::now();

        loop {
            if token.is_cancelled() {
                break;
            }

            let run_id = stats.completed + stats.failed + 1;
            let span = tracing::info_span!("run", run_id = format!("{:03}", run_id));

            match workflow.run_once().instrument(span).await {
                Ok(()) => stats.completed += 1,
                Err(e) => {
                    error!("{} run {} FAILED: {:#}", workflow.name(), run_id, e);
                    stats.failed += 1;
                }
            }

            if config
                .max_runs
                .is_some_and(|max| stats.completed + stats.failed >= max)
            {
                break;
            }

            let delay = config.next_delay();
            info!("Next {} run in {}s", workflow.name(), delay.as_secs());

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(
            "🛑 {} stopped after {:.1}s | Completed runs: {} | Failed runs: {}",
            workflow.name(),
            start_time.elapsed().as_secs_f64(),
            stats.completed,
            stats.failed
        );

        Ok(stats)
    }
}
