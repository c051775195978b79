use anyhow::Result;
use async_trait::async_trait;
use core_logic::{RunStats, RunnerConfig, WorkerRunner, Workflow};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct CountingWorkflow {
    runs: AtomicUsize,
    fail_on: Option<usize>,
}

impl CountingWorkflow {
    fn new(fail_on: Option<usize>) -> Self {
        Self {
            runs: AtomicUsize::new(0),
            fail_on,
        }
    }
}

#[async_trait]
impl Workflow for CountingWorkflow {
    fn name(&self) -> &str {
        "counting"
    }

    async fn run_once(&self) -> Result<()> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(run) == self.fail_on {
            anyhow::bail!("run {} exploded", run);
        }
        Ok(())
    }
}

fn fast_config(max_runs: Option<u64>) -> RunnerConfig {
    RunnerConfig {
        interval: Duration::from_millis(5),
        max_jitter: Duration::ZERO,
        max_runs,
    }
}

#[tokio::test]
async fn test_once_runs_exactly_one_time() {
    let workflow = CountingWorkflow::new(None);

    let stats = WorkerRunner::run_periodic(&workflow, &RunnerConfig::once(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(workflow.runs.load(Ordering::SeqCst), 1);
    assert_eq!(
        stats,
        RunStats {
            completed: 1,
            failed: 0
        }
    );
}

#[tokio::test]
async fn test_failed_run_does_not_stop_schedule() {
    let workflow = CountingWorkflow::new(Some(2));

    let stats = WorkerRunner::run_periodic(&workflow, &fast_config(Some(3)), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(workflow.runs.load(Ordering::SeqCst), 3);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_cancelled_token_prevents_any_run() {
    let workflow = CountingWorkflow::new(None);
    let token = CancellationToken::new();
    token.cancel();

    let stats = WorkerRunner::run_periodic(&workflow, &fast_config(None), token)
        .await
        .unwrap();

    assert_eq!(workflow.runs.load(Ordering::SeqCst), 0);
    assert_eq!(stats, RunStats::default());
}

#[tokio::test]
async fn test_cancel_during_pause_stops_loop() {
    let workflow = CountingWorkflow::new(None);
    let token = CancellationToken::new();
    let config = RunnerConfig {
        interval: Duration::from_secs(3600),
        max_jitter: Duration::ZERO,
        max_runs: None,
    };

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let stats = WorkerRunner::run_periodic(&workflow, &config, token)
        .await
        .unwrap();

    assert_eq!(stats.completed, 1);
}
