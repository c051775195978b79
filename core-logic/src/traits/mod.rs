use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub completed: u64,
    pub failed: u64,
}

/// One unit of scheduled work, driven by [`crate::WorkerRunner`].
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Returns the name of the workflow
    fn name(&self) -> &str;

    /// Executes a single run. An `Err` is logged by the runner and does not
    /// stop the schedule.
    async fn run_once(&self) -> Result<()>;
}
