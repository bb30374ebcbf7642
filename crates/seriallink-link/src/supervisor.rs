//! Named, cancellable background tasks.

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::Result;

/// Runs a group of tasks that share one cancellation token.
///
/// [`wait`](Self::wait) collects every task and reports the first failure.
/// Dropping the supervisor aborts whatever is still running.
#[derive(Debug)]
pub struct TaskSupervisor {
    token: CancellationToken,
    tasks: JoinSet<(&'static str, Result<()>)>,
}

impl TaskSupervisor {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tasks: JoinSet::new(),
        }
    }

    /// Spawn `task` with a clone of the supervisor's token.
    pub fn run_with_cancel<F, Fut>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let future = task(self.token.clone());
        let span = tracing::debug_span!("task", task = name);
        self.tasks.spawn(
            async move {
                tracing::debug!("started");
                (name, future.await)
            }
            .instrument(span),
        );
    }

    /// Cancel every task started by this supervisor.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for all tasks to finish and return the first error.
    pub async fn wait(&mut self) -> Result<()> {
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok((name, Ok(()))) => {
                    tracing::debug!(task = name, "task finished");
                    continue;
                }
                Ok((name, Err(err))) => {
                    tracing::error!(task = name, error = %err, "task failed");
                    err
                }
                Err(join_err) if join_err.is_panic() => {
                    std::panic::resume_unwind(join_err.into_panic())
                }
                Err(join_err) => {
                    tracing::debug!(error = %join_err, "task aborted");
                    continue;
                }
            };
            first_error.get_or_insert(outcome);
        }
        first_error.map_or(Ok(()), Err)
    }
}
