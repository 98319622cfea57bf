//! The probe contract: one dependency check under a bounded time budget.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Error returned by a failed probe invocation.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0}")]
    Failure(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl ProbeError {
    /// Create a failure with a descriptive message.
    pub fn failure(msg: impl Into<String>) -> Self {
        ProbeError::Failure(msg.into())
    }
}

/// A single dependency-reachability test.
///
/// `budget` is the wall-clock time this invocation has; probes should pass
/// it on as the client timeout of whatever request they issue. The registry
/// additionally wraps the returned future in [`tokio::time::timeout`], so a
/// probe is dropped at its deadline. A probe that does blocking work
/// between yield points can still delay the aggregate response beyond the
/// deadline, so probes must stay on async I/O.
///
/// Probes must not call back into the registry that runs them.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Perform the check, returning an error describing the failure.
    async fn run(&self, budget: Duration) -> Result<(), ProbeError>;
}

/// Any async function taking the budget is a valid probe.
#[async_trait]
impl<F, Fut> Probe for F
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send,
{
    async fn run(&self, budget: Duration) -> Result<(), ProbeError> {
        (self)(budget).await
    }
}
