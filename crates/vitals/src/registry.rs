//! Check registry and execution orchestration.

use crate::probe::Probe;
use crate::types::{
    AggregateReport, CheckResult, Component, OverallStatus, DEFAULT_CHECK_TIMEOUT,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Configuration for a single named check.
///
/// Built once at startup and handed to [`Registry::register`]; immutable
/// after that.
#[derive(Clone)]
pub struct CheckConfig {
    name: String,
    timeout: Duration,
    skip_on_err: bool,
    probe: Arc<dyn Probe>,
}

impl CheckConfig {
    /// Create a check with the default timeout and skip-on-error disabled.
    pub fn new(name: impl Into<String>, probe: impl Probe + 'static) -> Self {
        Self {
            name: name.into(),
            timeout: DEFAULT_CHECK_TIMEOUT,
            skip_on_err: false,
            probe: Arc::new(probe),
        }
    }

    /// Set the per-invocation timeout. Zero falls back to the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark this check as non-fatal: its failures degrade the overall
    /// status instead of taking it down.
    pub fn skip_on_err(mut self, skip: bool) -> Self {
        self.skip_on_err = skip;
        self
    }

    /// Name of the check.
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Entry {
    timeout: Duration,
    skip_on_err: bool,
    probe: Arc<dyn Probe>,
}

/// In-memory collection of checks plus execution orchestration.
///
/// Constructed once at service startup and shared (behind an `Arc`) with
/// whatever serves the status route. The check table is read-mostly:
/// registration takes a short write lock and execution snapshots the table
/// before awaiting anything, so registering while serving traffic is safe.
pub struct Registry {
    checks: RwLock<HashMap<String, Entry>>,
    component: Option<Component>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            checks: RwLock::new(HashMap::new()),
            component: None,
        }
    }

    /// Create an empty registry whose reports carry a component identity.
    pub fn with_component(component: Component) -> Self {
        Self {
            checks: RwLock::new(HashMap::new()),
            component: Some(component),
        }
    }

    /// Register a check.
    ///
    /// Fails if the name is empty. Registering a name twice replaces the
    /// earlier check (last write wins).
    pub fn register(&self, config: CheckConfig) -> common::Result<()> {
        let name = config.name.trim().to_string();
        if name.is_empty() {
            return Err(common::Error::registry("check name must not be empty"));
        }

        let entry = Entry {
            timeout: if config.timeout.is_zero() {
                DEFAULT_CHECK_TIMEOUT
            } else {
                config.timeout
            },
            skip_on_err: config.skip_on_err,
            probe: config.probe,
        };

        let mut checks = self
            .checks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if checks.insert(name.clone(), entry).is_some() {
            debug!(check = %name, "replacing existing check registration");
        }
        Ok(())
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the registry has no checks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every registered check concurrently, each under its own
    /// configured timeout, and aggregate the results.
    ///
    /// Never fails and never panics: probe errors, timeouts and even probe
    /// panics are converted into failing [`CheckResult`]s.
    pub async fn run_all(&self) -> AggregateReport {
        self.run(None).await
    }

    /// Like [`Registry::run_all`], but clamps every check's budget to
    /// `parent_budget`, modelling a deadline on the whole status request.
    pub async fn run_all_within(&self, parent_budget: Duration) -> AggregateReport {
        self.run(Some(parent_budget)).await
    }

    async fn run(&self, parent_budget: Option<Duration>) -> AggregateReport {
        let snapshot: Vec<(String, bool, Duration, Arc<dyn Probe>)> = {
            let checks = self
                .checks
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            checks
                .iter()
                .map(|(name, entry)| {
                    (
                        name.clone(),
                        entry.skip_on_err,
                        entry.timeout,
                        entry.probe.clone(),
                    )
                })
                .collect()
        };

        let mut tasks = Vec::with_capacity(snapshot.len());
        for (name, skip_on_err, check_timeout, probe) in snapshot {
            let budget = match parent_budget {
                Some(parent) => parent.min(check_timeout),
                None => check_timeout,
            };
            let task_name = name.clone();
            let handle =
                tokio::spawn(async move { execute(probe.as_ref(), &task_name, budget).await });
            tasks.push((name, skip_on_err, handle));
        }

        let mut checks = BTreeMap::new();
        let mut fatal_failure = false;
        let mut skippable_failure = false;
        for (name, skip_on_err, handle) in tasks {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(check = %name, error = %e, "check task aborted");
                    CheckResult::fail(Duration::ZERO, format!("check aborted: {e}"))
                }
            };
            if !result.is_pass() {
                if skip_on_err {
                    skippable_failure = true;
                } else {
                    fatal_failure = true;
                }
            }
            checks.insert(name, result);
        }

        let status = if fatal_failure {
            OverallStatus::Down
        } else if skippable_failure {
            OverallStatus::Degraded
        } else {
            OverallStatus::Up
        };

        AggregateReport {
            status,
            component: self.component.clone(),
            checks,
        }
    }
}

/// Invoke one probe under its budget and classify the outcome.
async fn execute(probe: &dyn Probe, name: &str, budget: Duration) -> CheckResult {
    let start = Instant::now();

    match timeout(budget, probe.run(budget)).await {
        Ok(Ok(())) => {
            let duration = start.elapsed();
            debug!(check = %name, duration_ms = duration.as_millis(), "check passed");
            CheckResult::pass(duration)
        }
        Ok(Err(e)) => {
            let duration = start.elapsed();
            warn!(check = %name, error = %e, "check failed");
            CheckResult::fail(duration, e.to_string())
        }
        Err(_) => {
            let duration = start.elapsed();
            warn!(check = %name, budget_ms = budget.as_millis(), "check timed out");
            CheckResult::fail(duration, format!("timed out after {budget:?}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use crate::types::CheckStatus;
    use tokio::time::sleep;

    fn passing() -> impl Probe {
        |_: Duration| async { Ok::<(), ProbeError>(()) }
    }

    fn failing(message: &'static str) -> impl Probe {
        move |_: Duration| async move { Err(ProbeError::failure(message)) }
    }

    fn sleeping(duration: Duration) -> impl Probe {
        move |_: Duration| async move {
            sleep(duration).await;
            Ok::<(), ProbeError>(())
        }
    }

    #[tokio::test]
    async fn test_empty_registry_is_up() {
        let registry = Registry::new();
        let report = registry.run_all().await;

        assert_eq!(report.status, OverallStatus::Up);
        assert!(report.checks.is_empty());
    }

    #[tokio::test]
    async fn test_fatal_failure_takes_service_down() {
        let registry = Registry::new();
        registry
            .register(CheckConfig::new("db", failing("connection refused")))
            .unwrap();
        registry
            .register(CheckConfig::new("cache", passing()).skip_on_err(true))
            .unwrap();

        let report = registry.run_all().await;

        assert_eq!(report.status, OverallStatus::Down);
        assert_eq!(report.checks["db"].status, CheckStatus::Fail);
        assert_eq!(
            report.checks["db"].error.as_deref(),
            Some("connection refused")
        );
        assert_eq!(report.checks["cache"].status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn test_only_skippable_failures_degrade() {
        let registry = Registry::new();
        registry
            .register(CheckConfig::new("db", passing()))
            .unwrap();
        registry
            .register(CheckConfig::new("cache", failing("no route to host")).skip_on_err(true))
            .unwrap();

        let report = registry.run_all().await;

        assert_eq!(report.status, OverallStatus::Degraded);
        assert_eq!(report.checks["cache"].status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn test_all_passing_is_up() {
        let registry = Registry::new();
        registry.register(CheckConfig::new("a", passing())).unwrap();
        registry.register(CheckConfig::new("b", passing())).unwrap();

        let report = registry.run_all().await;

        assert_eq!(report.status, OverallStatus::Up);
        assert_eq!(report.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let registry = Registry::new();
        assert!(registry.register(CheckConfig::new("", passing())).is_err());
        assert!(registry.register(CheckConfig::new("  ", passing())).is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_last_write_wins() {
        let registry = Registry::new();
        registry
            .register(CheckConfig::new("svc", failing("first")))
            .unwrap();
        registry
            .register(CheckConfig::new("svc", passing()))
            .unwrap();

        assert_eq!(registry.len(), 1);
        let report = registry.run_all().await;
        assert_eq!(report.status, OverallStatus::Up);
        assert_eq!(report.checks["svc"].status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn test_slow_probe_fails_without_blocking_fast_ones() {
        let registry = Registry::new();
        registry
            .register(
                CheckConfig::new("slow", sleeping(Duration::from_secs(5)))
                    .with_timeout(Duration::from_millis(50)),
            )
            .unwrap();
        registry
            .register(
                CheckConfig::new("fast", passing()).with_timeout(Duration::from_secs(5)),
            )
            .unwrap();

        let start = Instant::now();
        let report = registry.run_all().await;

        // Concurrent fan-out: bounded by the slow check's budget, not its
        // probe's sleep.
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(report.status, OverallStatus::Down);
        assert_eq!(report.checks["slow"].status, CheckStatus::Fail);
        assert!(
            report.checks["slow"]
                .error
                .as_deref()
                .unwrap()
                .contains("timed out")
        );
        assert_eq!(report.checks["fast"].status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn test_parent_budget_clamps_check_timeouts() {
        let registry = Registry::new();
        registry
            .register(
                CheckConfig::new("slow", sleeping(Duration::from_millis(500)))
                    .with_timeout(Duration::from_secs(5)),
            )
            .unwrap();

        let report = registry.run_all_within(Duration::from_millis(50)).await;

        assert_eq!(report.status, OverallStatus::Down);
        assert!(
            report.checks["slow"]
                .error
                .as_deref()
                .unwrap()
                .contains("timed out")
        );
    }

    #[tokio::test]
    async fn test_zero_timeout_coerces_to_default() {
        let registry = Registry::new();
        registry
            .register(
                CheckConfig::new("svc", passing()).with_timeout(Duration::ZERO),
            )
            .unwrap();

        // With a literal zero budget the probe could never run; the default
        // must have been applied.
        let report = registry.run_all().await;
        assert_eq!(report.checks["svc"].status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn test_registration_during_execution() {
        let registry = Arc::new(Registry::new());
        registry
            .register(
                CheckConfig::new("slow", sleeping(Duration::from_millis(100)))
                    .with_timeout(Duration::from_secs(1)),
            )
            .unwrap();

        let runner = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.run_all().await })
        };
        registry
            .register(CheckConfig::new("late", passing()))
            .unwrap();

        let report = runner.await.unwrap();
        // The in-flight run used its snapshot; the late check is picked up
        // on the next run.
        assert_eq!(report.checks["slow"].status, CheckStatus::Pass);
        assert_eq!(registry.run_all().await.checks.len(), 2);
    }
}
