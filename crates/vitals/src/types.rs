//! Report types for check execution and aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Timeout applied when a check is registered with a zero timeout.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The probe completed within its budget without an error
    Pass,
    /// The probe returned an error or exceeded its budget
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Aggregate service status across all registered checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every check passed (or nothing is registered)
    Up,
    /// At least one non-skippable check failed
    Down,
    /// Only checks marked skip-on-error failed
    Degraded,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Up => write!(f, "up"),
            OverallStatus::Down => write!(f, "down"),
            OverallStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Result of one probe invocation. Produced fresh on every execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Pass/fail classification
    pub status: CheckStatus,

    /// Failure message, present only when the check failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Elapsed wall-clock time of the probe invocation, in milliseconds
    pub duration_ms: f64,

    /// When the probe was invoked
    #[serde(with = "humantime_serde")]
    pub timestamp: SystemTime,
}

impl CheckResult {
    /// Create a passing result.
    pub fn pass(duration: Duration) -> Self {
        Self {
            status: CheckStatus::Pass,
            error: None,
            duration_ms: duration.as_secs_f64() * 1_000.0,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a failing result with a descriptive message.
    pub fn fail(duration: Duration, message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            error: Some(message.into()),
            duration_ms: duration.as_secs_f64() * 1_000.0,
            timestamp: SystemTime::now(),
        }
    }

    /// Check if the result is a pass.
    pub fn is_pass(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Identity of the component a report describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component name
    pub name: String,

    /// Component version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Merged result of all checks for one status query.
///
/// Recomputed per request, never persisted. The check map is ordered by
/// name so serialized reports are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Overall status derived from the individual results
    pub status: OverallStatus,

    /// Component identity, when configured on the registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,

    /// Per-check results keyed by check name
    pub checks: BTreeMap<String, CheckResult>,
}

/// HTTP status-code mapping for aggregate statuses.
///
/// Up and Down always map to 200 and 503. Whether a degraded service
/// should look healthy to probes is an operator decision, so that code is
/// configurable (default 200).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePolicy {
    /// Status code returned when the overall status is degraded
    pub degraded_status_code: u16,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            degraded_status_code: 200,
        }
    }
}

impl ResponsePolicy {
    /// Create a policy with the given degraded status code.
    pub fn new(degraded_status_code: u16) -> common::Result<Self> {
        if !(100..=599).contains(&degraded_status_code) {
            return Err(common::Error::config(format!(
                "degraded status code {degraded_status_code} is not a valid HTTP status code"
            )));
        }
        Ok(Self {
            degraded_status_code,
        })
    }

    /// Map an overall status to its HTTP response code.
    pub fn status_code(&self, status: OverallStatus) -> u16 {
        match status {
            OverallStatus::Up => 200,
            OverallStatus::Down => 503,
            OverallStatus::Degraded => self.degraded_status_code,
        }
    }
}
