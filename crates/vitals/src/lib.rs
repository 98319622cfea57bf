//! Health-check aggregation for services and their dependencies.
//!
//! A [`Registry`] holds named checks, each wrapping a [`Probe`] with its
//! own timeout and a skip-on-error flag. Running the registry invokes
//! every probe concurrently under its deadline and merges the outcomes
//! into one [`AggregateReport`]: `down` if any fatal check failed,
//! `degraded` if only skippable checks failed, `up` otherwise.
//!
//! Probes are interchangeable: the bundled HTTP, TCP, DNS and PostgreSQL
//! implementations and plain async closures all satisfy the same
//! single-method contract.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use vitals::{CheckConfig, Registry};
//! use vitals::probes::{HttpConfig, HttpProbe};
//!
//! # async fn example() -> common::Result<()> {
//! let registry = Registry::new();
//! registry.register(
//!     CheckConfig::new("upstream", HttpProbe::new(HttpConfig::get("https://example.com")))
//!         .with_timeout(Duration::from_secs(2))
//!         .skip_on_err(true),
//! )?;
//! registry.register(CheckConfig::new("noop", |_: Duration| async {
//!     Ok::<(), vitals::ProbeError>(())
//! }))?;
//!
//! let report = registry.run_all().await;
//! println!("{}", report.status);
//! # Ok(())
//! # }
//! ```

pub mod probe;
pub mod probes;
pub mod registry;
pub mod types;

pub use probe::{Probe, ProbeError};
pub use registry::{CheckConfig, Registry};
pub use types::{
    AggregateReport, CheckResult, CheckStatus, Component, OverallStatus, ResponsePolicy,
    DEFAULT_CHECK_TIMEOUT,
};
