//! Vitals status server.
//!
//! A small HTTP service exposing the aggregate health of a set of
//! configured dependency checks on a single `GET /status` route:
//! every request re-runs all checks and returns the merged report as
//! JSON with the mapped status code (200 up, 503 down, configurable for
//! degraded).
//!
//! Checks are declared in a YAML file and registered once at startup;
//! there is no runtime reconfiguration endpoint.

pub mod config;
pub mod http;

pub use config::{Config, ConfigError};
pub use http::{router, StatusServer};
