//! Shared utilities for Vitals components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
