//! Bundled probe implementations.
//!
//! Every probe here allocates its own client and query state per
//! invocation, so a registry can run them concurrently without shared
//! mutable state. Each is swappable for any other [`crate::Probe`]
//! implementation, including plain async closures.

pub mod dns;
pub mod http;
pub mod postgres;
pub mod tcp;

pub use dns::{DnsConfig, DnsProbe};
pub use http::{HttpConfig, HttpProbe};
pub use postgres::PostgresProbe;
pub use tcp::TcpProbe;
