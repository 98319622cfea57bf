//! Authoritative DNS resolution probe.
//!
//! Walks the delegation of a zone: asks a configured name server for the
//! zone's NS records, resolves each listed name server's A/AAAA addresses,
//! then queries every address directly with recursion disabled for the SOA
//! of a record inside the zone. The probe passes only when at least one
//! server returns a non-empty SOA answer; an empty answer means the server
//! is a recursor rather than authoritative and does not count.

use crate::probe::{Probe, ProbeError};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;
use trust_dns_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::proto::rr::{Name, RData, RecordType};
use trust_dns_resolver::TokioAsyncResolver;

/// Authoritative servers are queried on the standard DNS port regardless
/// of the port used to reach the configured name server.
const AUTHORITATIVE_PORT: u16 = 53;

/// Configuration for [`DnsProbe`].
#[derive(Debug, Clone)]
pub struct DnsConfig {
    /// Record whose SOA is requested from each authoritative server.
    pub fqdn: String,

    /// Zone whose NS records are walked.
    pub domain: String,

    /// Name server consulted for the NS records and their addresses.
    pub ns_server: IpAddr,

    /// Port of `ns_server`.
    pub ns_port: u16,
}

/// Probes that a zone's authoritative name servers answer for it.
pub struct DnsProbe {
    config: DnsConfig,
}

impl DnsProbe {
    /// Create a new DNS probe.
    pub fn new(config: DnsConfig) -> Self {
        Self { config }
    }
}

/// Build a resolver pointed at a single server. Hosts file and cache are
/// disabled so every invocation observes the live servers.
fn resolver_for(server: SocketAddr, recursive: bool, budget: Duration) -> TokioAsyncResolver {
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(server, Protocol::Udp));

    let mut opts = ResolverOpts::default();
    opts.timeout = budget;
    opts.attempts = 1;
    opts.recursion_desired = recursive;
    opts.use_hosts_file = false;
    opts.cache_size = 0;

    TokioAsyncResolver::tokio(config, opts)
}

fn nxdomain(error: &ResolveError) -> bool {
    matches!(
        error.kind(),
        ResolveErrorKind::NoRecordsFound {
            response_code: ResponseCode::NXDomain,
            ..
        }
    )
}

/// A name exists but has no records of the requested type. NXDOMAIN is
/// deliberately excluded: for a listed name server it means a dangling NS
/// record, which must fail the check rather than be skipped.
fn benign_empty_answer(error: &ResolveError) -> bool {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            *response_code != ResponseCode::NXDomain
        }
        _ => false,
    }
}

/// Collect the A/AAAA addresses of `name`. An empty answer for either
/// record type just yields no addresses; NXDOMAIN and other lookup errors
/// propagate.
async fn host_addresses(
    resolver: &TokioAsyncResolver,
    name: &Name,
) -> Result<Vec<IpAddr>, ResolveError> {
    let mut addrs = Vec::new();
    for record_type in [RecordType::A, RecordType::AAAA] {
        match resolver.lookup(name.clone(), record_type).await {
            Ok(lookup) => {
                for record in lookup.record_iter() {
                    match record.data() {
                        Some(RData::A(a)) => addrs.push(IpAddr::V4(a.0)),
                        Some(RData::AAAA(aaaa)) => addrs.push(IpAddr::V6(aaaa.0)),
                        _ => {}
                    }
                }
            }
            Err(e) if benign_empty_answer(&e) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(addrs)
}

/// Ask one server, recursion disabled, for the SOA of `fqdn`.
async fn answers_soa(server: IpAddr, fqdn: &Name, budget: Duration) -> bool {
    let resolver = resolver_for(
        SocketAddr::new(server, AUTHORITATIVE_PORT),
        false,
        budget,
    );
    match resolver.lookup(fqdn.clone(), RecordType::SOA).await {
        Ok(lookup) => lookup
            .record_iter()
            .any(|record| matches!(record.data(), Some(RData::SOA(_)))),
        // Unreachable, lame or recursive-only server; another listed
        // server may still answer.
        Err(_) => false,
    }
}

#[async_trait]
impl Probe for DnsProbe {
    async fn run(&self, budget: Duration) -> Result<(), ProbeError> {
        let domain = Name::from_utf8(&self.config.domain)
            .map_err(|e| ProbeError::failure(format!("invalid domain {:?}: {e}", self.config.domain)))?;
        let fqdn = Name::from_utf8(&self.config.fqdn)
            .map_err(|e| ProbeError::failure(format!("invalid FQDN {:?}: {e}", self.config.fqdn)))?;

        let resolver = resolver_for(
            SocketAddr::new(self.config.ns_server, self.config.ns_port),
            true,
            budget,
        );

        let ns_lookup = resolver
            .lookup(domain.clone(), RecordType::NS)
            .await
            .map_err(|e| {
                if nxdomain(&e) {
                    ProbeError::failure(format!("no such domain {domain}"))
                } else {
                    ProbeError::failure(format!(
                        "cannot retrieve the list of name servers for {domain}: {e}"
                    ))
                }
            })?;

        let ns_names: Vec<Name> = ns_lookup
            .record_iter()
            .filter_map(|record| match record.data() {
                Some(RData::NS(ns)) => Some(ns.0.clone()),
                _ => None,
            })
            .collect();
        if ns_names.is_empty() {
            return Err(ProbeError::failure(format!(
                "no NS records for {domain}; it is probably a CNAME to a domain but not a zone"
            )));
        }

        let mut queried = 0usize;
        for ns_name in &ns_names {
            let addrs = host_addresses(&resolver, ns_name).await.map_err(|e| {
                ProbeError::failure(format!("error getting the addresses of {ns_name}: {e}"))
            })?;
            for addr in addrs {
                queried += 1;
                if answers_soa(addr, &fqdn, budget).await {
                    debug!(fqdn = %fqdn, server = %addr, "authoritative SOA answer received");
                    return Ok(());
                }
            }
        }

        Err(ProbeError::failure(format!(
            "no authoritative SOA answer for {fqdn} from {queried} server address(es) across {} NS record(s)",
            ns_names.len()
        )))
    }
}
