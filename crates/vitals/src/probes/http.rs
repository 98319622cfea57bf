//! HTTP reachability probe.

use crate::probe::{Probe, ProbeError};
use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;
use tracing::debug;

/// Configuration for [`HttpProbe`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// URL to request
    pub url: String,

    /// HTTP method
    pub method: Method,

    /// Status codes accepted as a pass. Empty means any response counts,
    /// reachability alone is enough.
    pub expected_codes: Vec<u16>,
}

impl HttpConfig {
    /// GET the URL, accepting any response.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            expected_codes: Vec::new(),
        }
    }
}

/// Probes a URL and verifies the response status code.
pub struct HttpProbe {
    config: HttpConfig,
}

impl HttpProbe {
    /// Create a new HTTP probe.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn run(&self, budget: Duration) -> Result<(), ProbeError> {
        // Fresh client per invocation; the budget doubles as the client
        // timeout so the request gives up on its own.
        let client = reqwest::Client::builder().timeout(budget).build()?;
        let response = client
            .request(self.config.method.clone(), &self.config.url)
            .send()
            .await?;

        let code = response.status().as_u16();
        if self.config.expected_codes.is_empty() || self.config.expected_codes.contains(&code) {
            debug!(url = %self.config.url, status = code, "HTTP probe succeeded");
            Ok(())
        } else {
            Err(ProbeError::failure(format!(
                "unexpected status code {code} from {}",
                self.config.url
            )))
        }
    }
}
