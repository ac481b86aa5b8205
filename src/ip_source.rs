//! Public IP discovery
//!
//! The reconciler asks an [`IpSource`] for the address every pass. The
//! production source queries a plain-text "what is my IP" service.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::constants::USER_AGENT;
use crate::error::{DdnsError, Result};
use crate::validation::parse_public_ipv4;

/// Source of the caller's current public IPv4 address
#[async_trait]
pub trait IpSource: Send + Sync {
    async fn current(&self) -> Result<Ipv4Addr>;
}

/// HTTP-based IP source
pub struct HttpIpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Creates a source against `url` (e.g. `https://api.ipify.org`)
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DdnsError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        debug!(url = %self.url, "Looking up public address");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DdnsError::ip_discovery(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DdnsError::ip_discovery(format!(
                "{} returned HTTP {}",
                self.url,
                status.as_u16()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DdnsError::ip_discovery(format!("failed to read response: {}", e)))?;

        let ip = parse_public_ipv4(&body)?;
        debug!(%ip, "Public address discovered");
        Ok(ip)
    }
}
