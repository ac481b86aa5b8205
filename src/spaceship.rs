//! Spaceship API client for DNS operations
//!
//! Uses reqwest with rustls for HTTP requests. Authentication is a key/secret
//! header pair sent with every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{
    DNS_RECORD_TTL, DNS_RECORD_TYPE_A, HEADER_API_KEY, HEADER_API_SECRET, LIST_PAGE_SIZE,
    SPACESHIP_RECORDS_ENDPOINT, USER_AGENT,
};
use crate::dns_provider::{index_by_name, DnsProvider, DnsRecord, RecordSet};
use crate::error::{DdnsError, Result};
use crate::metrics;

//==============================================================================
// Wire Types
//==============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse {
    items: Vec<DnsRecord>,
}

/// Item of a DELETE body; identifies the record by type, name and address
#[derive(Debug, Serialize)]
struct DeleteItem<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    force: bool,
    items: [PutItem<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PutItem<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    address: &'a str,
    ttl: u64,
}

//==============================================================================
// Client
//==============================================================================

pub struct SpaceshipClient {
    api_key: Zeroizing<String>,
    api_secret: Zeroizing<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl SpaceshipClient {
    pub fn new(api_key: &str, api_secret: &str, timeout: Duration) -> Result<Self> {
        Self::with_endpoint(SPACESHIP_RECORDS_ENDPOINT, api_key, api_secret, timeout)
    }

    /// Builds a client against a different records endpoint (mirrors, tests)
    pub fn with_endpoint(
        endpoint: &str,
        api_key: &str,
        api_secret: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DdnsError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: Zeroizing::new(api_key.to_string()),
            api_secret: Zeroizing::new(api_secret.to_string()),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/{}", self.endpoint, encode(domain))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(HEADER_API_KEY, self.api_key.as_str())
            .header(HEADER_API_SECRET, self.api_secret.as_str())
    }

    /// Reads the body, logs it with the status and rejects non-2xx responses
    async fn checked_body(
        operation: &'static str,
        domain: &str,
        resp: Response,
    ) -> Result<String> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DdnsError::network(operation, e))?;

        info!(
            operation,
            domain,
            status = status.as_u16(),
            body = %body,
            "Registrar response"
        );

        if !status.is_success() {
            return Err(DdnsError::http_status(operation, status.as_u16(), body));
        }
        Ok(body)
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: reqwest::Method,
        domain: &str,
        payload: &T,
    ) -> Result<()> {
        let url = self.records_url(domain);
        let payload = serde_json::to_string(payload)
            .map_err(|e| DdnsError::protocol(operation, format!("encode payload: {}", e)))?;

        debug!(operation, %method, url = %url, payload = %payload, "Registrar request");
        let _timer = metrics::start_api_timer(operation);
        let resp = self
            .authorized(self.client.request(method, &url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| DdnsError::network(operation, e))?;

        Self::checked_body(operation, domain, resp).await?;
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for SpaceshipClient {
    /// Fetches the first page of records. Pages past the first are not requested.
    async fn list_records(&self, domain: &str) -> Result<RecordSet> {
        let url = self.records_url(domain);
        let take = LIST_PAGE_SIZE.to_string();

        debug!(operation = "list", url = %url, "Registrar request");
        let _timer = metrics::start_api_timer("list");
        let resp = self
            .authorized(self.client.get(&url))
            .query(&[("take", take.as_str()), ("skip", "0")])
            .send()
            .await
            .map_err(|e| DdnsError::network("list", e))?;

        let body = Self::checked_body("list", domain, resp).await?;
        let parsed: ListResponse = serde_json::from_str(&body)
            .map_err(|e| DdnsError::protocol("list", e.to_string()))?;

        if parsed.items.len() >= LIST_PAGE_SIZE as usize {
            debug!(
                count = parsed.items.len(),
                "Listing filled a whole page; later records are not considered"
            );
        }

        let records = index_by_name(parsed.items);
        for record in records.values() {
            debug!(domain, "Listed {}", record);
        }
        Ok(records)
    }

    async fn delete_record(&self, domain: &str, name: &str, address: &str) -> Result<()> {
        let payload = [DeleteItem {
            record_type: DNS_RECORD_TYPE_A,
            name,
            address,
        }];
        self.send_json("delete", reqwest::Method::DELETE, domain, &payload)
            .await
    }

    async fn add_record(&self, domain: &str, name: &str, address: &str) -> Result<()> {
        let payload = PutRequest {
            force: true,
            items: [PutItem {
                record_type: DNS_RECORD_TYPE_A,
                name,
                address,
                ttl: DNS_RECORD_TTL,
            }],
        };
        self.send_json("add", reqwest::Method::PUT, domain, &payload)
            .await
    }
}

/// True when the registrar rejected the credentials
pub fn is_auth_failure(err: &DdnsError) -> bool {
    matches!(
        err.status().and_then(|s| StatusCode::from_u16(s).ok()),
        Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    )
}

//==============================================================================
// Tests
//==============================================================================
