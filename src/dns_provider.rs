//! DNS provider abstraction layer
//!
//! This module defines the record shape returned by the registrar and the
//! trait the reconciler drives. The Spaceship client is the only
//! implementation; tests substitute recording fakes.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::Result;

//==============================================================================
// Types
//==============================================================================

/// One DNS record as returned by a listing
///
/// Fields the reconciler does not look at are kept in `extra` and serialized
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Host label relative to the domain (`@`, `www`, ...)
    pub name: String,
    /// Record type (`A`, `MX`, `TXT`, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Address for A/AAAA records; other record types carry no address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Time-to-live in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Provider specific fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DnsRecord {
    /// Builds an A record with no extra fields
    pub fn a(name: impl Into<String>, address: impl Into<String>, ttl: u64) -> Self {
        Self {
            name: name.into(),
            record_type: crate::constants::DNS_RECORD_TYPE_A.to_string(),
            address: Some(address.into()),
            ttl: Some(ttl),
            extra: serde_json::Map::new(),
        }
    }

    /// Exact match on `A`; the registrar always reports upper-case types
    pub fn is_a_record(&self) -> bool {
        self.record_type == crate::constants::DNS_RECORD_TYPE_A
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DNS {} {} -> {} (TTL: {})",
            self.record_type,
            self.name,
            self.address.as_deref().unwrap_or("-"),
            self.ttl.map_or_else(|| "-".to_string(), |t| t.to_string())
        )
    }
}

/// Records of one domain keyed by name
///
/// A listing holding the same name twice keeps the later item.
pub type RecordSet = BTreeMap<String, DnsRecord>;

/// Collects listed records into a [`RecordSet`]
pub fn index_by_name(records: impl IntoIterator<Item = DnsRecord>) -> RecordSet {
    let mut set = RecordSet::new();
    for record in records {
        set.insert(record.name.clone(), record);
    }
    set
}

//==============================================================================
// Trait
//==============================================================================

/// Operations the reconciler needs from a registrar
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Lists the records of `domain` keyed by name
    async fn list_records(&self, domain: &str) -> Result<RecordSet>;

    /// Deletes the A record `name -> address`
    async fn delete_record(&self, domain: &str, name: &str, address: &str) -> Result<()>;

    /// Creates or overwrites the A record `name -> address`
    async fn add_record(&self, domain: &str, name: &str, address: &str) -> Result<()>;

    /// Replaces `name -> old_address` with `name -> new_address`
    ///
    /// Deletes first, then adds. This is not atomic: when the add fails the
    /// name stays absent until the next pass. If the delete fails, the add
    /// is not attempted.
    async fn update_record(
        &self,
        domain: &str,
        name: &str,
        old_address: &str,
        new_address: &str,
    ) -> Result<()> {
        self.delete_record(domain, name, old_address).await?;
        info!(record = name, old = old_address, "Deleted old record, adding replacement");
        if let Err(e) = self.add_record(domain, name, new_address).await {
            error!(
                record = name,
                old = old_address,
                new = new_address,
                error = %e,
                "Add failed after delete, record is absent until the next pass"
            );
            return Err(e);
        }
        Ok(())
    }
}

//==============================================================================
// Tests
//==============================================================================
