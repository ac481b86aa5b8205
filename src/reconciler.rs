//! Reconciliation of target records against the current public address
//!
//! One pass: discover the address, list the domain's records, then bring each
//! target name in line. Names are processed in order and independently; a
//! failing name is recorded and the remaining names are still processed.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dns_provider::{DnsProvider, DnsRecord};
use crate::error::{DdnsError, Result};
use crate::ip_source::IpSource;
use crate::metrics;

//==============================================================================
// Planning
//==============================================================================

/// What a pass does for one target name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordAction {
    /// Name is absent; add it with the current address
    Create,
    /// A record already points at the current address
    Unchanged,
    /// Name exists with a non-A type and is left alone
    SkipNonA { record_type: String },
    /// A record points elsewhere; delete `old_address`, then add
    Update { old_address: String },
}

/// Decides the action for `name` given the listed record, if any
///
/// An A record that carries no address is treated like an absent one, the
/// forced add overwrites it.
pub fn plan_action(existing: Option<&DnsRecord>, current_ip: Ipv4Addr) -> RecordAction {
    let Some(record) = existing else {
        return RecordAction::Create;
    };
    if !record.is_a_record() {
        return RecordAction::SkipNonA {
            record_type: record.record_type.clone(),
        };
    }
    match record.address.as_deref() {
        None => RecordAction::Create,
        Some(address) if same_address(address, current_ip) => RecordAction::Unchanged,
        Some(address) => RecordAction::Update {
            old_address: address.to_string(),
        },
    }
}

/// Compares parsed addresses when possible so `1.2.3.4` equals ` 1.2.3.4`
fn same_address(address: &str, current_ip: Ipv4Addr) -> bool {
    match address.trim().parse::<IpAddr>() {
        Ok(parsed) => parsed == IpAddr::V4(current_ip),
        Err(_) => address == current_ip.to_string(),
    }
}

//==============================================================================
// Report
//==============================================================================

/// Outcome of one pass, names grouped by what happened to them
#[derive(Debug, Default)]
pub struct PassReport {
    pub address: Option<Ipv4Addr>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, DdnsError)>,
}

impl PassReport {
    /// Number of names the pass looked at
    pub fn total(&self) -> usize {
        self.created.len()
            + self.updated.len()
            + self.unchanged.len()
            + self.skipped.len()
            + self.failed.len()
    }

    /// True when at least one add or delete call was issued successfully
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty()
    }

    /// Converts a report with failed names into [`DdnsError::PartialFailure`]
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            return Ok(self);
        }
        Err(DdnsError::PartialFailure {
            failed: self.failed.iter().map(|(name, _)| name.clone()).collect(),
            total: self.total(),
        })
    }
}

//==============================================================================
// Reconciler
//==============================================================================

pub struct Reconciler {
    domain: String,
    names: Vec<String>,
    provider: Arc<dyn DnsProvider>,
    ip_source: Arc<dyn IpSource>,
}

impl Reconciler {
    pub fn new(
        domain: impl Into<String>,
        names: Vec<String>,
        provider: Arc<dyn DnsProvider>,
        ip_source: Arc<dyn IpSource>,
    ) -> Self {
        Self {
            domain: domain.into(),
            names,
            provider,
            ip_source,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Runs one reconciliation pass
    ///
    /// IP discovery and listing failures abort the pass before any mutating
    /// call. Failures on individual names are collected in the report; use
    /// [`PassReport::into_result`] to treat them as a pass failure.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let current_ip = self.ip_source.current().await?;
        info!(domain = %self.domain, address = %current_ip, "Current public address");

        let records = self.provider.list_records(&self.domain).await?;

        let mut report = PassReport {
            address: Some(current_ip),
            ..PassReport::default()
        };
        let address = current_ip.to_string();

        for name in &self.names {
            let action = plan_action(records.get(name), current_ip);
            match self.apply(name, &action, &address).await {
                Ok(()) => {
                    let (bucket, label) = match action {
                        RecordAction::Create => (&mut report.created, "created"),
                        RecordAction::Update { .. } => (&mut report.updated, "updated"),
                        RecordAction::Unchanged => (&mut report.unchanged, "unchanged"),
                        RecordAction::SkipNonA { .. } => (&mut report.skipped, "skipped"),
                    };
                    bucket.push(name.clone());
                    metrics::record_action(label);
                }
                Err(e) => {
                    error!(
                        record = %name,
                        error = %e,
                        kind = e.kind(),
                        "Record reconciliation failed"
                    );
                    metrics::record_action("failed");
                    report.failed.push((name.clone(), e));
                }
            }
        }

        info!(
            domain = %self.domain,
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            changed = report.changed(),
            "Pass finished"
        );
        Ok(report)
    }

    async fn apply(&self, name: &str, action: &RecordAction, address: &str) -> Result<()> {
        match action {
            RecordAction::Create => {
                info!(record = name, address, "Creating entry");
                self.provider.add_record(&self.domain, name, address).await
            }
            RecordAction::Unchanged => {
                info!(record = name, address, "Address is correctly configured");
                Ok(())
            }
            RecordAction::SkipNonA { record_type } => {
                warn!(record = name, record_type = %record_type, "Not an A-record, ignoring");
                Ok(())
            }
            RecordAction::Update { old_address } => {
                info!(record = name, old = %old_address, new = address, "Updating entry");
                self.provider
                    .update_record(&self.domain, name, old_address, address)
                    .await
            }
        }
    }
}

//==============================================================================
// Tests
//==============================================================================
