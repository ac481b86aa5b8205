//! Test doubles shared by the unit tests

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::dns_provider::{index_by_name, DnsProvider, DnsRecord, RecordSet};
use crate::error::{DdnsError, Result};
use crate::ip_source::IpSource;

/// Calls observed by [`FakeProvider`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Delete(String, String),
    Add(String, String),
}

/// In-memory registrar that records every call
#[derive(Default)]
pub struct FakeProvider {
    records: Mutex<RecordSet>,
    calls: Mutex<Vec<Call>>,
    list_error: Mutex<Option<DdnsError>>,
    failing_adds: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl FakeProvider {
    pub fn with_records(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Mutex::new(index_by_name(records)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, Call::List(_)))
            .count()
    }

    pub fn records(&self) -> RecordSet {
        self.records.lock().unwrap().clone()
    }

    /// Next listing fails with `err`
    pub fn fail_list(&self, err: DdnsError) {
        *self.list_error.lock().unwrap() = Some(err);
    }

    pub fn fail_add_for(&self, name: &str) {
        self.failing_adds.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_delete_for(&self, name: &str) {
        self.failing_deletes.lock().unwrap().insert(name.to_string());
    }
}

#[async_trait]
impl DnsProvider for FakeProvider {
    async fn list_records(&self, domain: &str) -> Result<RecordSet> {
        self.calls.lock().unwrap().push(Call::List(domain.to_string()));
        if let Some(err) = self.list_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.records())
    }

    async fn delete_record(&self, _domain: &str, name: &str, address: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(name.to_string(), address.to_string()));
        if self.failing_deletes.lock().unwrap().contains(name) {
            return Err(DdnsError::http_status("delete", 500, "internal error"));
        }
        let mut records = self.records.lock().unwrap();
        if records.get(name).and_then(|r| r.address.as_deref()) == Some(address) {
            records.remove(name);
        }
        Ok(())
    }

    async fn add_record(&self, _domain: &str, name: &str, address: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Add(name.to_string(), address.to_string()));
        if self.failing_adds.lock().unwrap().contains(name) {
            return Err(DdnsError::http_status("add", 422, "rejected"));
        }
        self.records
            .lock()
            .unwrap()
            .insert(name.to_string(), DnsRecord::a(name, address, 1800));
        Ok(())
    }
}

/// IP source returning a fixed address or a fixed failure
pub struct FakeIpSource {
    result: std::result::Result<Ipv4Addr, String>,
    lookups: Mutex<usize>,
}

impl FakeIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            result: Ok(ip),
            lookups: Mutex::new(0),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
            lookups: Mutex::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl IpSource for FakeIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        *self.lookups.lock().unwrap() += 1;
        self.result.clone().map_err(DdnsError::ip_discovery)
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `fut` with a thread-local subscriber and returns its formatted output
///
/// Only valid on the current-thread runtime `#[tokio::test]` uses by default.
pub async fn capture_logs<F: Future>(fut: F) -> (F::Output, String) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let guard = tracing::subscriber::set_default(subscriber);
    let out = fut.await;
    drop(guard);

    let logs = String::from_utf8_lossy(&buf.0.lock().unwrap()).into_owned();
    (out, logs)
}
