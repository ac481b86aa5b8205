//! Validation utilities for spaceship-ddns
//!
//! This module provides validation functions for record names, domains and
//! the address returned by the IP discovery service.

use std::net::Ipv4Addr;

use crate::constants::{MAX_LABEL_LENGTH, MAX_RECORD_NAME_LENGTH};
use crate::error::{DdnsError, Result};

/// Validates a target record name relative to the domain
///
/// # Validation Rules
///
/// - `@` is the apex of the domain and always valid
/// - Labels are separated by dots, none may be empty
/// - Labels are at most 63 characters, the whole name at most 253
/// - Labels cannot start or end with hyphens
/// - Allowed characters: letters, digits, `-`, `_`
/// - `*` is allowed as a complete label (wildcard records)
///
/// # Examples
///
/// ```
/// use spaceship_ddns::validation::validate_record_name;
///
/// assert!(validate_record_name("@").is_ok());
/// assert!(validate_record_name("www").is_ok());
/// assert!(validate_record_name("*.dev").is_ok());
/// assert!(validate_record_name("").is_err());
/// assert!(validate_record_name("-bad").is_err());
/// ```
pub fn validate_record_name(record_name: &str) -> Result<()> {
    if record_name.is_empty() {
        return Err(DdnsError::config("Record name cannot be empty"));
    }
    if record_name == "@" {
        return Ok(());
    }
    validate_labels(record_name, "Record name", true)
}

/// Validates the domain the records live under (e.g. `example.com`)
///
/// Wildcards and `@` are rejected; a single trailing dot is tolerated.
pub fn validate_domain(domain: &str) -> Result<()> {
    let name = domain.strip_suffix('.').unwrap_or(domain);
    if name.is_empty() {
        return Err(DdnsError::config("Domain cannot be empty"));
    }
    validate_labels(name, "Domain", false)?;
    if !name.contains('.') {
        return Err(DdnsError::config(format!(
            "Domain must contain at least one dot, got: {}",
            domain
        )));
    }
    Ok(())
}

fn validate_labels(name: &str, what: &str, allow_wildcard: bool) -> Result<()> {
    if name.contains(char::is_whitespace) {
        return Err(DdnsError::config(format!("{} cannot contain spaces", what)));
    }
    if name.len() > MAX_RECORD_NAME_LENGTH {
        return Err(DdnsError::config(format!(
            "{} too long (max {} characters, got {})",
            what,
            MAX_RECORD_NAME_LENGTH,
            name.len()
        )));
    }
    if name.starts_with('.') {
        return Err(DdnsError::config(format!("{} cannot start with a dot", what)));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(DdnsError::config(format!("{} contains empty label", what)));
        }
        if label == "*" {
            if allow_wildcard {
                continue;
            }
            return Err(DdnsError::config(format!("{} cannot contain wildcards", what)));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(DdnsError::config(format!(
                "{} label too long (max {} characters, got {})",
                what,
                MAX_LABEL_LENGTH,
                label.len()
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(DdnsError::config(format!(
                "{} label cannot start or end with hyphen",
                what
            )));
        }
        if let Some(ch) = label
            .chars()
            .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '-' && *ch != '_')
        {
            return Err(DdnsError::config(format!(
                "{} contains invalid character: '{}' (allowed: letters, digits, '-', '_')",
                what, ch
            )));
        }
    }

    Ok(())
}

/// Parses the body returned by the IP discovery service
///
/// Surrounding whitespace is ignored. Only IPv4 literals are accepted since
/// only A records are managed.
pub fn parse_public_ipv4(body: &str) -> Result<Ipv4Addr> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(DdnsError::ip_discovery("empty response body"));
    }
    match trimmed.parse::<std::net::IpAddr>() {
        Ok(std::net::IpAddr::V4(addr)) => {
            if addr.is_unspecified() || addr.is_loopback() {
                return Err(DdnsError::ip_discovery(format!(
                    "refusing non-routable address {}",
                    addr
                )));
            }
            Ok(addr)
        }
        Ok(std::net::IpAddr::V6(addr)) => Err(DdnsError::ip_discovery(format!(
            "expected an IPv4 address, got {}",
            addr
        ))),
        Err(_) => Err(DdnsError::ip_discovery(format!(
            "response is not an IP address: {:?}",
            truncate(trimmed, 64)
        ))),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
