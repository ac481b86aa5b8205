//! spaceship-ddns - dynamic DNS updater for domains hosted on Spaceship
//!
//! Architecture:
//! - [`ip_source`] discovers the public IPv4 address over HTTP
//! - [`spaceship`] talks to the registrar's DNS records API
//! - [`reconciler`] diffs target names against the listing and issues
//!   add/delete calls
//! - [`scheduler`] repeats passes in loop mode until stopped

pub mod cli;
pub mod config;
pub mod constants;
pub mod dns_provider;
pub mod error;
pub mod health;
pub mod ip_source;
pub mod metrics;
pub mod reconciler;
pub mod scheduler;
pub mod spaceship;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{DdnsError, Result};
