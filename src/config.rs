//! Configuration module for spaceship-ddns
//!
//! This module resolves configuration from command line arguments, environment
//! variables and an optional TOML file into one validated [`Config`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;
use zeroize::Zeroizing;

use crate::cli::Args;
use crate::constants::{
    DEFAULT_IP_SERVICE, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_API_SECRET,
    ENV_CONFIG, ENV_DOMAIN, ENV_NAMES, MAX_LOOP_DELAY_SECS, MAX_TIMEOUT_SECS,
    MIN_LOOP_DELAY_SECS, MIN_TIMEOUT_SECS,
};
use crate::error::{DdnsError, Result};
use crate::validation::{validate_domain, validate_record_name};

//==============================================================================
// Config
//==============================================================================

/// Validated configuration, immutable for the life of the process
///
/// # Configuration Loading Priority
///
/// Each field is taken from the first source that provides it:
/// 1. Command line arguments
/// 2. Environment variables (`SPACESHIP_DDNS_*`, empty values are ignored)
/// 3. Config file (`--config` or `SPACESHIP_DDNS_CONFIG`)
/// 4. Defaults, or a configuration error for required fields
#[derive(Clone)]
pub struct Config {
    /// Domain whose records are managed (e.g. "example.com")
    pub domain: String,
    /// Spaceship API key
    pub api_key: Zeroizing<String>,
    /// Spaceship API secret
    pub api_secret: Zeroizing<String>,
    /// Record names kept in sync, in the order given, without duplicates
    pub names: Vec<String>,
    /// Maximum log level
    pub log_level: LevelFilter,
    /// Delay between passes; `None` runs a single pass
    pub loop_delay: Option<Duration>,
    /// Timeout applied to every HTTP request
    pub timeout: Duration,
    /// Plain-text public IP service
    pub ip_service: String,
    /// Health endpoint port in loop mode (0 = disabled)
    pub health_port: u16,
    /// Keep looping after a failed pass
    pub keep_going: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("api_key", &"***REDACTED***")
            .field("api_secret", &"***REDACTED***")
            .field("names", &self.names)
            .field("log_level", &self.log_level)
            .field("loop_delay", &self.loop_delay)
            .field("timeout", &self.timeout)
            .field("ip_service", &self.ip_service)
            .field("health_port", &self.health_port)
            .field("keep_going", &self.keep_going)
            .finish()
    }
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub domain: Option<String>,
    pub api_key: Option<Zeroizing<String>>,
    pub api_secret: Option<Zeroizing<String>>,
    pub names: Option<Vec<String>>,
    pub log_level: Option<String>,
    pub loop_delay: Option<u64>,
    pub timeout: Option<u64>,
    pub ip_service: Option<String>,
    pub health_port: Option<u16>,
    pub keep_going: Option<bool>,
}

impl FileConfig {
    /// Reads and parses a TOML config file
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DdnsError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            DdnsError::config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }
}

impl Config {
    /// Loads configuration from the process environment and the config file
    ///
    /// The file path comes from `--config`, else `SPACESHIP_DDNS_CONFIG`. A
    /// path that was given but cannot be read is an error.
    pub fn load(args: &Args) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let path: Option<PathBuf> = args
            .config
            .clone()
            .or_else(|| non_empty(env(ENV_CONFIG)).map(PathBuf::from));
        let file = path.as_deref().map(FileConfig::read).transpose()?;
        Self::resolve(args, env, file)
    }

    /// Layers CLI over environment over file and validates the result
    ///
    /// Pure apart from calling `env`; no network or file access.
    pub fn resolve<E>(args: &Args, env: E, file: Option<FileConfig>) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();
        let env = |key: &str| non_empty(env(key));

        let domain = args
            .domain
            .clone()
            .or_else(|| env(ENV_DOMAIN))
            .or(file.domain)
            .map(|d| d.trim().to_string())
            .ok_or_else(|| missing("domain", "--domain", ENV_DOMAIN))?;
        validate_domain(&domain)?;
        // The records endpoint takes the bare zone name
        let domain = domain.strip_suffix('.').unwrap_or(&domain).to_string();

        let api_key = args
            .api_key
            .clone()
            .map(Zeroizing::new)
            .or_else(|| env(ENV_API_KEY).map(Zeroizing::new))
            .or(file.api_key)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| missing("API key", "--api-key", ENV_API_KEY))?;

        let api_secret = args
            .api_secret
            .clone()
            .map(Zeroizing::new)
            .or_else(|| env(ENV_API_SECRET).map(Zeroizing::new))
            .or(file.api_secret)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("API secret", "--api-secret", ENV_API_SECRET))?;

        let raw_names: Vec<String> = if !args.names.is_empty() {
            args.names.clone()
        } else if let Some(list) = env(ENV_NAMES) {
            list.split(',').map(str::to_string).collect()
        } else {
            file.names.unwrap_or_default()
        };
        let names = normalize_names(raw_names)?;
        if names.is_empty() {
            return Err(missing("target names", "-N/--name", ENV_NAMES));
        }

        let log_level = parse_log_level(
            args.log_level
                .as_deref()
                .or(file.log_level.as_deref())
                .unwrap_or(DEFAULT_LOG_LEVEL),
        )?;

        let loop_delay = match args.loop_delay.or(file.loop_delay) {
            Some(secs) if !(MIN_LOOP_DELAY_SECS..=MAX_LOOP_DELAY_SECS).contains(&secs) => {
                return Err(DdnsError::config(format!(
                    "loop delay must be between {} and {} seconds, got {}",
                    MIN_LOOP_DELAY_SECS, MAX_LOOP_DELAY_SECS, secs
                )));
            }
            other => other.map(Duration::from_secs),
        };

        let timeout_secs = args
            .timeout
            .or(file.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(DdnsError::config(format!(
                "timeout must be between {} and {} seconds, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, timeout_secs
            )));
        }

        let ip_service = args
            .ip_service
            .clone()
            .or(file.ip_service)
            .unwrap_or_else(|| DEFAULT_IP_SERVICE.to_string());
        if !(ip_service.starts_with("https://") || ip_service.starts_with("http://")) {
            return Err(DdnsError::config(format!(
                "ip service must be an http(s) URL, got: {}",
                ip_service
            )));
        }

        Ok(Self {
            domain,
            api_key,
            api_secret,
            names,
            log_level,
            loop_delay,
            timeout: Duration::from_secs(timeout_secs),
            ip_service,
            health_port: args.health_port.or(file.health_port).unwrap_or(0),
            keep_going: args.keep_going || file.keep_going.unwrap_or(false),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing(what: &str, flag: &str, env: &str) -> DdnsError {
    DdnsError::config(format!(
        "Missing {}: use {} or set the {} environment variable",
        what, flag, env
    ))
}

/// Trims names, drops empty entries and duplicates, then validates each
fn normalize_names(raw: Vec<String>) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let name = name.trim();
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        validate_record_name(name)?;
        names.push(name.to_string());
    }
    Ok(names)
}

/// Parses a log level name
///
/// Accepts the usual names case-insensitively, plus `WARNING` and `CRITICAL`
/// as aliases for `warn` and `error`.
pub fn parse_log_level(value: &str) -> Result<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(DdnsError::config(format!(
            "Invalid log level: '{}'. Use: DEBUG|INFO|WARNING|ERROR|CRITICAL",
            value
        ))),
    }
}

//==============================================================================
// Tests
//==============================================================================
