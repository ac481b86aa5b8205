//! Command line arguments
//!
//! Every field is optional here; [`crate::config::Config::resolve`] layers
//! them over the environment and the config file.

use std::path::PathBuf;

use clap::Parser;

/// Update the A records of a domain registered with Spaceship so they point
/// at this host's public IP address.
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "spaceship-ddns")]
#[command(version)]
pub struct Args {
    /// Domain to update
    #[arg(short, long)]
    pub domain: Option<String>,

    /// API key
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// API secret
    #[arg(short = 's', long)]
    pub api_secret: Option<String>,

    /// Target DNS name. Use @ for the domain root. Can be given multiple
    /// times, or through SPACESHIP_DDNS_NAMES (comma separated)
    #[arg(short = 'N', long = "name")]
    pub names: Vec<String>,

    /// Logging level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Run indefinitely with an optional delay in seconds between passes
    #[arg(
        long = "loop",
        value_name = "SECONDS",
        num_args = 0..=1,
        default_missing_value = "300"
    )]
    pub loop_delay: Option<u64>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HTTP timeout in seconds for every request
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// URL of the plain-text public IP service
    #[arg(long, value_name = "URL")]
    pub ip_service: Option<String>,

    /// Serve health and metrics on this port in loop mode (0 disables)
    #[arg(long, value_name = "PORT")]
    pub health_port: Option<u16>,

    /// In loop mode, log a failed pass and keep going instead of exiting
    #[arg(long)]
    pub keep_going: bool,
}
