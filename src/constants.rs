//! Common constants used throughout the spaceship-ddns application

//==============================================================================
// Spaceship API Constants
//==============================================================================

/// Spaceship DNS records endpoint; the domain is appended as a path segment
pub const SPACESHIP_RECORDS_ENDPOINT: &str = "https://spaceship.dev/api/v1/dns/records";

/// Header carrying the API key
pub const HEADER_API_KEY: &str = "X-API-Key";

/// Header carrying the API secret
pub const HEADER_API_SECRET: &str = "X-API-Secret";

/// User agent string for outgoing requests
pub const USER_AGENT: &str = concat!("spaceship-ddns/", env!("CARGO_PKG_VERSION"));

/// Page size for record listings. Anything beyond the first page is not fetched.
pub const LIST_PAGE_SIZE: u32 = 500;

/// DNS record type managed by this tool
pub const DNS_RECORD_TYPE_A: &str = "A";

/// TTL for records created by this tool
pub const DNS_RECORD_TTL: u64 = 1800;

//==============================================================================
// IP Discovery Constants
//==============================================================================

/// Default "what is my IP" service, returns the address as plain text
pub const DEFAULT_IP_SERVICE: &str = "https://api.ipify.org";

//==============================================================================
// Timeout and Interval Constants
//==============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Loop delay used when `--loop` is given without a value
pub const DEFAULT_LOOP_DELAY_SECS: u64 = 300;

/// Minimum loop delay in seconds
pub const MIN_LOOP_DELAY_SECS: u64 = 1;

/// Maximum loop delay in seconds (one day)
pub const MAX_LOOP_DELAY_SECS: u64 = 86_400;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

//==============================================================================
// Validation Constants
//==============================================================================

/// Maximum DNS name length in characters
pub const MAX_RECORD_NAME_LENGTH: usize = 253;

/// Maximum DNS label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

//==============================================================================
// Environment Variable Names
//==============================================================================

/// Environment variable name for the domain
pub const ENV_DOMAIN: &str = "SPACESHIP_DDNS_DOMAIN";

/// Environment variable name for the API key
pub const ENV_API_KEY: &str = "SPACESHIP_DDNS_API_KEY";

/// Environment variable name for the API secret
pub const ENV_API_SECRET: &str = "SPACESHIP_DDNS_API_SECRET";

/// Environment variable name for the comma-separated target names
pub const ENV_NAMES: &str = "SPACESHIP_DDNS_NAMES";

/// Environment variable name for the TOML config file path
pub const ENV_CONFIG: &str = "SPACESHIP_DDNS_CONFIG";
