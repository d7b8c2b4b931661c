// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use crate::logger::AccessLogFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub vanity: VanityConfig,
    pub proxy: ProxyConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads; tokio's default when unset, never 0
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    pub access_log: bool,
    /// `combined`, `common` or `json`
    #[serde(default)]
    pub access_log_format: AccessLogFormat,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Serve more than one request per connection
    pub keep_alive: bool,
    /// Seconds; 0 disables the header-read timeout
    pub read_timeout: u64,
    /// Seconds; the connection is bounded by `max(read_timeout, write_timeout)`, 0 for both means unbounded
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Identity of the vanity domain and where its packages really live
#[derive(Debug, Deserialize, Clone)]
pub struct VanityConfig {
    /// Domain the import paths are rooted at, e.g. `go.kendal.io`
    pub hostname: String,
    /// Documentation viewer base; browsers land on `{doc_url}/{host}{path}`
    pub doc_url: String,
    /// Documentation search prefix; the hostname is appended verbatim
    pub doc_search_url: String,
    /// Repository hosting base, e.g. `https://github.com`
    pub repo_url: String,
    /// Account or organization owning the repositories
    pub organization: String,
    /// VCS named in the go-import meta tag
    pub vcs: String,
    /// Query parameter a package tool sets to `1`
    pub tool_param: String,
    /// `max-age` of the metadata response, in seconds
    pub cache_max_age: u32,
}

/// Settings for running behind a TLS-terminating proxy
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Honor `X-Forwarded-Proto` when deciding whether a request arrived over plain HTTP
    pub trust_forwarded_proto: bool,
}
