// Configuration module entry point
// Loads layered configuration and validates the vanity identity

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ConfigError;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, LoggingConfig, PerformanceConfig, ProxyConfig, ServerConfig, VanityConfig,
};

/// Default config file (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; environment variables prefixed with `VANITY_`
    /// (nested keys joined by `__`) override it, and compiled-in defaults
    /// fill whatever is left.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("VANITY").separator("__"))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validated()
    }

    /// Check the vanity identity and normalize base URLs
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.server.workers == Some(0) {
            return Err(invalid("server.workers", "must be at least 1"));
        }

        let vanity = &mut self.vanity;

        let hostname = vanity.hostname.trim();
        if hostname.is_empty() {
            return Err(invalid("vanity.hostname", "must not be empty"));
        }
        if hostname.contains('/') || hostname.contains(char::is_whitespace) {
            return Err(invalid(
                "vanity.hostname",
                "must be a bare host without scheme or path",
            ));
        }
        vanity.hostname = hostname.to_string();

        if vanity.organization.trim_matches('/').is_empty() {
            return Err(invalid("vanity.organization", "must not be empty"));
        }
        vanity.organization = vanity.organization.trim_matches('/').to_string();

        check_base_url("vanity.doc_url", &vanity.doc_url)?;
        check_base_url("vanity.doc_search_url", &vanity.doc_search_url)?;
        check_base_url("vanity.repo_url", &vanity.repo_url)?;
        vanity.doc_url = vanity.doc_url.trim_end_matches('/').to_string();
        vanity.repo_url = vanity.repo_url.trim_end_matches('/').to_string();

        if vanity.vcs.trim().is_empty() {
            return Err(invalid("vanity.vcs", "must not be empty"));
        }
        if vanity.tool_param.is_empty() {
            return Err(invalid("vanity.tool_param", "must not be empty"));
        }

        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidAddress {
                addr: addr.clone(),
                reason: e.to_string(),
            })
    }
}

/// Apply compiled-in defaults for the go.kendal.io deployment
fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive", true)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("vanity.hostname", "go.kendal.io")?
        .set_default("vanity.doc_url", "https://godoc.org")?
        .set_default("vanity.doc_search_url", "https://godoc.org/?q=")?
        .set_default("vanity.repo_url", "https://github.com")?
        .set_default("vanity.organization", "kharland")?
        .set_default("vanity.vcs", "git")?
        .set_default("vanity.tool_param", "go-get")?
        .set_default("vanity.cache_max_age", 600)?
        .set_default("proxy.trust_forwarded_proto", true)
}

fn check_base_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, &e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
        return Err(invalid(field, "must be an absolute http(s) URL"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let settings = with_defaults(config::Config::builder())
        .and_then(|builder| builder.build())
        .expect("defaults build");
    let cfg: Config = settings.try_deserialize().expect("defaults deserialize");
    cfg.validated().expect("defaults are valid")
}
