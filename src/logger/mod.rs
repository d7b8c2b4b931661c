//! Logger module
//!
//! Provides logging utilities for the redirect server including:
//! - Subscriber initialization (`tracing` + `EnvFilter`)
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging

mod format;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. Should be called once at
/// application startup.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        listen = %addr,
        hostname = %config.vanity.hostname,
        repo = %format!("{}/{}", config.vanity.repo_url, config.vanity.organization),
        workers = ?config.server.workers,
        "vanity redirect server started"
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
