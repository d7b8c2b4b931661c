//! Error types
//!
//! Configuration errors surface at start-up; template errors are the only
//! failure a request can hit and are turned into a 500 response.

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Meta template parse and render errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated { offset: usize },

    #[error("unknown placeholder '{{{{{name}}}}}'")]
    UnknownField { name: String },

    #[error("failed to write template output: {0}")]
    Write(#[from] std::fmt::Error),
}
