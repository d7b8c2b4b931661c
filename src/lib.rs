//! Vanity import path redirector
//!
//! Serves `go-import` metadata for packages under a custom domain and sends
//! browsers to the package documentation instead.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod vanity;
