//! Request handler module
//!
//! Holds the redirect chain that turns every request into exactly one response.

pub mod router;

// Re-export main entry point
pub use router::{handle_request, respond};
