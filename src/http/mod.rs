//! HTTP protocol layer module
//!
//! Request inspection and response builders, decoupled from the redirect chain itself.

pub mod request;
pub mod response;

// Re-export commonly used items
pub use request::{
    encode_path, has_tool_flag, request_host, request_path, request_scheme, secure_url, Scheme,
};
pub use response::{
    build_405_response, build_500_response, build_metadata_response,
    build_redirect_response_with_code,
};
