//! Request inspection module
//!
//! Reads the few request attributes the redirect chain decides on: the scheme
//! the client used, the host it asked for, and the package-tool query flag.

use std::borrow::Cow;

use hyper::header::HOST;
use hyper::{Request, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes re-escaped when a decoded path goes back into a URL
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Forwarded scheme header set by TLS-terminating proxies
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Scheme a request arrived over, as far as the server can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Secure,
    Insecure,
}

/// Resolve the scheme a request was made with
///
/// Priority:
/// 1. Scheme of an absolute-form request target
/// 2. `X-Forwarded-Proto` (first value), when trusted
/// 3. Secure
pub fn request_scheme<B>(req: &Request<B>, trust_forwarded_proto: bool) -> Scheme {
    if let Some(scheme) = req.uri().scheme_str() {
        return scheme_from_str(scheme).unwrap_or(Scheme::Secure);
    }

    if trust_forwarded_proto {
        let forwarded = req
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| scheme_from_str(v.trim()));
        if let Some(scheme) = forwarded {
            return scheme;
        }
    }

    Scheme::Secure
}

fn scheme_from_str(s: &str) -> Option<Scheme> {
    if s.eq_ignore_ascii_case("http") {
        Some(Scheme::Insecure)
    } else if s.eq_ignore_ascii_case("https") {
        Some(Scheme::Secure)
    } else {
        None
    }
}

/// Host the request was addressed to (absolute-form authority, then `Host` header)
pub fn request_host<B>(req: &Request<B>) -> &str {
    if let Some(authority) = req.uri().authority() {
        return authority.as_str();
    }
    req.headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Percent-decoded request path
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn request_path(uri: &Uri) -> Cow<'_, str> {
    percent_decode_str(uri.path()).decode_utf8_lossy()
}

/// Escape a decoded path for use in a `Location` URL
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

/// First form-decoded value of `key` in the query string
pub fn query_value(query: Option<&str>, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Whether the request carries `{param}=1`, the package-tool marker
///
/// Only the exact value `1` counts; `true`, `01` and an empty value do not.
pub fn has_tool_flag(uri: &Uri, param: &str) -> bool {
    query_value(uri.query(), param).as_deref() == Some("1")
}

/// The request's URL with the scheme forced to https
pub fn secure_url(host: &str, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("https://{host}{path_and_query}")
}
