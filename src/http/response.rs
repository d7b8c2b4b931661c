//! HTTP response building module
//!
//! Builders for every response the redirect chain can produce.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS};
use hyper::{Response, StatusCode};

use crate::vanity::template::escape_attr;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Build a redirect response with the given status
///
/// With `with_body` set (GET and HEAD), a short HTML link to the target is
/// included for clients that do not follow `Location`.
pub fn build_redirect_response_with_code(
    target: &str,
    code: StatusCode,
    with_body: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(code).header(LOCATION, target);

    let body = if with_body {
        builder = builder.header(CONTENT_TYPE, TEXT_HTML);
        Bytes::from(format!(
            "<a href=\"{}\">{}</a>.\n",
            escape_attr(target),
            code.canonical_reason().unwrap_or_default()
        ))
    } else {
        Bytes::new()
    };

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(code.as_str(), &e);
        fallback(code)
    })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    text_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed", Some("GET"))
}

/// Build 500 Internal Server Error response carrying the error text
pub fn build_500_response(message: &str) -> Response<Full<Bytes>> {
    text_error(StatusCode::INTERNAL_SERVER_ERROR, message, None)
}

/// Build the 200 go-import metadata response
///
/// The only response that carries `Cache-Control`.
pub fn build_metadata_response(html: String, max_age: u32) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, TEXT_HTML)
        .header(CACHE_CONTROL, format!("public, max-age={max_age}"))
        .body(Full::new(Bytes::from(html)))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

fn text_error(code: StatusCode, message: &str, allow: Option<&str>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(code)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff");
    if let Some(methods) = allow {
        builder = builder.header(ALLOW, methods);
    }

    builder
        .body(Full::new(Bytes::from(format!("{message}\n"))))
        .unwrap_or_else(|e| {
            log_build_error(code.as_str(), &e);
            fallback(code)
        })
}

fn fallback(code: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = code;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
