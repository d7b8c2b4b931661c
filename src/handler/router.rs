//! Request routing dispatch module
//!
//! Every request walks the same ordered chain of guards. Each guard either
//! returns the final response or lets the request through to the next one:
//!
//! 1. plain HTTP is redirected to HTTPS (301)
//! 2. anything but GET is rejected (405)
//! 3. browsers, i.e. requests without the tool flag, go to the docs (307)
//! 4. package tools get the go-import metadata document (200)

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{LOCATION, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode};

use crate::config::{AppState, VanityConfig};
use crate::http::{self, Scheme};
use crate::logger::{self, AccessLogEntry};
use crate::vanity::PackageDescriptor;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let response = respond(&req, &state);

    if state.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }
    Ok(response)
}

/// Run the redirect chain; always yields exactly one complete response
pub fn respond<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(resp) = require_https(req, state.config.proxy.trust_forwarded_proto) {
        return resp;
    }
    if let Some(resp) = require_get(req) {
        return resp;
    }
    if let Some(resp) = redirect_browser_to_docs(req, &state.config.vanity) {
        return resp;
    }
    serve_go_import(req, state)
}

/// Redirect plain HTTP requests to the same URL over HTTPS
fn require_https<B>(req: &Request<B>, trust_forwarded_proto: bool) -> Option<Response<Full<Bytes>>> {
    if http::request_scheme(req, trust_forwarded_proto) != Scheme::Insecure {
        return None;
    }
    let target = http::secure_url(http::request_host(req), req.uri());
    Some(http::build_redirect_response_with_code(
        &target,
        StatusCode::MOVED_PERMANENTLY,
        wants_body(req.method()),
    ))
}

/// Reject every method but GET
fn require_get<B>(req: &Request<B>) -> Option<Response<Full<Bytes>>> {
    if req.method() == Method::GET {
        None
    } else {
        Some(http::build_405_response())
    }
}

/// Send requests without the package-tool flag to the documentation viewer
fn redirect_browser_to_docs<B>(
    req: &Request<B>,
    vanity: &VanityConfig,
) -> Option<Response<Full<Bytes>>> {
    if http::has_tool_flag(req.uri(), &vanity.tool_param) {
        return None;
    }

    // Only one leading slash is dropped, so "//" still goes to the viewer
    let path = http::request_path(req.uri());
    let target = if path.strip_prefix('/').unwrap_or(&*path).is_empty() {
        format!("{}{}", vanity.doc_search_url, vanity.hostname)
    } else {
        format!(
            "{}/{}{}",
            vanity.doc_url,
            http::request_host(req),
            http::encode_path(&path)
        )
    };

    Some(http::build_redirect_response_with_code(
        &target,
        StatusCode::TEMPORARY_REDIRECT,
        wants_body(req.method()),
    ))
}

/// Render the go-import document for the package containing the request path
fn serve_go_import<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    let vanity = &state.config.vanity;
    let descriptor = PackageDescriptor::for_path(&http::request_path(req.uri()), vanity);

    match state.template.render(&descriptor) {
        Ok(html) => http::build_metadata_response(html, vanity.cache_max_age),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to render go-import document for {}: {e}",
                descriptor.import_path
            ));
            http::build_500_response(&e.to_string())
        }
    }
}

fn wants_body(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

fn log_access<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let header = |name: hyper::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or_default();
    entry.location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, state.config.logging.access_log_format);
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use http_body_util::BodyExt;
    use hyper::header::{CACHE_CONTROL, HOST, LOCATION};

    fn state() -> AppState {
        AppState::new(&test_config()).unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<()> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(HOST, "go.kendal.io")
            .body(())
            .unwrap()
    }

    fn location(resp: &Response<Full<Bytes>>) -> &str {
        resp.headers()[LOCATION].to_str().unwrap()
    }

    fn body_string(resp: Response<Full<Bytes>>) -> String {
        let collected = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(resp.into_body().collect())
            .unwrap();
        String::from_utf8(collected.to_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_go_get_serves_metadata() {
        let resp = respond(&request("GET", "/widget?go-get=1"), &state());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CACHE_CONTROL], "public, max-age=600");
        assert!(body_string(resp).contains(
            r#"<meta name="go-import" content="go.kendal.io/widget git https://github.com/kharland/widget"/>"#
        ));
    }

    #[test]
    fn test_subpackage_maps_to_repository_root() {
        let resp = respond(&request("GET", "/widget/cmd/widgetd?go-get=1"), &state());
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp)
            .contains(r#"content="go.kendal.io/widget git https://github.com/kharland/widget""#));
    }

    #[test]
    fn test_go_get_on_root_uses_empty_package() {
        let resp = respond(&request("GET", "/?go-get=1"), &state());
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp)
            .contains(r#"content="go.kendal.io/ git https://github.com/kharland/""#));
    }

    #[test]
    fn test_insecure_redirects_to_https() {
        let resp = respond(&request("GET", "http://go.kendal.io/widget"), &state());
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location(&resp), "https://go.kendal.io/widget");
        assert!(resp.headers().get(CACHE_CONTROL).is_none());
    }

    #[test]
    fn test_https_upgrade_is_idempotent() {
        let state = state();
        let resp = respond(&request("GET", "http://go.kendal.io/widget?go-get=1"), &state);
        let target = location(&resp).to_string();
        assert_eq!(target, "https://go.kendal.io/widget?go-get=1");

        let resp = respond(&request("GET", &target), &state);
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_insecure_wins_over_method_check() {
        let resp = respond(&request("POST", "http://go.kendal.io/widget"), &state());
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(body_string(resp), "");
    }

    #[test]
    fn test_forwarded_proto_redirect() {
        let req = Request::builder()
            .uri("/widget?go-get=1")
            .header(HOST, "go.kendal.io")
            .header(http::request::X_FORWARDED_PROTO, "http")
            .body(())
            .unwrap();
        let resp = respond(&req, &state());
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location(&resp), "https://go.kendal.io/widget?go-get=1");

        let mut state = state();
        state.config.proxy.trust_forwarded_proto = false;
        assert_eq!(respond(&req, &state).status(), StatusCode::OK);
    }

    #[test]
    fn test_non_get_methods_rejected() {
        let state = state();
        for method in ["POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE"] {
            for uri in ["/widget?go-get=1", "/widget", "/"] {
                let resp = respond(&request(method, uri), &state);
                assert_eq!(
                    resp.status(),
                    StatusCode::METHOD_NOT_ALLOWED,
                    "{method} {uri}"
                );
                assert!(resp.headers().get(CACHE_CONTROL).is_none());
            }
        }
    }

    #[test]
    fn test_browser_redirects_to_docs() {
        let resp = respond(&request("GET", "/widget"), &state());
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&resp), "https://godoc.org/go.kendal.io/widget");
        assert!(resp.headers().get(CACHE_CONTROL).is_none());
    }

    #[test]
    fn test_browser_redirect_keeps_subpath() {
        let resp = respond(&request("GET", "/widget/cmd/widgetd"), &state());
        assert_eq!(
            location(&resp),
            "https://godoc.org/go.kendal.io/widget/cmd/widgetd"
        );
    }

    #[test]
    fn test_browser_on_root_goes_to_search() {
        let state = state();
        for uri in ["/", "/?go-get=0"] {
            let resp = respond(&request("GET", uri), &state);
            assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(location(&resp), "https://godoc.org/?q=go.kendal.io");
        }
    }

    #[test]
    fn test_browser_on_double_slash_goes_to_viewer() {
        let state = state();
        let resp = respond(&request("GET", "//"), &state);
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&resp), "https://godoc.org/go.kendal.io//");

        let resp = respond(&request("GET", "///"), &state);
        assert_eq!(location(&resp), "https://godoc.org/go.kendal.io///");
    }

    #[test]
    fn test_encoded_path_names_decoded_package() {
        let state = state();
        let resp = respond(&request("GET", "/wid%67et/cmd?go-get=1"), &state);
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp)
            .contains(r#"content="go.kendal.io/widget git https://github.com/kharland/widget""#));

        let resp = respond(&request("GET", "/wid%67et"), &state);
        assert_eq!(location(&resp), "https://godoc.org/go.kendal.io/widget");

        let resp = respond(&request("GET", "/a%20b"), &state);
        assert_eq!(location(&resp), "https://godoc.org/go.kendal.io/a%20b");
    }

    #[test]
    fn test_only_exact_flag_reaches_metadata() {
        let state = state();
        for query in ["go-get=true", "go-get=", "go-get=0", "go-get=01", "other=1"] {
            let resp = respond(&request("GET", &format!("/widget?{query}")), &state);
            assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{query}");
        }
    }

    #[test]
    fn test_doc_redirect_uses_request_host() {
        let req = Request::builder()
            .uri("/widget")
            .header(HOST, "mirror.example.com")
            .body(())
            .unwrap();
        let resp = respond(&req, &state());
        assert_eq!(location(&resp), "https://godoc.org/mirror.example.com/widget");
    }

    #[test]
    fn test_custom_identity() {
        let mut cfg = test_config();
        cfg.vanity.hostname = "go.example.org".to_string();
        cfg.vanity.repo_url = "https://gitlab.com".to_string();
        cfg.vanity.organization = "acme".to_string();
        cfg.vanity.cache_max_age = 60;
        let state = AppState::new(&cfg).unwrap();

        let req = Request::builder()
            .uri("/tool/v2?go-get=1")
            .header(HOST, "go.example.org")
            .body(())
            .unwrap();
        let resp = respond(&req, &state);
        assert_eq!(resp.headers()[CACHE_CONTROL], "public, max-age=60");
        assert!(body_string(resp)
            .contains(r#"content="go.example.org/tool git https://gitlab.com/acme/tool""#));
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(hyper::Version::HTTP_11), "1.1");
        assert_eq!(version_label(hyper::Version::HTTP_10), "1.0");
        assert_eq!(version_label(hyper::Version::HTTP_2), "2");
    }
}
