// Connection handling module
// Accepts a single TCP connection and serves it with the redirect handler

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::{AppState, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Accept and process a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Bound on a whole connection: `max(read_timeout, write_timeout)`, none when both are 0
fn connection_timeout(perf: &PerformanceConfig) -> Option<Duration> {
    match std::cmp::max(perf.read_timeout, perf.write_timeout) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

/// Serve a single connection on a spawned task.
///
/// The counter is decremented when the task ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let mut builder = http1::Builder::new();
        builder.keep_alive(perf.keep_alive);
        if perf.read_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(perf.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        let served = match connection_timeout(perf) {
            Some(limit) => match tokio::time::timeout(limit, conn).await {
                Ok(result) => result,
                Err(_) => {
                    logger::log_warning(&format!(
                        "Connection from {peer_addr} timed out after {} seconds",
                        limit.as_secs()
                    ));
                    Ok(())
                }
            },
            None => conn.await,
        };
        if let Err(err) = served {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
