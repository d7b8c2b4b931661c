use std::sync::Arc;

use vanity_redirect::config::{self, AppState, Config};
use vanity_redirect::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;

    logger::init(&cfg.logging).map_err(|e| format!("Failed to initialize logging: {e}"))?;

    // Worker thread count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_listener(addr)?;
    let state = Arc::new(AppState::new(&cfg)?);

    logger::log_server_start(&listener.local_addr()?, &cfg);

    server::serve(listener, state, server::shutdown_signal()).await;
    tracing::info!("server stopped");
    Ok(())
}
