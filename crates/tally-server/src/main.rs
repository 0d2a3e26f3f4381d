use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use tally_server::{
    config::{AuthMode, Config},
    state::AppState,
};

/// `tally health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$TALLY_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("TALLY_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tally=info".parse()?)
                .add_directive("tally_server=info".parse()?)
                .add_directive("tally_duckdb=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Storage is the only hard dependency: failing to open it aborts startup.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/tally.db", cfg.data_dir);
    let db = tally_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    match &cfg.auth_mode {
        AuthMode::Token(_) => info!("Read API requires a bearer token"),
        AuthMode::None => warn!(
            "TALLY_ANALYTICS_TOKEN is not set: /api/analytics is open to anyone who can reach it"
        ),
    }

    let state = Arc::new(AppState::new(Arc::new(db), cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = tally_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "Tally listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;

    info!("Tally stopped");
    Ok(())
}
