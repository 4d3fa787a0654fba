use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use relay_logging::relay_info;
use relay_server::config::RelayConfig;
use relay_server::state::AppState;
use relay_server::{logging, router};

const SWEEP_INTERVAL: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "relay_config.ron".to_string());
    let config = RelayConfig::load(&PathBuf::from(config_path));
    logging::initialize(config.log_destination);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let state = AppState::from_config(config)?;

    // Periodic sweep so idle clients fall out of the rate-limit map.
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.sweep();
        }
    });

    let app = router(state);
    relay_info!("relay listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    relay_info!("shutdown requested");
}
