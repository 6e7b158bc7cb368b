//! appveil bridge binary.
//!
//! Loads the config, opens the local policy store, initializes the sync
//! bridge from the configured consumer signal, and serves read-only
//! diagnostics.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use appveil_bridge::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("APPVEIL_CONFIG").unwrap_or_else(|_| "appveil.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.diagnostics.listen.parse()?;

    let state = app_state::AppState::new(cfg)?;
    if !state.bridge().is_protection_active() {
        tracing::warn!("protection inactive: consumer missing or not synced");
    }
    let app = router::build_router(state);

    tracing::info!(%listen, "appveil-bridge diagnostics starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
