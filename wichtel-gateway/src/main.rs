//! Entry point for the `wichtel-gateway` HTTP server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use wichtel_gateway::{
    config::GatewayConfig,
    pool::EventPool,
    routes::{create_router, AppState},
    verify::verifier_for,
};
use wichtel_mail::{create_backend, MailSettings};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {e}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env();
    let settings = match MailSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "invalid mail configuration");
            std::process::exit(1);
        }
    };

    let backend = match create_backend(&settings).await {
        Ok(b) => Arc::new(b),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise mail backend");
            std::process::exit(1);
        }
    };
    info!(backend = %backend.kind(), "mail backend ready");

    let state = AppState {
        pool: Arc::new(EventPool::new(backend, settings.send_timeout)),
        verifier: Arc::from(verifier_for(&config)),
        config: Arc::new(config.clone()),
    };
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %config.listen_addr, public_url = %config.public_url, "wichtel-gateway listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
