mod api;
mod app;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod pipeline;
mod state;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use acquisitions_core::{MemoryUserStore, SlidingWindowOracle, UserStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "acquisitions_web=debug,acquisitions_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let tls_config = config.tls.clone();
    let oracle = Arc::new(SlidingWindowOracle::new(config.rate_limit.mode));
    tracing::info!(
        environment = ?config.environment,
        mode = ?oracle.mode(),
        trust_proxy_headers = config.rate_limit.trust_proxy_headers,
        "Starting Acquisitions API"
    );

    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    state::seed_admin(users.as_ref(), &config.bootstrap).await?;
    if users.count_admins().await? == 0 {
        tracing::warn!("No admin account exists; set ACQ_ADMIN_EMAIL and ACQ_ADMIN_PASSWORD_HASH");
    }

    let state = AppState::new(config, users, oracle.clone());

    // Rate-limit log + revoked token cleanup task
    let cleanup_state = state.clone();
    let window = state.policies.longest_window();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            oracle.purge(Instant::now(), window);
            cleanup_state.purge_revoked();
            tracing::debug!(
                tracked_clients = oracle.tracked_clients(),
                revoked_tokens = cleanup_state.revoked_tokens.len(),
                "Cleanup pass finished"
            );
        }
    });

    let app = app::build_router(state)?;

    if let (Some(cert), Some(key)) = (&tls_config.cert_path, &tls_config.key_path) {
        use axum_server::tls_rustls::RustlsConfig;
        let rustls_config = RustlsConfig::from_pem_file(cert, key).await?;
        tracing::info!("acquisitions-web listening on https://{}", bind_addr);
        axum_server::bind_rustls(bind_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!("acquisitions-web listening on http://{}", bind_addr);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
