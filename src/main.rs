//! PremiAds server
//!
//! Serves the moderation gateway, the Mercado Pago webhooks and the
//! participant API.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use premiads_server::baas::SupabaseClient;
use premiads_server::config::Config;
use premiads_server::payments::{MercadoPagoClient, PaymentProvider};
use premiads_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        supabase_url = %config.supabase_url,
        service_role_key = %config.service_role_key_masked(),
        signature_policy = ?config.webhook_signature_policy,
        "Configuration loaded"
    );

    let baas = Arc::new(SupabaseClient::new(&config).context("Failed to build Supabase client")?);

    let payment_provider: Option<Arc<dyn PaymentProvider>> =
        match config.mercado_pago_access_token.clone() {
            Some(token) => Some(Arc::new(
                MercadoPagoClient::new(
                    config.mercado_pago_api_url.clone(),
                    token,
                    config.http_timeout_seconds,
                )
                .context("Failed to build Mercado Pago client")?,
            )),
            None => {
                tracing::warn!("MERCADO_PAGO_ACCESS_TOKEN not set; payment webhooks will fail");
                None
            }
        };

    if config.mercado_pago_webhook_secret.is_none() {
        tracing::warn!("Mercado Pago webhook secret not set for this environment");
    }

    let port = config.port;
    let app_state = AppState::new(config, baas, payment_provider);
    let app = premiads_server::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
