mod auth;
mod cors;
mod error;
pub mod logger;

use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, routing::get};
use axum_server::tls_rustls::RustlsConfig;
use config::{AccessConfig, Config};
use directory::{CognitoDirectory, DirectoryClient};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::Error;

pub(crate) type Result<T> = std::result::Result<T, error::Error>;

/// Liveness probe, reachable without the admin group.
pub const HEALTH_PATH: &str = "/health";

pub struct ServeConfig {
    pub listen_address: SocketAddr,
    pub config: Config,
    /// Cancelling the token shuts the server down gracefully.
    pub shutdown_signal: CancellationToken,
    /// Filter for the logger, e.g. "info" or "server=debug,groups=debug".
    pub log_filter: String,
}

pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        shutdown_signal,
        log_filter,
    }: ServeConfig,
) -> crate::Result<()> {
    logger::init(&log_filter);

    config.validate().map_err(|e| Error::Config(format!("{e:#}")))?;

    let (level, notice) = access_notice(&config.access);
    log::log!(level, "{notice}");

    let directory = Arc::new(CognitoDirectory::new(&config.directory).await);
    let app = router(&config, directory)?;

    let listener = TcpListener::bind(listen_address).await.map_err(Error::Bind)?;

    match &config.server.tls {
        Some(tls_config) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls_config.certificate, &tls_config.key)
                .await
                .map_err(|e| Error::Tls(e.to_string()))?;

            log::info!("Administrative endpoints available at: https://{listen_address}");

            // axum-server takes a std listener
            let std_listener = listener.into_std().map_err(Error::Bind)?;

            let handle = axum_server::Handle::new();

            tokio::spawn({
                let handle = handle.clone();

                async move {
                    shutdown_signal.cancelled().await;
                    handle.graceful_shutdown(None);
                }
            });

            axum_server::from_tcp_rustls(std_listener, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(Error::Server)?;
        }
        None => {
            log::info!("Administrative endpoints available at: http://{listen_address}");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal.cancelled_owned())
                .await
                .map_err(Error::Server)?;
        }
    }

    log::info!("Server stopped");

    Ok(())
}

/// The group endpoints behind the admin gate, plus the health probe.
pub fn router(config: &Config, directory: Arc<dyn DirectoryClient>) -> crate::Result<Router> {
    let app = groups::router(directory)
        .route(HEALTH_PATH, get(health))
        .layer(auth::AuthLayer::new(&config.access, &[HEALTH_PATH]))
        .layer(cors::layer(&config.server.cors)?);

    Ok(app)
}

/// Startup notice for the admin gate, on the final configuration.
fn access_notice(access: &AccessConfig) -> (log::Level, String) {
    match access.enforced_group() {
        Some(group) => (
            log::Level::Info,
            format!("Administrative endpoints require membership in {group}"),
        ),
        None => (
            log::Level::Warn,
            "No admin group configured, group enforcement is disabled for all endpoints".to_string(),
        ),
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
