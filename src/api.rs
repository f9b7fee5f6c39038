use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::collector::{Mode, SnapshotStore};
use crate::telemetry::Telemetry;

mod models;

pub use models::SdTarget;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

#[derive(Debug, Clone)]
pub struct AppState {
    snapshots: Arc<SnapshotStore>,
    telemetry: Telemetry,
}

impl AppState {
    pub fn new(snapshots: Arc<SnapshotStore>, telemetry: Telemetry) -> Self {
        Self {
            snapshots,
            telemetry,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn aggregated_metrics(State(state): State<AppState>) -> Response {
    let body = state.snapshots.load().render_metrics();
    ([(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response()
}

async fn service_discovery(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshots.load();
    match serde_json::to_vec(snapshot.targets()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => {
            log::error!("Failed to encode service discovery targets: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode targets").into_response()
        }
    }
}

async fn internal_metrics(State(state): State<AppState>) -> Response {
    match state.telemetry.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            log::error!("Failed to render internal metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(state: AppState, mode: Mode) -> Self {
        let router = axum::Router::new().route("/health", get(health));
        let router = match mode {
            Mode::Aggregate => router
                .route("/metrics", get(aggregated_metrics))
                .route("/internal/metrics", get(internal_metrics)),
            Mode::ServiceDiscovery => router.route("/sd", get(service_discovery)),
        };
        Self {
            router: router.with_state(state),
        }
    }

    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    /// Serves the API until the process receives SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listener or serving fails.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for SIGINT: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutting down");
}
