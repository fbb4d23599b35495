//! Local HTTP surface for a device bridge.
//!
//! This module provides an HTTP server that:
//! - Accepts cardiac and thermal readings via POST
//! - Serves the current assessment and the exportable engine state
//!
//! # Architecture
//!
//! ```text
//! Device bridge ──→ POST /samples/{cardiac,thermal} ──→ Engine
//!                                                        ↓
//! Dashboard     ←── GET /analysis, GET /state  ←─────────┘
//! ```

use crate::core::{AssessmentResult, Engine, EngineState, Ingest, SharedEngine};
use crate::source::{CardiacReading, ThermalReading};
use crate::transparency::{IngestStats, SharedIngestLog};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Where to persist engine state on reset and shutdown
    pub state_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(port: u16, state_path: Option<PathBuf>) -> Self {
        Self { port, state_path }
    }
}

/// Shared server state
pub struct ServerState {
    engine: SharedEngine,
    log: SharedIngestLog,
    state_path: Option<PathBuf>,
}

impl ServerState {
    pub fn new(engine: SharedEngine, log: SharedIngestLog, state_path: Option<PathBuf>) -> Self {
        Self {
            engine,
            log,
            state_path,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Engine>, ApiError> {
        self.engine.lock().map_err(|_| {
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Engine lock poisoned".to_string(),
                "ENGINE_UNAVAILABLE",
            )
        })
    }

    fn persist(&self) {
        let Some(path) = &self.state_path else {
            return;
        };
        let state = match self.engine.lock() {
            Ok(engine) => engine.export_state(),
            Err(_) => return,
        };
        if let Err(e) = state.save(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save engine state");
        }
    }
}

/// Response to a pushed reading
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub cardiac_samples: usize,
    pub thermal_samples: usize,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub instance_id: String,
    pub ingest: IngestStats,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: String, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        }),
    )
}

fn ingest_response(outcome: Ingest, engine: &Engine) -> Result<Json<IngestResponse>, ApiError> {
    let status = match outcome {
        Ingest::Accepted => "accepted",
        Ingest::Throttled => "throttled",
        Ingest::Rejected(rejection) => {
            return Err(error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid reading: {rejection}"),
                "INVALID_READING",
            ))
        }
    };

    Ok(Json(IngestResponse {
        status: status.to_string(),
        cardiac_samples: engine.cardiac_window().len(),
        thermal_samples: engine.thermal_window().len(),
    }))
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Result<Json<HealthResponse>, ApiError> {
    let instance_id = state.lock()?.instance_id().to_string();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id,
        ingest: state.log.stats(),
    }))
}

/// POST /samples/cardiac
async fn cardiac_sample(
    State(state): State<Arc<ServerState>>,
    Json(reading): Json<CardiacReading>,
) -> Result<Json<IngestResponse>, ApiError> {
    let mut engine = state.lock()?;
    let outcome = engine.add_cardiac_sample(reading);
    state.log.record_cardiac(&outcome);
    ingest_response(outcome, &engine)
}

/// POST /samples/thermal
async fn thermal_sample(
    State(state): State<Arc<ServerState>>,
    Json(reading): Json<ThermalReading>,
) -> Result<Json<IngestResponse>, ApiError> {
    let mut engine = state.lock()?;
    let outcome = engine.add_thermal_sample(reading);
    state.log.record_thermal(&outcome);
    ingest_response(outcome, &engine)
}

/// GET /analysis
async fn analysis(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let mut engine = state.lock()?;
    let fresh = engine.last_analysis().is_none();
    let result = engine.full_analysis();
    if fresh {
        state.log.record_analysis();
    }
    Ok(Json(result))
}

/// GET /state
async fn export_state(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<EngineState>, ApiError> {
    Ok(Json(state.lock()?.export_state()))
}

/// POST /reset
async fn reset(State(state): State<Arc<ServerState>>) -> Result<StatusCode, ApiError> {
    state.lock()?.reset();
    state.log.reset();
    state.persist();
    Ok(StatusCode::NO_CONTENT)
}

/// Build the router over shared state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/samples/cardiac", post(cardiac_sample))
        .route("/samples/thermal", post(thermal_sample))
        .route("/analysis", get(analysis))
        .route("/state", get(export_state))
        .route("/reset", post(reset))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
///
/// Returns the bound address, the shutdown trigger and the server task. The
/// engine state is saved to `config.state_path` once the task has drained its
/// connections, so callers should await the task before exiting.
pub async fn run(
    config: ServerConfig,
    engine: SharedEngine,
    log: SharedIngestLog,
) -> anyhow::Result<(SocketAddr, oneshot::Sender<()>, JoinHandle<()>)> {
    let state = Arc::new(ServerState::new(engine, log, config.state_path.clone()));
    let app = router(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("mindpulse server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
        state.persist();
    });

    Ok((actual_addr, shutdown_tx, task))
}
