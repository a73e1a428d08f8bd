//! HTTP shim between the external inference transport and the engine.
//!
//! This module provides an HTTP server that:
//! - Accepts per-frame classification results via POST /events
//! - Exposes the stabilized decision and the latest session report
//! - Gives the host UI session control (start/stop) over HTTP
//!
//! # Architecture
//!
//! ```text
//! Inference backend ──→ POST /events ──→ decision agent ──→ GET /decision
//!                                            │                GET /report
//!                                    [decider + session]
//! ```
//!
//! The server carries no decision logic of its own; every request is a thin
//! adapter onto [`LivenessEngine`].

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::classify::ClassificationEvent;
use crate::config::Config;
use crate::core::decider::Decision;
use crate::core::scheduler::ThreadScheduler;
use crate::core::session::{CollectionReport, SessionState};
use crate::engine::LivenessEngine;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Engine configuration
    pub engine_config: Config,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, engine_config: Config) -> Self {
        Self {
            port,
            engine_config,
        }
    }
}

/// Shared server state
pub struct ServerState {
    engine: Arc<LivenessEngine>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response to an ingested event
#[derive(Serialize)]
pub struct EventResponse {
    pub decision: Decision,
    pub session_state: SessionState,
}

/// Current decision with window fill for display
#[derive(Serialize)]
pub struct DecisionResponse {
    pub decision: Decision,
    pub window_fill: usize,
}

/// Session control request
#[derive(Deserialize)]
pub struct StartRequest {
    /// Session length; falls back to the configured default when omitted
    pub duration_secs: Option<u64>,
}

/// Session status after a control call
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CollectionReport>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /events
///
/// Accepts one classification result in the producer wire shape
/// (`{"className": ..., "confidence": ...}`) and returns the decision
/// after applying it.
async fn ingest_event(
    State(state): State<Arc<ServerState>>,
    Json(event): Json<ClassificationEvent>,
) -> Json<EventResponse> {
    tracing::debug!(label = %event.label, confidence = event.confidence, "event received");
    state.engine.on_event(event);

    Json(EventResponse {
        decision: state.engine.decision(),
        session_state: state.engine.session_state(),
    })
}

/// GET /decision
async fn decision(State(state): State<Arc<ServerState>>) -> Json<DecisionResponse> {
    Json(DecisionResponse {
        decision: state.engine.decision(),
        window_fill: state.engine.window_fill(),
    })
}

/// GET /report
async fn report(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<CollectionReport>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.report() {
        Some(report) => Ok(Json(report)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No completed session yet".to_string(),
                code: "NO_REPORT".to_string(),
            }),
        )),
    }
}

/// POST /session/start
async fn session_start(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<StartRequest>,
) -> Json<SessionResponse> {
    match request.duration_secs {
        Some(secs) => state.engine.start_session(secs),
        None => state.engine.start_default_session(),
    }
    tracing::info!("collection session started");

    Json(SessionResponse {
        session_state: state.engine.session_state(),
        remaining_secs: state.engine.remaining_secs(),
        report: None,
    })
}

/// POST /session/stop
async fn session_stop(State(state): State<Arc<ServerState>>) -> Json<SessionResponse> {
    state.engine.stop_session();
    tracing::info!("collection session stopped");

    Json(SessionResponse {
        session_state: state.engine.session_state(),
        remaining_secs: None,
        report: state.engine.report(),
    })
}

/// POST /decider/reset
async fn decider_reset(State(state): State<Arc<ServerState>>) -> Json<DecisionResponse> {
    state.engine.reset_decider();

    Json(DecisionResponse {
        decision: state.engine.decision(),
        window_fill: state.engine.window_fill(),
    })
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let engine = Arc::new(LivenessEngine::new(
        &config.engine_config,
        Arc::new(ThreadScheduler::new()),
    )?);
    let state = Arc::new(ServerState { engine });

    let app = Router::new()
        .route("/health", get(health))
        .route("/events", post(ingest_event))
        .route("/decision", get(decision))
        .route("/report", get(report))
        .route("/session/start", post(session_start))
        .route("/session/stop", post(session_stop))
        .route("/decider/reset", post(decider_reset))
        .layer(
            // The host UI is a local browser page; origins are not pinned
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Decision agent server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
