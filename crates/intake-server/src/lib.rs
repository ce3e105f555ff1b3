pub mod logging;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use intake_core::agent::ModelBackend;
use intake_domains::intake::IntakeRouter;
use intake_domains::Analyzer;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use logging::LogRing;

pub const DEFAULT_LOG_FILTER: &str = "intake_server=info,intake_core=info,intake_domains=info,intake_agent=info,tower_http=debug";

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub analyzer: Analyzer,
    pub router: IntakeRouter,
    /// `None` when analyses run on rules alone.
    pub backend_name: Option<String>,
    pub firm_name: String,
    pub start_time: Instant,
    pub log_tx: broadcast::Sender<String>,
    pub log_ring: LogRing,
}

impl AppState {
    pub fn new(
        backend: Option<Arc<dyn ModelBackend>>,
        firm_name: impl Into<String>,
        log_tx: broadcast::Sender<String>,
        log_ring: LogRing,
    ) -> Self {
        Self {
            backend_name: backend.as_ref().map(|b| b.name().to_string()),
            analyzer: Analyzer::new(backend.clone()),
            router: IntakeRouter::new(backend),
            firm_name: firm_name.into(),
            start_time: Instant::now(),
            log_tx,
            log_ring,
        }
    }

    /// Rule-based state with a private log channel.
    pub fn offline(firm_name: impl Into<String>) -> Self {
        let (log_tx, _) = broadcast::channel(256);
        Self::new(None, firm_name, log_tx, logging::new_ring())
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/intake", post(routes::route_intake))
        .route("/api/analyze/:domain", post(routes::analyze_case))
        .route("/api/routing/:practice_area", get(routes::get_routing))
        .route("/api/practice-areas", get(routes::list_practice_areas))
        .route("/api/logs", get(routes::recent_logs))
        .route("/api/logs/stream", get(routes::sse_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
