use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use intake_core::routing::{lookup_routing_tag, routing_table, RoutingInfo};
use intake_core::CaseFields;
use intake_domains::intake::IntakeRequest;
use intake_domains::DomainTag;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::AppState;

pub(crate) fn internal(e: impl std::fmt::Display) -> StatusCode {
    tracing::error!("internal error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

// ── Request body types ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntakeBody {
    #[serde(flatten)]
    request: IntakeRequest,
    /// Case facts for the follow-up domain analysis.
    #[serde(default)]
    facts: Option<Value>,
    #[serde(default)]
    deep_analysis: bool,
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "firm": state.firm_name,
        "backend": state.backend_name.as_deref().unwrap_or("rules"),
        "uptimeS": state.start_time.elapsed().as_secs(),
    }))
}

pub(crate) async fn route_intake(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IntakeBody>,
) -> Result<Json<Value>, StatusCode> {
    if body.request.message.trim().is_empty() {
        warn!("intake rejected: empty message");
        return Err(StatusCode::BAD_REQUEST);
    }

    let result = state.router.route(&body.request).await;
    let mut value = serde_json::to_value(&result).map_err(internal)?;

    if body.deep_analysis {
        if let Some(domain) = DomainTag::for_practice_area(result.practice_area) {
            let fields = body.facts.map(CaseFields::from_value).unwrap_or_default();
            let analysis = state.analyzer.analyze_case(domain, &fields).await;
            if let Some(obj) = value.as_object_mut() {
                obj.insert(
                    "caseAnalysis".into(),
                    serde_json::to_value(&analysis).map_err(internal)?,
                );
            }
        }
    }

    Ok(Json(value))
}

pub(crate) async fn analyze_case(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let domain: DomainTag = domain.parse().map_err(|e| {
        info!("{e}");
        StatusCode::NOT_FOUND
    })?;
    let fields = CaseFields::from_value(body);
    let analysis = state.analyzer.analyze_case(domain, &fields).await;
    Ok(Json(serde_json::to_value(&analysis).map_err(internal)?))
}

/// Unknown tags get the general-counsel entry.
pub(crate) async fn get_routing(Path(practice_area): Path<String>) -> Json<&'static RoutingInfo> {
    Json(lookup_routing_tag(&practice_area))
}

pub(crate) async fn list_practice_areas() -> Json<&'static [RoutingInfo]> {
    Json(routing_table())
}

/// `?category=analysis&level=warn` narrows the log views.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogQuery {
    category: Option<String>,
    level: Option<String>,
}

impl LogQuery {
    fn accepts(&self, line: &Value) -> bool {
        let field_is = |key: &str, want: Option<&str>| {
            want.map_or(true, |w| line[key].as_str().is_some_and(|v| v.eq_ignore_ascii_case(w)))
        };
        field_is("category", self.category.as_deref()) && field_is("level", self.level.as_deref())
    }

    fn accepts_raw(&self, line: &str) -> bool {
        if self.category.is_none() && self.level.is_none() {
            return true;
        }
        serde_json::from_str::<Value>(line).is_ok_and(|v| self.accepts(&v))
    }
}

fn ring_snapshot(state: &AppState) -> Vec<String> {
    state
        .log_ring
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .cloned()
        .collect()
}

pub(crate) async fn recent_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<Value>> {
    let lines = ring_snapshot(&state)
        .iter()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|line| query.accepts(line))
        .collect();
    Json(lines)
}

/// Ring history first, then live lines. A lagging client skips what it missed.
pub(crate) async fn sse_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the snapshot so no line falls between the two.
    let live = BroadcastStream::new(state.log_tx.subscribe()).filter_map(|line| line.ok());
    let history = tokio_stream::iter(ring_snapshot(&state));
    let stream = history
        .chain(live)
        .filter(move |line| query.accepts_raw(line))
        .map(|line| Ok(Event::default().data(line)));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
