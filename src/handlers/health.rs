use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Instant;

use crate::{ApiResponse, AppState};

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Records the process start; call once during startup.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub status: ComponentStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: ComponentStatus,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: DatabaseHealth,
}

/// Unauthenticated health and status routes, mounted at the root.
///
/// - `GET /status`: process is running, never touches the database
/// - `GET /health`: pings the database, 503 when it is unreachable
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

#[utoipa::path(
    get,
    path = "/status",
    responses((status = 200, description = "Service is running")),
    tag = "health"
)]
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "uptime_secs": uptime_secs(),
    })))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let result = crate::db::check_connection(&state.db).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let database = match result {
        Ok(()) => DatabaseHealth {
            status: ComponentStatus::Up,
            latency_ms,
            error: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            DatabaseHealth {
                status: ComponentStatus::Down,
                latency_ms,
                error: Some(err.to_string()),
            }
        }
    };

    let status = database.status;
    let code = match status {
        ComponentStatus::Up => StatusCode::OK,
        ComponentStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: uptime_secs(),
        database,
    };

    (code, Json(report))
}
