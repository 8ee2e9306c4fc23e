//! Taller API
//!
//! Backend for a vehicle repair workshop: inventory and its stock ledger, service
//! orders, appointments, suppliers and purchase orders.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;
pub mod tracing;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, Extension, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires every service over one pool and one event channel.
    pub fn new(db: Arc<DbPool>, config: AppConfig, event_sender: Arc<EventSender>) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from(&config),
            db.clone(),
        ));
        Self {
            db,
            config,
            event_sender,
            services,
            auth,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// A successful response carrying only a message, e.g. after a delete.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn message_response_has_no_data() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-del"), async {
                ApiResponse::<()>::message("Item 3 deleted")
            })
            .await;

        assert!(response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("Item 3 deleted"));
        assert_eq!(
            response.meta.and_then(|m| m.request_id).as_deref(),
            Some("meta-del")
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);

        let empty = PaginatedResponse::<i32>::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}

/// Every resource route, relative to `/api/v1`.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::auth_routes().with_state(auth))
        .merge(handlers::inventory::routes())
        .merge(handlers::stock_movements::routes())
        .merge(handlers::suppliers::routes())
        .merge(handlers::tools::routes())
        .merge(handlers::purchase_orders::routes())
        .merge(handlers::service_orders::routes())
        .merge(handlers::order_details::routes())
        .merge(handlers::appointments::routes())
        .merge(handlers::vehicle_history::routes())
        .merge(handlers::catalog::routes())
        .merge(handlers::vehicles::routes())
        .merge(handlers::users::routes())
        .merge(handlers::statistics::routes())
}

/// Builds the CORS layer from configuration. Fails when no origins are set
/// and permissive CORS is not allowed.
pub fn cors_layer(cfg: &AppConfig) -> anyhow::Result<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials));
    }

    if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            development = cfg.is_development(),
            "using permissive CORS because no origins are configured"
        );
        return Ok(CorsLayer::permissive());
    }

    anyhow::bail!(
        "missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
    )
}

/// The full application: health routes, `/api/v1`, Swagger UI and the middleware stack.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config)?;
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));

    let app = Router::new()
        .merge(handlers::health::routes())
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::http_trace_layer())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TimeoutLayer::new(timeout))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        // auth_middleware looks the service up in the request extensions
        .layer(Extension(state.auth.clone()))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state);

    Ok(app)
}

async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    metrics::histogram!("http_request_duration_ms", elapsed_ms as f64);
    if status.is_server_error() {
        ::tracing::error!(method = %method, uri = %uri, status = status.as_u16(), elapsed_ms, "request failed");
    } else {
        ::tracing::info!(method = %method, uri = %uri, status = status.as_u16(), elapsed_ms, "request completed");
    }

    response
}
