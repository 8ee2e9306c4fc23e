use super::common::success_response;
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::ApiError,
    services::statistics::{StatisticsSummary, POPULAR_SERVICES_LIMIT, RECENT_SERVICES_LIMIT},
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde_json::json;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/statistics/summary", get(summary))
        .route("/statistics/customers", get(total_customers))
        .route("/statistics/completed-services", get(completed_services))
        .route("/statistics/popular-services", get(popular_services))
        .route("/statistics/recent-services", get(recent_services))
        .with_roles(&[role::ADMINISTRATOR])
}

/// Dashboard summary for the current month
#[utoipa::path(
    get,
    path = "/api/v1/statistics/summary",
    responses((status = 200, description = "Workshop figures", body = StatisticsSummary)),
    security(("bearer_auth" = [])),
    tag = "statistics"
)]
pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.statistics.summary().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/customers",
    responses((status = 200, description = "Number of customers")),
    security(("bearer_auth" = [])),
    tag = "statistics"
)]
pub async fn total_customers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let total = state.services.statistics.total_customers().await?;
    Ok(success_response(json!({ "total_customers": total })))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/completed-services",
    responses((status = 200, description = "Orders finalized this month")),
    security(("bearer_auth" = [])),
    tag = "statistics"
)]
pub async fn completed_services(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let total = state
        .services
        .statistics
        .completed_services_this_month()
        .await?;
    Ok(success_response(json!({ "completed_services_this_month": total })))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/popular-services",
    responses((status = 200, description = "Most requested catalog services this month")),
    security(("bearer_auth" = [])),
    tag = "statistics"
)]
pub async fn popular_services(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .statistics
            .popular_services(POPULAR_SERVICES_LIMIT)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/recent-services",
    responses((status = 200, description = "Most recently opened service orders")),
    security(("bearer_auth" = [])),
    tag = "statistics"
)]
pub async fn recent_services(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .statistics
            .recent_services(RECENT_SERVICES_LIMIT)
            .await?,
    ))
}
