use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use super::stock_movements::DateRange;
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::{ApiError, ErrorResponse, ServiceError},
    services::vehicle_history::{NewVehicleHistory, VehicleHistoryChanges},
    AppState,
};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicle-history", get(list_history).post(create_history))
        .route("/vehicle-history/range", get(history_in_range))
        .route("/vehicle-history/vehicle/:id", get(history_by_vehicle))
        .route("/vehicle-history/vehicle/:id/export", get(export_history))
        .route("/vehicle-history/order/:id", get(history_by_order))
        .route("/vehicle-history/mechanic/:id", get(history_by_mechanic))
        .route(
            "/vehicle-history/:id",
            get(get_history).put(update_history).delete(delete_history),
        )
        .with_roles(&[role::ADMINISTRATOR, role::MECHANIC])
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history",
    params(PaginationParams),
    responses((status = 200, description = "History page returned")),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn list_history(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (records, total) = state
        .services
        .vehicle_history
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(records, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history/{id}",
    params(("id" = i32, Path, description = "History record ID")),
    responses(
        (status = 200, description = "History record returned"),
        (status = 404, description = "History record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn get_history(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .services
        .vehicle_history
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Vehicle history", id))?;
    Ok(success_response(record))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history/vehicle/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses((status = 200, description = "History of the vehicle, newest first")),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn history_by_vehicle(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.vehicle_history.by_vehicle(id).await?,
    ))
}

/// Download a vehicle's history as CSV
#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history/vehicle/{id}/export",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn export_history(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.services.vehicle_history.export_csv(id).await?;
    let disposition = format!("attachment; filename=\"vehicle-{}-history.csv\"", id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history/order/{id}",
    params(("id" = i32, Path, description = "Service order ID")),
    responses((status = 200, description = "History records of the order")),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn history_by_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.vehicle_history.by_order(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history/mechanic/{id}",
    params(("id" = i32, Path, description = "Mechanic user ID")),
    responses((status = 200, description = "History records by the mechanic")),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn history_by_mechanic(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.vehicle_history.by_mechanic(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicle-history/range",
    params(DateRange),
    responses(
        (status = 200, description = "Records started inside the range"),
        (status = 400, description = "Range is inverted", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn history_in_range(
    State(state): State<AppState>,
    QueryParams(range): QueryParams<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .vehicle_history
            .by_date_range(range.from, range.to)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicle-history",
    request_body = NewVehicleHistory,
    responses(
        (status = 201, description = "History record created"),
        (status = 400, description = "Invalid input, unknown reference or user is not a mechanic", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn create_history(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewVehicleHistory>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(
        state.services.vehicle_history.create(payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/vehicle-history/{id}",
    params(("id" = i32, Path, description = "History record ID")),
    request_body = VehicleHistoryChanges,
    responses(
        (status = 200, description = "History record updated"),
        (status = 404, description = "History record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn update_history(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<VehicleHistoryChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.vehicle_history.update(id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicle-history/{id}",
    params(("id" = i32, Path, description = "History record ID")),
    responses(
        (status = 200, description = "History record deleted"),
        (status = 404, description = "History record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicle-history"
)]
pub async fn delete_history(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.vehicle_history.delete(id).await?;
    Ok(deleted_response(format!("Vehicle history {} deleted", id)))
}
