use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::{ApiError, ErrorResponse, ServiceError},
    services::vehicles::VehicleInput,
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};

pub fn routes() -> Router<AppState> {
    let authenticated = Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/plate/:plate", get(vehicle_by_plate))
        .route("/vehicles/owner/:id", get(vehicles_by_owner))
        .route("/vehicles/:id", get(get_vehicle).put(update_vehicle))
        .with_auth();

    let admin = Router::new()
        .route("/vehicles/:id", delete(delete_vehicle))
        .with_roles(&[role::ADMINISTRATOR]);

    authenticated.merge(admin)
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    params(PaginationParams),
    responses((status = 200, description = "Vehicle page returned")),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (vehicles, total) = state
        .services
        .vehicles
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(vehicles, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle returned"),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state
        .services
        .vehicles
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Vehicle", id))?;
    Ok(success_response(vehicle))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/plate/{plate}",
    params(("plate" = String, Path, description = "License plate, case-insensitive")),
    responses(
        (status = 200, description = "Vehicle returned"),
        (status = 404, description = "No vehicle with the plate", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn vehicle_by_plate(
    State(state): State<AppState>,
    PathParam(plate): PathParam<String>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state
        .services
        .vehicles
        .by_plate(&plate)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Vehicle with plate {} not found", plate)))?;
    Ok(success_response(vehicle))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/owner/{id}",
    params(("id" = i32, Path, description = "Owner user ID")),
    responses((status = 200, description = "Vehicles of the owner")),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn vehicles_by_owner(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.vehicles.by_owner(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    request_body = VehicleInput,
    responses(
        (status = 201, description = "Vehicle registered"),
        (status = 400, description = "Invalid input, unknown owner or plate in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VehicleInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(state.services.vehicles.create(payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/vehicles/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    request_body = VehicleInput,
    responses(
        (status = 200, description = "Vehicle updated"),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<VehicleInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.vehicles.update(id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle deleted"),
        (status = 400, description = "Vehicle has appointments or orders", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.vehicles.delete(id).await?;
    Ok(deleted_response(format!("Vehicle {} deleted", id)))
}
