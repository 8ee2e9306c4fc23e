use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::{order_detail::OrderDetailStatus, role},
    errors::{ApiError, ErrorResponse, ServiceError},
    services::order_details::{NewOrderDetail, OrderDetailChanges},
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderDetailStatusRequest {
    pub status: OrderDetailStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignMechanicRequest {
    pub mechanic_id: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order-details", get(list_details).post(create_detail))
        .route("/order-details/order/:id", get(details_by_order))
        .route("/order-details/mechanic/:id", get(details_by_mechanic))
        .route("/order-details/status/:status", get(details_by_status))
        .route(
            "/order-details/:id",
            get(get_detail).put(update_detail).delete(delete_detail),
        )
        .route("/order-details/:id/status", patch(update_detail_status))
        .route("/order-details/:id/mechanic", patch(assign_mechanic))
        .with_roles(&[role::ADMINISTRATOR, role::MECHANIC])
}

#[utoipa::path(
    get,
    path = "/api/v1/order-details",
    params(PaginationParams),
    responses((status = 200, description = "Order detail page returned")),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn list_details(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (details, total) = state
        .services
        .order_details
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(details, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/order-details/{id}",
    params(("id" = i32, Path, description = "Order detail ID")),
    responses(
        (status = 200, description = "Order detail returned"),
        (status = 404, description = "Order detail not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn get_detail(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .order_details
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order detail", id))?;
    Ok(success_response(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/order-details/order/{id}",
    params(("id" = i32, Path, description = "Service order ID")),
    responses((status = 200, description = "Details of the order")),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn details_by_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.order_details.by_order(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/order-details/mechanic/{id}",
    params(("id" = i32, Path, description = "Mechanic user ID")),
    responses((status = 200, description = "Details assigned to the mechanic")),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn details_by_mechanic(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.order_details.by_mechanic(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/order-details/status/{status}",
    params(("status" = OrderDetailStatus, Path, description = "pendiente, en_proceso or completado")),
    responses((status = 200, description = "Details in the status")),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn details_by_status(
    State(state): State<AppState>,
    PathParam(status): PathParam<OrderDetailStatus>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.order_details.by_status(status).await?,
    ))
}

/// Add a service line to an open order
#[utoipa::path(
    post,
    path = "/api/v1/order-details",
    request_body = NewOrderDetail,
    responses(
        (status = 201, description = "Detail added and order total recomputed"),
        (status = 400, description = "Unknown reference or finalized order", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn create_detail(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewOrderDetail>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(
        state.services.order_details.create(payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/order-details/{id}",
    params(("id" = i32, Path, description = "Order detail ID")),
    request_body = OrderDetailChanges,
    responses(
        (status = 200, description = "Detail updated and order total recomputed"),
        (status = 404, description = "Order detail not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn update_detail(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<OrderDetailChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.order_details.update(id, payload).await?,
    ))
}

/// Move a detail along pendiente, en_proceso, completado
#[utoipa::path(
    patch,
    path = "/api/v1/order-details/{id}/status",
    params(("id" = i32, Path, description = "Order detail ID")),
    request_body = OrderDetailStatusRequest,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn update_detail_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<OrderDetailStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .order_details
            .update_status(id, payload.status)
            .await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/order-details/{id}/mechanic",
    params(("id" = i32, Path, description = "Order detail ID")),
    request_body = AssignMechanicRequest,
    responses(
        (status = 200, description = "Mechanic assigned"),
        (status = 400, description = "User is not a mechanic", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn assign_mechanic(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<AssignMechanicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .order_details
            .assign_mechanic(id, payload.mechanic_id)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/order-details/{id}",
    params(("id" = i32, Path, description = "Order detail ID")),
    responses(
        (status = 200, description = "Detail removed and order total recomputed"),
        (status = 404, description = "Order detail not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "order-details"
)]
pub async fn delete_detail(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.order_details.delete(id).await?;
    Ok(deleted_response(format!("Order detail {} deleted", id)))
}
