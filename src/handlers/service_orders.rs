use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{role, service_order::ServiceOrderStatus},
    errors::{ApiError, ErrorResponse},
    services::service_orders::{NewServiceOrder, ServiceOrderChanges},
    AppState,
};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ServiceOrderStatusRequest {
    pub status: ServiceOrderStatus,
}

pub fn routes() -> Router<AppState> {
    let work = Router::new()
        .route("/service-orders", get(list_orders).post(create_order))
        .route("/service-orders/customer/:id", get(orders_by_customer))
        .route("/service-orders/vehicle/:id", get(orders_by_vehicle))
        .route("/service-orders/status/:status", get(orders_by_status))
        .route("/service-orders/:id", get(get_order).put(update_order))
        .route("/service-orders/:id/details", get(order_details))
        .route("/service-orders/:id/receipt", get(order_receipt))
        .route("/service-orders/:id/status", patch(update_order_status))
        .route("/service-orders/:id/finalize", post(finalize_order))
        .with_roles(&[role::ADMINISTRATOR, role::MECHANIC]);

    let admin = Router::new()
        .route(
            "/service-orders/:id",
            axum::routing::delete(delete_order),
        )
        .with_roles(&[role::ADMINISTRATOR]);

    work.merge(admin)
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders",
    params(PaginationParams),
    responses((status = 200, description = "Service order page returned")),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (orders, total) = state
        .services
        .service_orders
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(orders, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/{id}",
    params(("id" = i32, Path, description = "Service order ID")),
    responses(
        (status = 200, description = "Service order returned"),
        (status = 404, description = "Service order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.service_orders.require(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/customer/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    responses((status = 200, description = "Orders of the customer")),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn orders_by_customer(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.service_orders.by_customer(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/vehicle/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses((status = 200, description = "Orders of the vehicle")),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn orders_by_vehicle(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.service_orders.by_vehicle(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/status/{status}",
    params(("status" = ServiceOrderStatus, Path, description = "abierta, en progreso or finalizada")),
    responses((status = 200, description = "Orders in the status")),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn orders_by_status(
    State(state): State<AppState>,
    PathParam(status): PathParam<ServiceOrderStatus>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.service_orders.by_status(status).await?,
    ))
}

/// Service lines of an order
#[utoipa::path(
    get,
    path = "/api/v1/service-orders/{id}/details",
    params(("id" = i32, Path, description = "Service order ID")),
    responses(
        (status = 200, description = "Order details"),
        (status = 404, description = "Service order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn order_details(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.service_orders.details(id).await?))
}

/// Download an order receipt as CSV
#[utoipa::path(
    get,
    path = "/api/v1/service-orders/{id}/receipt",
    params(("id" = i32, Path, description = "Service order ID")),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 404, description = "Service order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn order_receipt(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.services.service_orders.receipt_csv(id).await?;
    let disposition = format!("attachment; filename=\"service-order-{}-receipt.csv\"", id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Open a service order, optionally from an appointment
#[utoipa::path(
    post,
    path = "/api/v1/service-orders",
    request_body = NewServiceOrder,
    responses(
        (status = 201, description = "Service order opened"),
        (status = 400, description = "Invalid input or unknown reference", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<NewServiceOrder>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .service_orders
        .create(payload, user.user_id)
        .await?;
    Ok(created_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-orders/{id}",
    params(("id" = i32, Path, description = "Service order ID")),
    request_body = ServiceOrderChanges,
    responses(
        (status = 200, description = "Service order updated"),
        (status = 400, description = "Order already finalized", body = ErrorResponse),
        (status = 404, description = "Service order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<ServiceOrderChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.service_orders.update(id, payload).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/service-orders/{id}/status",
    params(("id" = i32, Path, description = "Service order ID")),
    request_body = ServiceOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<ServiceOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .service_orders
            .update_status(id, payload.status)
            .await?,
    ))
}

/// Finalize an order whose details are all completed
#[utoipa::path(
    post,
    path = "/api/v1/service-orders/{id}/finalize",
    params(("id" = i32, Path, description = "Service order ID")),
    responses(
        (status = 200, description = "Order finalized and customer notified"),
        (status = 400, description = "Details incomplete or order already finalized", body = ErrorResponse),
        (status = 404, description = "Service order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn finalize_order(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .service_orders
            .finalize(id, user.user_id)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-orders/{id}",
    params(("id" = i32, Path, description = "Service order ID")),
    responses(
        (status = 200, description = "Service order deleted"),
        (status = 400, description = "Finalized orders are kept", body = ErrorResponse),
        (status = 404, description = "Service order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "service-orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.service_orders.delete(id).await?;
    Ok(deleted_response(format!("Service order {} deleted", id)))
}
