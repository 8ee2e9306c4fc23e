use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, OptionalJsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{purchase_order_detail::PurchaseOrderDetailStatus, role},
    errors::{ApiError, ErrorResponse, ServiceError},
    services::{
        purchase_order_details::{NewPurchaseOrderDetail, PurchaseOrderDetailChanges},
        purchase_orders::{NewPurchaseOrder, PurchaseOrderChanges, ReceivePurchaseOrder},
    },
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReceivedQuantityRequest {
    pub received_quantity: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route("/purchase-orders/supplier/:id", get(purchase_orders_by_supplier))
        .route("/purchase-orders/user/:id", get(purchase_orders_by_user))
        .route(
            "/purchase-orders/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route("/purchase-orders/:id/details", get(purchase_order_lines))
        .route("/purchase-orders/:id/receive", post(receive_purchase_order))
        .route("/purchase-order-details", post(create_line))
        .route("/purchase-order-details/order/:id", get(lines_by_order))
        .route("/purchase-order-details/item/:id", get(lines_by_item))
        .route("/purchase-order-details/status/:status", get(lines_by_status))
        .route(
            "/purchase-order-details/:id",
            get(get_line).put(update_line).delete(delete_line),
        )
        .route("/purchase-order-details/:id/received", patch(update_received_quantity))
        .with_roles(&[role::ADMINISTRATOR])
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PaginationParams),
    responses((status = 200, description = "Purchase order page returned")),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (orders, total) = state
        .services
        .purchase_orders
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(orders, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order returned"),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.purchase_orders.require(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/supplier/{id}",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses((status = 200, description = "Purchase orders placed with the supplier")),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn purchase_orders_by_supplier(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.purchase_orders.by_supplier(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/user/{id}",
    params(("id" = i32, Path, description = "Requesting user ID")),
    responses((status = 200, description = "Purchase orders requested by the user")),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn purchase_orders_by_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.purchase_orders.by_requester(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}/details",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Lines of the purchase order"),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn purchase_order_lines(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.purchase_orders.details(id).await?))
}

/// Place a purchase order, optionally with its lines
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = NewPurchaseOrder,
    responses(
        (status = 201, description = "Purchase order created"),
        (status = 400, description = "Invalid input or unknown reference", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<NewPurchaseOrder>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .purchase_orders
        .create(payload, user.user_id)
        .await?;
    Ok(created_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    request_body = PurchaseOrderChanges,
    responses(
        (status = 200, description = "Purchase order updated"),
        (status = 400, description = "Order already received", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<PurchaseOrderChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.purchase_orders.update(id, payload).await?,
    ))
}

/// Receive the order into stock, one entrada movement per received line
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    params(("id" = i32, Path, description = "Purchase order ID")),
    request_body(content = Option<ReceivePurchaseOrder>, description = "Supplier invoice, optional"),
    responses(
        (status = 200, description = "Order received; movements returned"),
        (status = 400, description = "Order already received", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i32>,
    OptionalJsonBody(payload): OptionalJsonBody<ReceivePurchaseOrder>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let receipt = state
        .services
        .purchase_orders
        .receive(id, user.user_id, payload.invoice_number)
        .await?;
    info!(purchase_order_id = id, received_by = user.user_id, "purchase order received");
    Ok(success_response(receipt))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order deleted"),
        (status = 400, description = "Order already received", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.purchase_orders.delete(id).await?;
    Ok(deleted_response(format!("Purchase order {} deleted", id)))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-order-details/{id}",
    params(("id" = i32, Path, description = "Purchase order line ID")),
    responses(
        (status = 200, description = "Line returned"),
        (status = 404, description = "Line not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn get_line(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let line = state
        .services
        .purchase_order_details
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase order detail", id))?;
    Ok(success_response(line))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-order-details/order/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses((status = 200, description = "Lines of the purchase order")),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn lines_by_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.purchase_order_details.by_order(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-order-details/item/{id}",
    params(("id" = i32, Path, description = "Inventory item ID")),
    responses((status = 200, description = "Lines ordering the item")),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn lines_by_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.purchase_order_details.by_item(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-order-details/status/{status}",
    params(("status" = PurchaseOrderDetailStatus, Path, description = "pendiente, parcial or completado")),
    responses((status = 200, description = "Lines in the status")),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn lines_by_status(
    State(state): State<AppState>,
    PathParam(status): PathParam<PurchaseOrderDetailStatus>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.purchase_order_details.by_status(status).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-order-details",
    request_body = NewPurchaseOrderDetail,
    responses(
        (status = 201, description = "Line added and order total recomputed"),
        (status = 400, description = "Unknown reference or order already received", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn create_line(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewPurchaseOrderDetail>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(
        state.services.purchase_order_details.create(payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-order-details/{id}",
    params(("id" = i32, Path, description = "Purchase order line ID")),
    request_body = PurchaseOrderDetailChanges,
    responses(
        (status = 200, description = "Line updated and order total recomputed"),
        (status = 404, description = "Line not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn update_line(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<PurchaseOrderDetailChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state
            .services
            .purchase_order_details
            .update(id, payload)
            .await?,
    ))
}

/// Record the quantity received for a line
#[utoipa::path(
    patch,
    path = "/api/v1/purchase-order-details/{id}/received",
    params(("id" = i32, Path, description = "Purchase order line ID")),
    request_body = ReceivedQuantityRequest,
    responses(
        (status = 200, description = "Received quantity and status updated"),
        (status = 400, description = "Negative quantity", body = ErrorResponse),
        (status = 404, description = "Line not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn update_received_quantity(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<ReceivedQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .purchase_order_details
            .update_received_quantity(id, payload.received_quantity)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-order-details/{id}",
    params(("id" = i32, Path, description = "Purchase order line ID")),
    responses(
        (status = 200, description = "Line removed and order total recomputed"),
        (status = 404, description = "Line not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-order-details"
)]
pub async fn delete_line(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.purchase_order_details.delete(id).await?;
    Ok(deleted_response(format!("Purchase order detail {} deleted", id)))
}
