use super::common::{
    created_response, paginated_response, success_response, validate_input, JsonBody, PathParam,
    PaginationParams, QueryParams,
};
use super::inventory::StockChangeRequest;
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{role, stock_movement::MovementType},
    errors::{ApiError, ErrorResponse, ServiceError},
    services::stock_movements::MovementNoteChanges,
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Body of `POST /inventory-movements`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewMovementRequest {
    pub item_id: i32,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
    pub movement_type: MovementType,
    #[validate(length(min = 1, max = 255))]
    pub motive: String,
    pub order_id: Option<i32>,
    pub supplier_id: Option<i32>,
    #[validate(length(max = 64))]
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    /// Inclusive lower bound (RFC 3339)
    pub from: DateTime<Utc>,
    /// Inclusive upper bound (RFC 3339)
    pub to: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inventory-movements",
            get(list_movements).post(create_movement),
        )
        .route("/inventory-movements/range", get(movements_in_range))
        .route("/inventory-movements/item/:id", get(movements_by_item))
        .route("/inventory-movements/type/:movement_type", get(movements_by_type))
        .route("/inventory-movements/order/:id", get(movements_by_order))
        .route("/inventory-movements/supplier/:id", get(movements_by_supplier))
        .route("/inventory-movements/user/:id", get(movements_by_user))
        .route(
            "/inventory-movements/:id",
            get(get_movement).patch(update_movement_notes),
        )
        .with_roles(&[role::ADMINISTRATOR, role::MECHANIC])
}

/// List ledger movements, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements",
    params(PaginationParams),
    responses((status = 200, description = "Movement page returned")),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (movements, total) = state
        .services
        .stock_movements
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(movements, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/{id}",
    params(("id" = i32, Path, description = "Movement ID")),
    responses(
        (status = 200, description = "Movement returned"),
        (status = 404, description = "Movement not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn get_movement(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let movement = state
        .services
        .stock_movements
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Stock movement", id))?;
    Ok(success_response(movement))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/item/{id}",
    params(("id" = i32, Path, description = "Inventory item ID")),
    responses((status = 200, description = "Movements of the item")),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn movements_by_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.stock_movements.by_item(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/type/{movement_type}",
    params(("movement_type" = MovementType, Path, description = "entrada or salida")),
    responses((status = 200, description = "Movements of the given type")),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn movements_by_type(
    State(state): State<AppState>,
    PathParam(movement_type): PathParam<MovementType>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.stock_movements.by_type(movement_type).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/order/{id}",
    params(("id" = i32, Path, description = "Service order ID")),
    responses((status = 200, description = "Movements charged to the order")),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn movements_by_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.stock_movements.by_order(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/supplier/{id}",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses((status = 200, description = "Movements from the supplier")),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn movements_by_supplier(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.stock_movements.by_supplier(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/user/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses((status = 200, description = "Movements recorded by the user")),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn movements_by_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.stock_movements.by_user(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory-movements/range",
    params(DateRange),
    responses(
        (status = 200, description = "Movements created inside the range"),
        (status = 400, description = "Range is inverted", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn movements_in_range(
    State(state): State<AppState>,
    QueryParams(range): QueryParams<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state
            .services
            .stock_movements
            .by_date_range(range.from, range.to)
            .await?,
    ))
}

/// Record a movement through the stock ledger
#[utoipa::path(
    post,
    path = "/api/v1/inventory-movements",
    request_body = NewMovementRequest,
    responses(
        (status = 201, description = "Movement recorded and stock updated"),
        (status = 400, description = "Invalid input, unknown reference or insufficient stock", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn create_movement(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<NewMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item_id = payload.item_id;
    let change = StockChangeRequest {
        quantity: payload.quantity,
        movement_type: payload.movement_type,
        motive: payload.motive,
        order_id: payload.order_id,
        supplier_id: payload.supplier_id,
        invoice_number: payload.invoice_number,
        notes: payload.notes,
    };
    let outcome = state
        .services
        .inventory
        .adjust_stock(change.into_adjustment(item_id, user.user_id))
        .await?;
    Ok(created_response(outcome))
}

/// Edit the invoice number or notes of a movement
#[utoipa::path(
    patch,
    path = "/api/v1/inventory-movements/{id}",
    params(("id" = i32, Path, description = "Movement ID")),
    request_body = MovementNoteChanges,
    responses(
        (status = 200, description = "Movement updated"),
        (status = 404, description = "Movement not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory-movements"
)]
pub async fn update_movement_notes(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<MovementNoteChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let movement = state
        .services
        .stock_movements
        .update_notes(id, payload)
        .await?;
    Ok(success_response(movement))
}
