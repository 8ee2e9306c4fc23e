use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams, SearchParams,
};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{role, stock_movement::MovementType},
    errors::{ApiError, ErrorResponse, ServiceError},
    services::inventory::{InventoryItemChanges, NewInventoryItem, StockAdjustment},
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
use validator::Validate;

/// Body of `PATCH /inventory/:id/stock`. The acting user comes from the token.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StockChangeRequest {
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

impl StockChangeRequest {
    pub(crate) fn into_adjustment(self, item_id: i32, user_id: i32) -> StockAdjustment {
        StockAdjustment {
            item_id,
            quantity: self.quantity,
            movement_type: self.movement_type,
            user_id,
            motive: self.motive,
            order_id: self.order_id,
            supplier_id: self.supplier_id,
            invoice_number: self.invoice_number,
            notes: self.notes,
        }
    }
}

pub fn routes() -> Router<AppState> {
    let read = Router::new()
        .route("/inventory", get(list_items))
        .route("/inventory/low-stock", get(low_stock_items))
        .route("/inventory/search", get(search_items))
        .route("/inventory/code/:code", get(get_item_by_code))
        .route("/inventory/category/:category", get(items_by_category))
        .route("/inventory/:id", get(get_item))
        .route("/inventory/:id/movements", get(item_movements))
        .route("/inventory/:id/stock", patch(adjust_item_stock))
        .with_roles(&[role::ADMINISTRATOR, role::MECHANIC]);

    let manage = Router::new()
        .route("/inventory", post(create_item))
        .route("/inventory/:id", axum::routing::put(update_item).delete(delete_item))
        .with_roles(&[role::ADMINISTRATOR]);

    read.merge(manage)
}

/// List inventory items ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams),
    responses(
        (status = 200, description = "Inventory page returned"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (items, total) = state
        .services
        .inventory
        .list_items(pagination.page(), limit)
        .await?;
    Ok(paginated_response(items, total, &pagination, limit))
}

/// Get an inventory item by ID
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = i32, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Inventory item returned"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.services.inventory.require_item(id).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/code/{code}",
    params(("code" = String, Path, description = "Unique item code")),
    responses(
        (status = 200, description = "Inventory item returned"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_item_by_code(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .inventory
        .get_by_code(&code)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Inventory item with code {} not found", code)))?;
    Ok(success_response(item))
}

/// Substring search over name, code, description, brand and model
#[utoipa::path(
    get,
    path = "/api/v1/inventory/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching items"),
        (status = 400, description = "Empty search term", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn search_items(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.services.inventory.search(params.q.trim()).await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/category/{category}",
    params(("category" = String, Path, description = "Item category")),
    responses((status = 200, description = "Items in the category")),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn items_by_category(
    State(state): State<AppState>,
    PathParam(category): PathParam<String>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.services.inventory.list_by_category(&category).await?;
    Ok(success_response(items))
}

/// Items at or below their minimum, most critical first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses((status = 200, description = "Low stock items")),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn low_stock_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state.services.inventory.low_stock().await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/movements",
    params(("id" = i32, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Ledger movements of the item, newest first"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn item_movements(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.inventory.require_item(id).await?;
    let movements = state.services.stock_movements.by_item(id).await?;
    Ok(success_response(movements))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = NewInventoryItem,
    responses(
        (status = 201, description = "Inventory item created"),
        (status = 400, description = "Invalid input or duplicate code", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewInventoryItem>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state.services.inventory.create_item(payload).await?;
    info!(item_id = item.id, code = %item.code, "inventory item created");
    Ok(created_response(item))
}

/// Update item fields; stock only changes through the ledger
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    params(("id" = i32, Path, description = "Inventory item ID")),
    request_body = InventoryItemChanges,
    responses(
        (status = 200, description = "Inventory item updated"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<InventoryItemChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state.services.inventory.update_item(id, payload).await?;
    Ok(success_response(item))
}

/// Apply an entrada or salida to an item through the stock ledger
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/{id}/stock",
    params(("id" = i32, Path, description = "Inventory item ID")),
    request_body = StockChangeRequest,
    responses(
        (status = 200, description = "Stock adjusted; movement and item returned"),
        (status = 400, description = "Invalid quantity or insufficient stock", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn adjust_item_stock(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<StockChangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    state.services.inventory.require_item(id).await?;
    let outcome = state
        .services
        .inventory
        .adjust_stock(payload.into_adjustment(id, user.user_id))
        .await?;
    Ok(success_response(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = i32, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Inventory item deleted"),
        (status = 400, description = "Item has stock movements", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.inventory.delete_item(id).await?;
    info!(item_id = id, "inventory item deleted");
    Ok(deleted_response(format!("Inventory item {} deleted", id)))
}
