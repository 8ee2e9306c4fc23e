use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams, SearchParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::{ApiError, ErrorResponse, ServiceError},
    services::suppliers::SupplierInput,
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/search", get(search_suppliers))
        .route(
            "/suppliers/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .with_roles(&[role::ADMINISTRATOR])
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(PaginationParams),
    responses((status = 200, description = "Supplier page returned")),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (suppliers, total) = state
        .services
        .suppliers
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(suppliers, total, &pagination, limit))
}

/// Get a supplier by ID
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier returned"),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    PathParam(supplier_id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get(supplier_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Supplier", supplier_id))?;
    Ok(success_response(supplier))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/search",
    params(SearchParams),
    responses((status = 200, description = "Suppliers matching the term")),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn search_suppliers(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.suppliers.search(params.q.trim()).await?,
    ))
}

/// Create a new supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = SupplierInput,
    responses(
        (status = 201, description = "Supplier created"),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let supplier = state.services.suppliers.create(payload).await?;
    info!("Supplier created: {}", supplier.id);
    Ok(created_response(supplier))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier ID")),
    request_body = SupplierInput,
    responses(
        (status = 200, description = "Supplier updated"),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    PathParam(supplier_id): PathParam<i32>,
    JsonBody(payload): JsonBody<SupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let supplier = state
        .services
        .suppliers
        .update(supplier_id, payload)
        .await?;
    Ok(success_response(supplier))
}

/// Delete a supplier with no purchase orders
#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier deleted"),
        (status = 400, description = "Supplier has purchase orders", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    PathParam(supplier_id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.suppliers.delete(supplier_id).await?;
    info!("Supplier deleted: {}", supplier_id);
    Ok(deleted_response(format!("Supplier {} deleted", supplier_id)))
}
