use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::{ApiError, ErrorResponse, ServiceError},
    services::catalog::CatalogServiceInput,
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

/// Reads are open to any signed-in user; the catalog itself is edited by administrators.
pub fn routes() -> Router<AppState> {
    let read = Router::new()
        .route("/services", get(list_services))
        .route("/services/category/:category", get(services_by_category))
        .route("/services/:id", get(get_service))
        .with_auth();

    let manage = Router::new()
        .route("/services", post(create_service))
        .route("/services/:id", put(update_service).delete(delete_service))
        .with_roles(&[role::ADMINISTRATOR]);

    read.merge(manage)
}

#[utoipa::path(
    get,
    path = "/api/v1/services",
    params(PaginationParams),
    responses((status = 200, description = "Catalog page returned")),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (services, total) = state
        .services
        .catalog
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(services, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    params(("id" = i32, Path, description = "Catalog service ID")),
    responses(
        (status = 200, description = "Catalog service returned"),
        (status = 404, description = "Catalog service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state
        .services
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Service", id))?;
    Ok(success_response(service))
}

#[utoipa::path(
    get,
    path = "/api/v1/services/category/{category}",
    params(("category" = String, Path, description = "Service category")),
    responses((status = 200, description = "Catalog services in the category")),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn services_by_category(
    State(state): State<AppState>,
    PathParam(category): PathParam<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(
        state.services.catalog.by_category(&category).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/services",
    request_body = CatalogServiceInput,
    responses(
        (status = 201, description = "Catalog service created"),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CatalogServiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(state.services.catalog.create(payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/services/{id}",
    params(("id" = i32, Path, description = "Catalog service ID")),
    request_body = CatalogServiceInput,
    responses(
        (status = 200, description = "Catalog service updated"),
        (status = 404, description = "Catalog service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<CatalogServiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(
        state.services.catalog.update(id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    params(("id" = i32, Path, description = "Catalog service ID")),
    responses(
        (status = 200, description = "Catalog service deleted"),
        (status = 400, description = "Service is used by order details", body = ErrorResponse),
        (status = 404, description = "Catalog service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.catalog.delete(id).await?;
    Ok(deleted_response(format!("Service {} deleted", id)))
}
