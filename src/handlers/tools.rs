use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::{ApiError, ErrorResponse, ServiceError},
    services::tools::ToolInput,
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};

pub fn routes() -> Router<AppState> {
    let shop = Router::new()
        .route("/tools", get(list_tools).post(create_tool))
        .route("/tools/:id", get(get_tool).put(update_tool))
        .with_roles(&[role::ADMINISTRATOR, role::MECHANIC]);

    let admin = Router::new()
        .route("/tools/:id", delete(delete_tool))
        .with_roles(&[role::ADMINISTRATOR]);

    shop.merge(admin)
}

#[utoipa::path(
    get,
    path = "/api/v1/tools",
    params(PaginationParams),
    responses((status = 200, description = "Tool page returned")),
    security(("bearer_auth" = [])),
    tag = "tools"
)]
pub async fn list_tools(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (tools, total) = state.services.tools.list(pagination.page(), limit).await?;
    Ok(paginated_response(tools, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/tools/{id}",
    params(("id" = i32, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool returned"),
        (status = 404, description = "Tool not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tools"
)]
pub async fn get_tool(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let tool = state
        .services
        .tools
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tool", id))?;
    Ok(success_response(tool))
}

#[utoipa::path(
    post,
    path = "/api/v1/tools",
    request_body = ToolInput,
    responses(
        (status = 201, description = "Tool registered"),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tools"
)]
pub async fn create_tool(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ToolInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(created_response(state.services.tools.create(payload).await?))
}

/// Replace a tool record, e.g. when it is lent out or returned
#[utoipa::path(
    put,
    path = "/api/v1/tools/{id}",
    params(("id" = i32, Path, description = "Tool ID")),
    request_body = ToolInput,
    responses(
        (status = 200, description = "Tool updated"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Tool not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tools"
)]
pub async fn update_tool(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<ToolInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(state.services.tools.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tools/{id}",
    params(("id" = i32, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool removed"),
        (status = 404, description = "Tool not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tools"
)]
pub async fn delete_tool(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.tools.delete(id).await?;
    Ok(deleted_response(format!("Tool {} deleted", id)))
}
