use super::common::{
    created_response, deleted_response, paginated_response, success_response, validate_input,
    JsonBody, PathParam, PaginationParams, QueryParams,
};
use crate::{
    auth::AuthRouterExt,
    entities::role,
    errors::{ApiError, ErrorResponse, ServiceError},
    services::users::{NewUser, UserChanges},
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

/// User and role administration.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:id", get(get_role))
        .route("/users", get(list_users).post(create_user))
        .route("/users/role/:role", get(users_by_role))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_roles(&[role::ADMINISTRATOR])
}

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses((status = 200, description = "All roles")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.roles.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role returned"),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_role(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .services
        .roles
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Role", id))?;
    Ok(success_response(role))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PaginationParams),
    responses((status = 200, description = "User page returned")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.page_size(pagination.limit);
    let (users, total) = state
        .services
        .users
        .list(pagination.page(), limit)
        .await?;
    Ok(paginated_response(users, total, &pagination, limit))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User returned"),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", id))?;
    Ok(success_response(user))
}

/// Users holding a role, by role name
#[utoipa::path(
    get,
    path = "/api/v1/users/role/{role}",
    params(("role" = String, Path, description = "administrador, mecanico or cliente")),
    responses((status = 200, description = "Users with the role")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn users_by_role(
    State(state): State<AppState>,
    PathParam(role_name): PathParam<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.users.by_role(&role_name).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid input, unknown role or email in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state.services.users.create(payload).await?;
    info!(user_id = user.id, "user registered");
    Ok(created_response(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UserChanges,
    responses(
        (status = 200, description = "User updated"),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UserChanges>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    Ok(success_response(state.services.users.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "User is referenced by workshop records", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.delete(id).await?;
    Ok(deleted_response(format!("User {} deleted", id)))
}
