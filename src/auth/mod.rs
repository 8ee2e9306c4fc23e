/*!
 * # Authentication and Authorization Module
 *
 * Bearer JWT authentication for the workshop API:
 *
 * - `POST /api/v1/auth/login` verifies an Argon2 password hash and issues an HS256 token
 * - `auth_middleware` validates the token and places an [`AuthUser`] in the request extensions
 * - `role_middleware` restricts route groups to a set of role names
 */

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::entities::{role, user};
use crate::errors::{ErrorResponse, ServiceError};
use crate::handlers::common::JsonBody;

mod password;

pub use password::{hash_password, verify_password};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub name: String,  // Full name
    pub email: String, // Login email
    pub role: String,  // Role name
    pub jti: String,   // JWT ID
    pub iat: i64,      // Issued at time
    pub exp: i64,      // Expiration time
    pub nbf: i64,      // Not valid before time
    pub iss: String,   // Issuer
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn has_any_role(&self, roles: &[String]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(role::ADMINISTRATOR)
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            user_id,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_issuer: String, access_token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

/// Credentials accepted by the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "admin@taller.local")]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Public part of a user returned after login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Authentication service that handles login and token validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verifies credentials, stamps `last_access` and issues a token.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.trim().to_lowercase()))
            .find_also_related(role::Entity)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let (account, account_role) = match found {
            Some((account, Some(account_role))) => (account, account_role),
            Some((_, None)) | None => {
                warn!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(&request.password, &account.password_hash) {
            warn!(user_id = account.id, "login rejected: bad password");
            return Err(AuthError::InvalidCredentials);
        }

        let mut active: user::ActiveModel = account.clone().into();
        active.last_access = Set(Some(Utc::now()));
        active
            .update(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let access_token = self.generate_token(&account, &account_role.name)?;
        info!(user_id = account.id, role = %account_role.name, "user logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            user: UserProfile {
                id: account.id,
                name: account.full_name(),
                email: account.email,
                role: account_role.name,
            },
        })
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, account: &user::Model, role_name: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            name: account.full_name(),
            email: account.email.clone(),
            role: role_name.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuth | Self::InvalidCredentials | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err.status_code() {
            StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(err.to_string()),
            StatusCode::FORBIDDEN => ServiceError::Forbidden(err.to_string()),
            StatusCode::BAD_REQUEST => ServiceError::ValidationError(err.to_string()),
            _ => ServiceError::InternalError(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::MissingAuth => "Authentication required".to_string(),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                tracing::error!(error = %self, "authentication failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}

/// Pulls the user placed by [`auth_middleware`] out of the request extensions.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Role names allowed through [`role_middleware`].
#[derive(Clone, Debug)]
pub struct RoleSet(pub Arc<Vec<String>>);

impl RoleSet {
    pub fn new(roles: &[&str]) -> Self {
        Self(Arc::new(roles.iter().map(|r| r.to_string()).collect()))
    }
}

/// Role middleware to check if a user has one of the allowed roles
pub async fn role_middleware(
    State(allowed): State<RoleSet>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.has_any_role(&allowed.0) {
        debug!(user_id = user.user_id, role = %user.role, "role not allowed on route");
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)?;

    let claims = auth_service.validate_token(token)?;
    AuthUser::try_from(claims)
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/login", axum::routing::post(login_handler))
        .layer(DefaultBodyLimit::max(1024 * 16))
}

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Malformed credentials", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    JsonBody(credentials): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    credentials
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;
    let response = auth_service.login(&credentials).await?;
    Ok(Json(response))
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_roles(self, roles: &[&str]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_roles(self, roles: &[&str]) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            RoleSet::new(roles),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            AuthConfig::new(
                "Xq7vL2mR9tYw4KpZ8nBc3FjH6sDg1QeU0aWoIyTrNlMkVbCxE5uGzJhSfPd_Aq7vL2".into(),
                "taller-api".into(),
                Duration::from_secs(600),
            ),
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    fn account() -> user::Model {
        user::Model {
            id: 7,
            role_id: 2,
            first_name: "Marta".into(),
            last_name: "Quiroga".into(),
            second_last_name: None,
            email: "marta@taller.local".into(),
            password_hash: String::new(),
            phone: None,
            address: None,
            city: None,
            state_province: None,
            postal_code: None,
            birth_date: None,
            last_access: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_validates_into_auth_user() {
        let svc = service();
        let token = svc.generate_token(&account(), role::MECHANIC).unwrap();
        let user = AuthUser::try_from(svc.validate_token(&token).unwrap()).unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.name, "Marta Quiroga");
        assert!(user.has_role(role::MECHANIC));
        assert!(!user.is_admin());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthService::new(
            AuthConfig::new(
                "Pk3nW8zR1cVb6TyH0mLq5XsD9fGj2AeU7oIwKpZr4NtYvBx_MhCgEjSdFuQa8Lm1".into(),
                "taller-api".into(),
                Duration::from_secs(600),
            ),
            Arc::new(DatabaseConnection::Disconnected),
        );
        let token = other.generate_token(&account(), role::ADMINISTRATOR).unwrap();
        assert!(matches!(service().validate_token(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let svc = service();
        let token = svc.generate_token(&account(), role::MECHANIC).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, token.parse().unwrap());
        assert!(matches!(
            extract_auth_from_headers(&headers, &svc),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            extract_auth_from_headers(&HeaderMap::new(), &svc),
            Err(AuthError::MissingAuth)
        ));
    }

    #[test]
    fn auth_errors_map_to_status_codes() {
        assert_eq!(AuthError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientPermissions.status_code(),
            StatusCode::FORBIDDEN
        );
        assert!(matches!(
            ServiceError::from(AuthError::InsufficientPermissions),
            ServiceError::Forbidden(_)
        ));
    }
}
