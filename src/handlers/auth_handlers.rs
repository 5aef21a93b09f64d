use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::handlers::{validate_request, ErrorResponse};
use crate::middleware::auth_middleware::{bearer_token, AuthenticatedUser};
use crate::models::auth::{AuthResponse, LoginRequest, UpdatePasswordRequest};
use crate::models::user::CreateUserRequest;
use crate::services::auth_service::AuthError;
use crate::state::AppState;

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::UsernameTaken => (
                StatusCode::CONFLICT,
                "username_taken",
                "Username is already in use",
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Wrong username or password",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Token is invalid or has expired",
            ),
            AuthError::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "password_mismatch",
                "new_password and new_password_confirm do not match",
            ),
            AuthError::InvalidCurrentPassword => (
                StatusCode::BAD_REQUEST,
                "invalid_current_password",
                "Invalid current password",
            ),
            AuthError::DatabaseError(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                msg.as_str(),
            ),
        };

        let error_response = ErrorResponse::new(error_type, message);
        (status, Json(error_response)).into_response()
    }
}

/// Handler for user registration
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Username already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Response> {
    validate_request(&request)?;

    match state.auth_service.register(request).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for user login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Wrong username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Response> {
    match state.auth_service.login(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for exchanging a refresh token for a new access token
///
/// The refresh token is presented as a Bearer token.
#[utoipa::path(
    get,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New access token issued"),
        (status = 401, description = "Refresh token invalid or expired", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, Response> {
    let token = bearer_token(&headers).map_err(|e| e.into_response())?;

    match state.auth_service.refresh(token).await {
        Ok(access_token) => Ok(Json(json!({ "access_token": access_token }))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for changing the current user's password
#[utoipa::path(
    patch,
    path = "/api/auth/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password updated; all sessions invalidated"),
        (status = 400, description = "Password confirmation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_password_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, Response> {
    validate_request(&request)?;

    match state
        .auth_service
        .update_password(&auth_user.user, request)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for logging out the current user
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out; outstanding tokens invalidated"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<StatusCode, Response> {
    match state.auth_service.logout(&auth_user.user).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
