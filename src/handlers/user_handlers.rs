use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::handlers::{validate_request, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::user::{DeleteUserRequest, UpdateUserRequest, User};
use crate::services::user_service::UserError;
use crate::state::AppState;

/// Convert UserError to HTTP response
impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            UserError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", "User not found"),
            UserError::UsernameTaken => (
                StatusCode::CONFLICT,
                "username_taken",
                "Another user with this username already exists",
            ),
            UserError::AdminProtected => (
                StatusCode::FORBIDDEN,
                "admin_protected",
                "Not allowed to modify another Administrator",
            ),
            UserError::RoleChangeForbidden => (
                StatusCode::FORBIDDEN,
                "role_change_forbidden",
                "Not allowed to change this user's role",
            ),
            UserError::InvalidPassword => {
                (StatusCode::BAD_REQUEST, "invalid_password", "Invalid password")
            }
            UserError::SelfTarget => (
                StatusCode::BAD_REQUEST,
                "self_target",
                "Use the current-account endpoint to delete your own account",
            ),
            UserError::DatabaseError(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                msg.as_str(),
            ),
        };

        let error_response = ErrorResponse::new(error_type, message);
        (status, Json(error_response)).into_response()
    }
}

/// Handler for listing every user (Administrators only)
#[utoipa::path(
    get,
    path = "/api/users/all",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, Response> {
    match state.user_service.get_all_users().await {
        Ok(users) => Ok(Json(users)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler returning the current user's profile
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn current_user_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Json<User> {
    Json(auth_user.user)
}

/// Handler for fetching a user by id (Administrators only)
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User, or null when absent", body = Option<User>),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Option<User>>, Response> {
    match state.user_service.get_user_by_id(user_id).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating the current user's profile
#[utoipa::path(
    patch,
    path = "/api/users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 409, description = "Username already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_current_user_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, Response> {
    validate_request(&request)?;

    match state
        .user_service
        .update_user(auth_user.user.id, request, &auth_user.user)
        .await
    {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a user by id (Administrators only)
#[utoipa::path(
    patch,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Target is another Administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, Response> {
    validate_request(&request)?;

    match state
        .user_service
        .update_user(user_id, request, &auth_user.user)
        .await
    {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting the current account (password-confirmed)
#[utoipa::path(
    delete,
    path = "/api/users",
    request_body = DeleteUserRequest,
    responses(
        (status = 204, description = "Account deleted with its categories and transactions"),
        (status = 400, description = "Invalid password", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_current_user_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<DeleteUserRequest>,
) -> Result<StatusCode, Response> {
    validate_request(&request)?;

    match state
        .user_service
        .delete_current_user(&auth_user.user, &request.password)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a user by id (Administrators only)
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot target the current account", body = ErrorResponse),
        (status = 403, description = "Target is another Administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, Response> {
    match state
        .user_service
        .delete_user_by_id(user_id, &auth_user.user)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
