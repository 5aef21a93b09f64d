use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;

use crate::models::user::{User, UserRole};
use crate::state::AppState;

/// Extension type carrying the authenticated user through the request
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

/// Auth middleware errors
#[derive(Debug)]
pub enum AuthMiddlewareError {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    AdminRequired,
}

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthMiddlewareError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Missing authorization token")
            }
            AuthMiddlewareError::InvalidTokenFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format. Expected: Bearer <token>",
            ),
            AuthMiddlewareError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Your access token is invalid or has expired",
            ),
            AuthMiddlewareError::AdminRequired => (
                StatusCode::FORBIDDEN,
                "This endpoint is restricted to Administrators",
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Extract the Bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthMiddlewareError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthMiddlewareError::MissingToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthMiddlewareError::InvalidTokenFormat)
}

/// Auth middleware validating access tokens and loading the current user
///
/// Tokens issued before the user's logout timestamp are rejected, so a logout
/// or password change invalidates every previously issued access token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let token = bearer_token(&headers)?;

    let claims = state
        .auth_service
        .validate_access_token(token)
        .map_err(|_| AuthMiddlewareError::InvalidToken)?;

    let user = state
        .user_service
        .get_user_by_id(claims.id)
        .await
        .map_err(|_| AuthMiddlewareError::InvalidToken)?
        .ok_or(AuthMiddlewareError::InvalidToken)?;

    if let Some(logout_timestamp) = user.logout_timestamp {
        if claims.iat < logout_timestamp.timestamp() {
            return Err(AuthMiddlewareError::InvalidToken);
        }
    }

    request.extensions_mut().insert(AuthenticatedUser { user });

    Ok(next.run(request).await)
}

/// Route layer restricting an endpoint to Administrators
///
/// Must be applied on top of `auth_middleware`.
pub async fn require_admin(
    Extension(auth_user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    if auth_user.user.role != UserRole::Admin {
        return Err(AuthMiddlewareError::AdminRequired);
    }

    Ok(next.run(request).await)
}
