use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::user::User;

/// Request payload for user login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "username": "john.doe",
    "password": "securepassword123"
}))]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Access and refresh tokens issued on registration and login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response returned by register and login endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenPair,
}

/// Request payload for changing the current user's password
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePasswordRequest {
    #[validate(length(
        min = 4,
        max = 30,
        message = "current_password length must be between 4 and 30 characters"
    ))]
    pub current_password: String,

    #[validate(length(
        min = 4,
        max = 30,
        message = "new_password length must be between 4 and 30 characters"
    ))]
    pub new_password: String,

    #[validate(length(
        min = 4,
        max = 30,
        message = "new_password_confirm length must be between 4 and 30 characters"
    ))]
    pub new_password_confirm: String,
}
