use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Role assigned to a user account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// User entity representing a registered account
///
/// The very first account created in the system (id 1) is promoted to Admin.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub logout_timestamp: Option<DateTime<Utc>>,
}

/// Request payload for user registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "username": "john.doe",
    "display_name": "John Doe",
    "password": "securepassword123"
}))]
pub struct CreateUserRequest {
    #[validate(length(
        min = 4,
        max = 50,
        message = "username length must be between 4 and 50 characters"
    ))]
    pub username: String,

    #[validate(length(
        min = 4,
        max = 50,
        message = "display_name length must be between 4 and 50 characters"
    ))]
    pub display_name: String,

    #[validate(length(
        min = 4,
        max = 30,
        message = "password length must be between 4 and 30 characters"
    ))]
    pub password: String,
}

/// Request payload for updating a user profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(
        min = 4,
        max = 50,
        message = "username length must be between 4 and 50 characters"
    ))]
    pub username: Option<String>,

    #[validate(length(
        min = 4,
        max = 50,
        message = "display_name length must be between 4 and 50 characters"
    ))]
    pub display_name: Option<String>,

    pub role: Option<UserRole>,
}

/// Request payload for deleting the current account (password-confirmed)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeleteUserRequest {
    #[validate(length(
        min = 4,
        max = 30,
        message = "password length must be between 4 and 30 characters"
    ))]
    pub password: String,
}
