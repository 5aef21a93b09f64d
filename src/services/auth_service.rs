use async_trait::async_trait;
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::auth::{AuthResponse, LoginRequest, TokenPair, UpdatePasswordRequest};
use crate::models::user::{CreateUserRequest, User, UserRole};
use crate::services::user_service::{UserError, UserService};

/// Access/refresh token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    /// Issued-at timestamp, compared against the user's logout timestamp
    pub iat: i64,
    pub exp: i64,
}

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username is already in use")]
    UsernameTaken,

    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("Token is invalid or has expired")]
    InvalidToken,

    #[error("new_password and new_password_confirm do not match")]
    PasswordMismatch,

    #[error("Invalid current password")]
    InvalidCurrentPassword,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UsernameTaken => AuthError::UsernameTaken,
            other => AuthError::DatabaseError(other.to_string()),
        }
    }
}

/// Trait defining authentication service operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and issue an access/refresh token pair
    async fn register(&self, request: CreateUserRequest) -> Result<AuthResponse, AuthError>;

    /// Authenticate a user and issue an access/refresh token pair
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError>;

    /// Exchange a valid stored refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError>;

    /// Change the current user's password, then log them out everywhere
    async fn update_password(
        &self,
        actor: &User,
        request: UpdatePasswordRequest,
    ) -> Result<(), AuthError>;

    /// Invalidate the refresh token and stamp the logout timestamp
    async fn logout(&self, actor: &User) -> Result<(), AuthError>;

    /// Validate an access token and return its claims
    fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    user_service: Arc<dyn UserService>,
    access_token_secret: String,
    refresh_token_secret: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl AuthServiceImpl {
    pub fn new(
        user_service: Arc<dyn UserService>,
        access_token_secret: String,
        refresh_token_secret: String,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            user_service,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl,
            refresh_token_ttl,
        }
    }

    fn generate_token(&self, user: &User, secret: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::DatabaseError(format!("Token generation failed: {}", e)))
    }

    fn decode_token(&self, token: &str, secret: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }

    async fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = self.generate_token(user, &self.access_token_secret, self.access_token_ttl)?;
        let refresh_token =
            self.generate_token(user, &self.refresh_token_secret, self.refresh_token_ttl)?;

        self.user_service
            .update_refresh_token(user.id, &refresh_token)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, request: CreateUserRequest) -> Result<AuthResponse, AuthError> {
        if self
            .user_service
            .get_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let user = self.user_service.create_user(request).await?;
        let tokens = self.issue_token_pair(&user).await?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");

        Ok(AuthResponse { user, tokens })
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        // Unknown username and wrong password are indistinguishable to the caller.
        let user = self
            .user_service
            .get_user_by_username(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let passwords_match = verify(&request.password, &user.password_hash)
            .map_err(|e| AuthError::DatabaseError(format!("Password verification failed: {}", e)))?;
        if !passwords_match {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_token_pair(&user).await?;

        Ok(AuthResponse { user, tokens })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        // Both the signature and the stored token must check out.
        self.decode_token(refresh_token, &self.refresh_token_secret)?;

        let user = self
            .user_service
            .get_user_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.generate_token(&user, &self.access_token_secret, self.access_token_ttl)
    }

    async fn update_password(
        &self,
        actor: &User,
        request: UpdatePasswordRequest,
    ) -> Result<(), AuthError> {
        if request.new_password != request.new_password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let current_matches = verify(&request.current_password, &actor.password_hash)
            .map_err(|e| AuthError::DatabaseError(format!("Password verification failed: {}", e)))?;
        if !current_matches {
            return Err(AuthError::InvalidCurrentPassword);
        }

        self.user_service
            .update_user_password(actor, &request.new_password)
            .await?;

        // Changing the password invalidates every outstanding session.
        self.logout(actor).await
    }

    async fn logout(&self, actor: &User) -> Result<(), AuthError> {
        self.user_service.clear_refresh_token(actor.id).await?;
        self.user_service
            .update_logout_timestamp(actor.id, Utc::now())
            .await?;

        Ok(())
    }

    fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_token(token, &self.access_token_secret)
    }
}
