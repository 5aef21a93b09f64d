use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::models::user::{CreateUserRequest, UpdateUserRequest, User, UserRole};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use crate::services::category_service::CategoryService;

/// Id of the first account ever created, which is auto-promoted to Admin
const FIRST_USER_ID: i64 = 1;

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Another user with this username already exists")]
    UsernameTaken,

    #[error("Not allowed to modify another Administrator")]
    AdminProtected,

    #[error("Not allowed to change this user's role")]
    RoleChangeForbidden,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Use the current-account endpoint to delete your own account")]
    SelfTarget,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => UserError::UserNotFound,
            RepositoryError::ConstraintViolation(_) => UserError::UsernameTaken,
            RepositoryError::DatabaseError(msg) => UserError::DatabaseError(msg),
        }
    }
}

/// Trait defining user service operations
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user: hash the password, persist, promote the first-ever
    /// account to Admin, then seed the default categories
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserError>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, UserError>;

    /// Case-insensitive username lookup
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    async fn get_user_by_refresh_token(&self, token: &str) -> Result<Option<User>, UserError>;

    async fn get_all_users(&self) -> Result<Vec<User>, UserError>;

    async fn update_user(
        &self,
        id: i64,
        request: UpdateUserRequest,
        actor: &User,
    ) -> Result<User, UserError>;

    async fn update_user_password(&self, user: &User, password: &str) -> Result<(), UserError>;

    async fn update_refresh_token(&self, id: i64, token: &str) -> Result<(), UserError>;

    async fn clear_refresh_token(&self, id: i64) -> Result<(), UserError>;

    async fn update_logout_timestamp(
        &self,
        id: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), UserError>;

    /// Admin endpoint: delete another user's account. Self-targeting is a
    /// BadRequest and other Admins are protected.
    async fn delete_user_by_id(&self, id: i64, actor: &User) -> Result<(), UserError>;

    /// Delete the current account after confirming the password
    async fn delete_current_user(&self, actor: &User, password: &str) -> Result<(), UserError>;
}

/// Implementation of UserService
pub struct UserServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    category_service: Arc<dyn CategoryService>,
}

impl UserServiceImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        category_service: Arc<dyn CategoryService>,
    ) -> Self {
        Self {
            user_repository,
            category_service,
        }
    }

    fn hash_password(password: &str) -> Result<String, UserError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| UserError::DatabaseError(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, password_hash: &str) -> Result<bool, UserError> {
        verify(password, password_hash)
            .map_err(|e| UserError::DatabaseError(format!("Password verification failed: {}", e)))
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserError> {
        let password_hash = Self::hash_password(&request.password)?;

        let mut user = self
            .user_repository
            .create(&request.username, &request.display_name, &password_hash)
            .await?;

        if user.id == FIRST_USER_ID {
            user.role = UserRole::Admin;
            user = self.user_repository.save(&user).await?;
            tracing::info!(user_id = user.id, "first account promoted to Administrator");
        }

        self.category_service
            .create_default_categories(&user)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        Ok(self.user_repository.find_by_id(id).await?)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        Ok(self.user_repository.find_by_username(username).await?)
    }

    async fn get_user_by_refresh_token(&self, token: &str) -> Result<Option<User>, UserError> {
        Ok(self.user_repository.find_by_refresh_token(token).await?)
    }

    async fn get_all_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.user_repository.find_all().await?)
    }

    async fn update_user(
        &self,
        id: i64,
        request: UpdateUserRequest,
        actor: &User,
    ) -> Result<User, UserError> {
        let user = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::UserNotFound)?;

        if actor.id != user.id && user.role == UserRole::Admin {
            return Err(UserError::AdminProtected);
        }

        // Roles can only be reassigned on accounts that are already Admin.
        if request.role.is_some() && user.role != UserRole::Admin {
            return Err(UserError::RoleChangeForbidden);
        }

        if let Some(username) = &request.username {
            if username != &user.username
                && self
                    .user_repository
                    .find_by_username(username)
                    .await?
                    .is_some()
            {
                return Err(UserError::UsernameTaken);
            }
        }

        let merged = User {
            username: request.username.unwrap_or(user.username.clone()),
            display_name: request.display_name.unwrap_or(user.display_name.clone()),
            role: request.role.unwrap_or(user.role),
            ..user
        };
        let saved = self.user_repository.save(&merged).await?;

        Ok(saved)
    }

    async fn update_user_password(&self, user: &User, password: &str) -> Result<(), UserError> {
        let password_hash = Self::hash_password(password)?;
        self.user_repository
            .set_password_hash(user.id, &password_hash)
            .await?;

        Ok(())
    }

    async fn update_refresh_token(&self, id: i64, token: &str) -> Result<(), UserError> {
        Ok(self.user_repository.set_refresh_token(id, Some(token)).await?)
    }

    async fn clear_refresh_token(&self, id: i64) -> Result<(), UserError> {
        Ok(self.user_repository.set_refresh_token(id, None).await?)
    }

    async fn update_logout_timestamp(
        &self,
        id: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), UserError> {
        Ok(self
            .user_repository
            .set_logout_timestamp(id, timestamp)
            .await?)
    }

    async fn delete_user_by_id(&self, id: i64, actor: &User) -> Result<(), UserError> {
        if id == actor.id {
            return Err(UserError::SelfTarget);
        }

        let user = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::UserNotFound)?;

        if user.role == UserRole::Admin {
            return Err(UserError::AdminProtected);
        }

        // Cascades to the user's categories and transactions.
        self.user_repository.delete(user.id).await?;

        Ok(())
    }

    async fn delete_current_user(&self, actor: &User, password: &str) -> Result<(), UserError> {
        if !Self::verify_password(password, &actor.password_hash)? {
            return Err(UserError::InvalidPassword);
        }

        self.user_repository.delete(actor.id).await?;

        Ok(())
    }
}
