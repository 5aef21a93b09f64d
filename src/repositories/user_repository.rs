use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::user::{User, UserRole};
use crate::repositories::RepositoryError;

/// Trait defining user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with the User role, returning the assigned id
    async fn create(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Persist profile fields and role of an existing user
    async fn save(&self, user: &User) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    /// Find a user by username, compared case-insensitively
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;

    async fn set_password_hash(&self, id: i64, password_hash: &str)
        -> Result<(), RepositoryError>;

    async fn set_refresh_token(
        &self,
        id: i64,
        token: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn set_logout_timestamp(
        &self,
        id: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Delete a user; owned categories and transactions are removed by cascade
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, display_name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, display_name, role, password_hash,
                      refresh_token, logout_timestamp
            "#,
        )
        .bind(username)
        .bind(display_name)
        .bind(UserRole::User)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, RepositoryError> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, display_name = $3, role = $4
            WHERE id = $1
            RETURNING id, username, display_name, role, password_hash,
                      refresh_token, logout_timestamp
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, role, password_hash,
                   refresh_token, logout_timestamp
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, role, password_hash,
                   refresh_token, logout_timestamp
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, role, password_hash,
                   refresh_token, logout_timestamp
            FROM users
            WHERE refresh_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, role, password_hash,
                   refresh_token, logout_timestamp
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn set_password_hash(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_refresh_token(
        &self,
        id: i64,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_logout_timestamp(
        &self,
        id: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET logout_timestamp = $2 WHERE id = $1")
            .bind(id)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
