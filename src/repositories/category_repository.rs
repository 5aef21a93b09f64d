use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::category::Category;
use crate::models::user::User;
use crate::repositories::RepositoryError;
use crate::scope::Scope;

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a new category owned by `user_id`
    async fn create(&self, user_id: i64, label: &str) -> Result<Category, RepositoryError>;

    /// Insert one category per label for `user_id`, as a single batch
    async fn create_batch(
        &self,
        user_id: i64,
        labels: &[String],
    ) -> Result<Vec<Category>, RepositoryError>;

    /// Find a category by id within the given visibility scope
    async fn find_by_id(&self, scope: Scope, id: i64)
        -> Result<Option<Category>, RepositoryError>;

    /// Find a category by id together with its owning user
    async fn find_by_id_with_owner(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<(Category, User)>, RepositoryError>;

    /// Find a category by label within the given visibility scope
    async fn find_by_label(
        &self,
        scope: Scope,
        label: &str,
    ) -> Result<Option<Category>, RepositoryError>;

    /// All persisted categories owned by `user_id`, in insertion order
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Category>, RepositoryError>;

    /// Persist a modified category
    async fn save(&self, category: &Category) -> Result<Category, RepositoryError>;

    /// Delete a category; dependent transactions are re-pointed to NULL
    /// (the synthetic "Other" category) by the storage layer
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

fn scope_params(scope: Scope) -> (bool, i64) {
    match scope {
        Scope::SelfOnly(user_id) => (true, user_id),
        Scope::Unrestricted => (false, 0),
    }
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, user_id: i64, label: &str) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (label, user_id)
            VALUES ($1, $2)
            RETURNING id, label, user_id
            "#,
        )
        .bind(label)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn create_batch(
        &self,
        user_id: i64,
        labels: &[String],
    ) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (label, user_id)
            SELECT label, $2 FROM UNNEST($1::varchar[]) AS label
            RETURNING id, label, user_id
            "#,
        )
        .bind(labels)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_by_id(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<Category>, RepositoryError> {
        let (scoped, user_id) = scope_params(scope);
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, label, user_id
            FROM categories
            WHERE id = $1 AND (NOT $2 OR user_id = $3)
            "#,
        )
        .bind(id)
        .bind(scoped)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_by_id_with_owner(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<(Category, User)>, RepositoryError> {
        let (scoped, user_id) = scope_params(scope);
        let row = sqlx::query_as::<_, CategoryWithOwnerRow>(
            r#"
            SELECT c.id, c.label, c.user_id,
                   u.id AS owner_id, u.username, u.display_name, u.role,
                   u.password_hash, u.refresh_token, u.logout_timestamp
            FROM categories c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1 AND (NOT $2 OR c.user_id = $3)
            "#,
        )
        .bind(id)
        .bind(scoped)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CategoryWithOwnerRow::split))
    }

    async fn find_by_label(
        &self,
        scope: Scope,
        label: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let (scoped, user_id) = scope_params(scope);
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, label, user_id
            FROM categories
            WHERE label = $1 AND (NOT $2 OR user_id = $3)
            LIMIT 1
            "#,
        )
        .bind(label)
        .bind(scoped)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, label, user_id
            FROM categories
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn save(&self, category: &Category) -> Result<Category, RepositoryError> {
        let saved = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET label = $2
            WHERE id = $1
            RETURNING id, label, user_id
            "#,
        )
        .bind(category.id)
        .bind(&category.label)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CategoryWithOwnerRow {
    id: i64,
    label: String,
    user_id: i64,
    owner_id: i64,
    username: String,
    display_name: String,
    role: crate::models::user::UserRole,
    password_hash: String,
    refresh_token: Option<String>,
    logout_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl CategoryWithOwnerRow {
    fn split(self) -> (Category, User) {
        (
            Category {
                id: self.id,
                label: self.label,
                user_id: self.user_id,
            },
            User {
                id: self.owner_id,
                username: self.username,
                display_name: self.display_name,
                role: self.role,
                password_hash: self.password_hash,
                refresh_token: self.refresh_token,
                logout_timestamp: self.logout_timestamp,
            },
        )
    }
}
