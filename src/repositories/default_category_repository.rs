use async_trait::async_trait;
use sqlx::PgPool;

use crate::repositories::RepositoryError;

/// Trait defining default-category template operations
///
/// The template is a process-wide list of labels seeded into every new user's
/// category set. Only administrators rewrite it.
#[async_trait]
pub trait DefaultCategoryRepository: Send + Sync {
    /// Current template labels, in insertion order
    async fn list_labels(&self) -> Result<Vec<String>, RepositoryError>;

    /// Replace the whole template with `labels`, returning the stored list
    async fn replace_all(&self, labels: &[String]) -> Result<Vec<String>, RepositoryError>;
}

/// PostgreSQL implementation of DefaultCategoryRepository
pub struct PostgresDefaultCategoryRepository {
    pool: PgPool,
}

impl PostgresDefaultCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DefaultCategoryRepository for PostgresDefaultCategoryRepository {
    async fn list_labels(&self) -> Result<Vec<String>, RepositoryError> {
        let labels = sqlx::query_scalar::<_, String>(
            "SELECT label FROM default_categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(labels)
    }

    async fn replace_all(&self, labels: &[String]) -> Result<Vec<String>, RepositoryError> {
        // Delete-all then insert runs inside one transaction so a crash cannot
        // leave the template half-written.
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        sqlx::query("DELETE FROM default_categories")
            .execute(&mut *tx)
            .await?;

        let stored = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO default_categories (label)
            SELECT label FROM UNNEST($1::varchar[]) AS label
            RETURNING label
            "#,
        )
        .bind(labels)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(stored)
    }
}
