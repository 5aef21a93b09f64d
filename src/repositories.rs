pub mod category_repository;
pub mod default_category_repository;
pub mod transaction_repository;
pub mod user_repository;

/// Repository errors for database operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db_err.to_string())
            }
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}
