use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::transaction::Transaction;
use crate::models::user::User;
use crate::repositories::RepositoryError;
use crate::scope::Scope;

/// Trait defining transaction repository operations
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert a new transaction; `category_id` of None means "Other"
    async fn create(
        &self,
        user_id: i64,
        label: &str,
        date: NaiveDate,
        amount: f64,
        category_id: Option<i64>,
    ) -> Result<Transaction, RepositoryError>;

    /// Find a transaction by id within the given visibility scope
    async fn find_by_id(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<Transaction>, RepositoryError>;

    /// Find a transaction by id together with its owning user
    async fn find_by_id_with_owner(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<(Transaction, User)>, RepositoryError>;

    /// All transactions owned by `user_id`
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Transaction>, RepositoryError>;

    /// All transactions of `user_id` with no category reference
    async fn find_uncategorized(&self, user_id: i64)
        -> Result<Vec<Transaction>, RepositoryError>;

    /// All transactions assigned to a persisted category
    async fn find_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    /// All transactions across all users
    async fn find_all(&self) -> Result<Vec<Transaction>, RepositoryError>;

    /// Persist a modified transaction
    async fn save(&self, transaction: &Transaction) -> Result<Transaction, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

fn scope_params(scope: Scope) -> (bool, i64) {
    match scope {
        Scope::SelfOnly(user_id) => (true, user_id),
        Scope::Unrestricted => (false, 0),
    }
}

/// PostgreSQL implementation of TransactionRepository
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(
        &self,
        user_id: i64,
        label: &str,
        date: NaiveDate,
        amount: f64,
        category_id: Option<i64>,
    ) -> Result<Transaction, RepositoryError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (label, date, amount, user_id, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, label, date, amount, user_id, category_id
            "#,
        )
        .bind(label)
        .bind(date)
        .bind(amount)
        .bind(user_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_by_id(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let (scoped, user_id) = scope_params(scope);
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, label, date, amount, user_id, category_id
            FROM transactions
            WHERE id = $1 AND (NOT $2 OR user_id = $3)
            "#,
        )
        .bind(id)
        .bind(scoped)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_by_id_with_owner(
        &self,
        scope: Scope,
        id: i64,
    ) -> Result<Option<(Transaction, User)>, RepositoryError> {
        let (scoped, user_id) = scope_params(scope);
        let row = sqlx::query_as::<_, TransactionWithOwnerRow>(
            r#"
            SELECT t.id, t.label, t.date, t.amount, t.user_id, t.category_id,
                   u.id AS owner_id, u.username, u.display_name, u.role,
                   u.password_hash, u.refresh_token, u.logout_timestamp
            FROM transactions t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = $1 AND (NOT $2 OR t.user_id = $3)
            "#,
        )
        .bind(id)
        .bind(scoped)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TransactionWithOwnerRow::split))
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, label, date, amount, user_id, category_id
            FROM transactions
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn find_uncategorized(
        &self,
        user_id: i64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, label, date, amount, user_id, category_id
            FROM transactions
            WHERE user_id = $1 AND category_id IS NULL
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn find_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, label, date, amount, user_id, category_id
            FROM transactions
            WHERE category_id = $1
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn find_all(&self) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, label, date, amount, user_id, category_id
            FROM transactions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn save(&self, transaction: &Transaction) -> Result<Transaction, RepositoryError> {
        let saved = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET label = $2, date = $3, amount = $4, category_id = $5
            WHERE id = $1
            RETURNING id, label, date, amount, user_id, category_id
            "#,
        )
        .bind(transaction.id)
        .bind(&transaction.label)
        .bind(transaction.date)
        .bind(transaction.amount)
        .bind(transaction.category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
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
struct TransactionWithOwnerRow {
    id: i64,
    label: String,
    date: NaiveDate,
    amount: f64,
    user_id: i64,
    category_id: Option<i64>,
    owner_id: i64,
    username: String,
    display_name: String,
    role: crate::models::user::UserRole,
    password_hash: String,
    refresh_token: Option<String>,
    logout_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl TransactionWithOwnerRow {
    fn split(self) -> (Transaction, User) {
        (
            Transaction {
                id: self.id,
                label: self.label,
                date: self.date,
                amount: self.amount,
                user_id: self.user_id,
                category_id: self.category_id,
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
