use async_trait::async_trait;
use std::sync::Arc;

use crate::models::transaction::{CreateTransactionRequest, Transaction, UpdateTransactionRequest};
use crate::models::user::{User, UserRole};
use crate::repositories::transaction_repository::TransactionRepository;
use crate::repositories::RepositoryError;
use crate::scope::Scope;
use crate::services::category_service::{CategoryError, CategoryService};

/// Transaction service errors
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Not allowed to modify another Administrator's transaction")]
    AdminOwned,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for TransactionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => TransactionError::TransactionNotFound,
            RepositoryError::DatabaseError(msg) => TransactionError::DatabaseError(msg),
            RepositoryError::ConstraintViolation(msg) => TransactionError::DatabaseError(msg),
        }
    }
}

impl From<CategoryError> for TransactionError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::CategoryNotFound => TransactionError::CategoryNotFound,
            CategoryError::DatabaseError(msg) => TransactionError::DatabaseError(msg),
            other => TransactionError::DatabaseError(other.to_string()),
        }
    }
}

/// Trait defining transaction service operations
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Resolve a transaction by id for the given actor. Absence is not an error.
    async fn get_transaction(
        &self,
        id: i64,
        actor: &User,
    ) -> Result<Option<Transaction>, TransactionError>;

    /// All transactions across all users (admin boundary)
    async fn get_all_transactions(&self) -> Result<Vec<Transaction>, TransactionError>;

    /// All of `user`'s transactions
    async fn get_user_transactions(&self, user: &User)
        -> Result<Vec<Transaction>, TransactionError>;

    /// `user`'s transactions with no category reference; backs the synthetic
    /// "Other" category
    async fn get_user_other_category_transactions(
        &self,
        user: &User,
    ) -> Result<Vec<Transaction>, TransactionError>;

    async fn create_transaction(
        &self,
        user: &User,
        request: CreateTransactionRequest,
    ) -> Result<Transaction, TransactionError>;

    async fn update_transaction(
        &self,
        id: i64,
        request: UpdateTransactionRequest,
        actor: &User,
    ) -> Result<Transaction, TransactionError>;

    async fn delete_transaction(&self, id: i64, actor: &User) -> Result<(), TransactionError>;
}

/// Implementation of TransactionService
pub struct TransactionServiceImpl {
    transaction_repository: Arc<dyn TransactionRepository>,
    category_service: Arc<dyn CategoryService>,
}

impl TransactionServiceImpl {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepository>,
        category_service: Arc<dyn CategoryService>,
    ) -> Self {
        Self {
            transaction_repository,
            category_service,
        }
    }

    /// Resolve a transaction for mutation, returning it with its owner
    async fn resolve_for_mutation(
        &self,
        id: i64,
        actor: &User,
    ) -> Result<(Transaction, User), TransactionError> {
        let (transaction, owner) = self
            .transaction_repository
            .find_by_id_with_owner(Scope::of(actor), id)
            .await?
            .ok_or(TransactionError::TransactionNotFound)?;

        if actor.id != owner.id && owner.role == UserRole::Admin {
            return Err(TransactionError::AdminOwned);
        }

        Ok((transaction, owner))
    }

    /// Resolve a category label within `owner`'s categories to a stored
    /// reference: None for the synthetic "Other" category
    async fn resolve_category_reference(
        &self,
        owner: &User,
        label: &str,
    ) -> Result<Option<i64>, TransactionError> {
        let category = self
            .category_service
            .get_user_category_by_label(owner, label)
            .await?
            .ok_or(TransactionError::CategoryNotFound)?;

        if category.is_other() {
            Ok(None)
        } else {
            Ok(Some(category.id))
        }
    }
}

#[async_trait]
impl TransactionService for TransactionServiceImpl {
    async fn get_transaction(
        &self,
        id: i64,
        actor: &User,
    ) -> Result<Option<Transaction>, TransactionError> {
        let transaction = self
            .transaction_repository
            .find_by_id(Scope::of(actor), id)
            .await?;

        Ok(transaction)
    }

    async fn get_all_transactions(&self) -> Result<Vec<Transaction>, TransactionError> {
        Ok(self.transaction_repository.find_all().await?)
    }

    async fn get_user_transactions(
        &self,
        user: &User,
    ) -> Result<Vec<Transaction>, TransactionError> {
        Ok(self.transaction_repository.find_by_user(user.id).await?)
    }

    async fn get_user_other_category_transactions(
        &self,
        user: &User,
    ) -> Result<Vec<Transaction>, TransactionError> {
        Ok(self
            .transaction_repository
            .find_uncategorized(user.id)
            .await?)
    }

    async fn create_transaction(
        &self,
        user: &User,
        request: CreateTransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        let category_id = self
            .resolve_category_reference(user, &request.category_label)
            .await?;

        // The amount is stored with the caller's sign untouched.
        let transaction = self
            .transaction_repository
            .create(
                user.id,
                &request.label,
                request.date,
                request.amount,
                category_id,
            )
            .await?;

        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        id: i64,
        request: UpdateTransactionRequest,
        actor: &User,
    ) -> Result<Transaction, TransactionError> {
        let (transaction, owner) = self.resolve_for_mutation(id, actor).await?;

        // Reassignment happens within the owner's categories, so an admin
        // editing a user's transaction picks from that user's set.
        let category_id = match &request.category_label {
            Some(label) => self.resolve_category_reference(&owner, label).await?,
            None => transaction.category_id,
        };

        let merged = Transaction {
            label: request.label.unwrap_or(transaction.label),
            date: request.date.unwrap_or(transaction.date),
            amount: request.amount.unwrap_or(transaction.amount),
            category_id,
            ..transaction
        };
        let saved = self.transaction_repository.save(&merged).await?;

        Ok(saved)
    }

    async fn delete_transaction(&self, id: i64, actor: &User) -> Result<(), TransactionError> {
        let (transaction, _owner) = self.resolve_for_mutation(id, actor).await?;

        self.transaction_repository.delete(transaction.id).await?;

        Ok(())
    }
}
