use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::handlers::{validate_request, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::transaction::{CreateTransactionRequest, Transaction, UpdateTransactionRequest};
use crate::services::transaction_service::TransactionError;
use crate::state::AppState;

/// Convert TransactionError to HTTP response
impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            TransactionError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                "Transaction not found",
            ),
            TransactionError::CategoryNotFound => (
                StatusCode::NOT_FOUND,
                "category_not_found",
                "Category not found",
            ),
            TransactionError::AdminOwned => (
                StatusCode::FORBIDDEN,
                "admin_owned",
                "Not allowed to modify another Administrator's transaction",
            ),
            TransactionError::DatabaseError(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                msg.as_str(),
            ),
        };

        let error_response = ErrorResponse::new(error_type, message);
        (status, Json(error_response)).into_response()
    }
}

/// Handler for listing every transaction in the system (Administrators only)
#[utoipa::path(
    get,
    path = "/api/transactions/all",
    responses(
        (status = 200, description = "All transactions", body = Vec<Transaction>),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn list_all_transactions_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, Response> {
    match state.transaction_service.get_all_transactions().await {
        Ok(transactions) => Ok(Json(transactions)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for listing the current user's transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    responses(
        (status = 200, description = "Transactions of the current user", body = Vec<Transaction>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Transaction>>, Response> {
    match state
        .transaction_service
        .get_user_transactions(&auth_user.user)
        .await
    {
        Ok(transactions) => Ok(Json(transactions)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for listing the current user's uncategorized transactions
///
/// These are the transactions that make up the synthetic "Other" category.
#[utoipa::path(
    get,
    path = "/api/transactions/other",
    responses(
        (status = 200, description = "Uncategorized transactions of the current user", body = Vec<Transaction>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn list_other_transactions_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Transaction>>, Response> {
    match state
        .transaction_service
        .get_user_other_category_transactions(&auth_user.user)
        .await
    {
        Ok(transactions) => Ok(Json(transactions)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single transaction by id
///
/// A missing transaction yields `null`, not an error.
#[utoipa::path(
    get,
    path = "/api/transactions/{transaction_id}",
    params(("transaction_id" = i64, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction, or null when not visible", body = Option<Transaction>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn get_transaction_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<Option<Transaction>>, Response> {
    match state
        .transaction_service
        .get_transaction(transaction_id, &auth_user.user)
        .await
    {
        Ok(transaction) => Ok(Json(transaction)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for recording a transaction for the current user
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created", body = Transaction),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn create_transaction_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), Response> {
    validate_request(&request)?;

    match state
        .transaction_service
        .create_transaction(&auth_user.user, request)
        .await
    {
        Ok(transaction) => Ok((StatusCode::CREATED, Json(transaction))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a transaction
#[utoipa::path(
    patch,
    path = "/api/transactions/{transaction_id}",
    params(("transaction_id" = i64, Path, description = "Transaction id")),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated", body = Transaction),
        (status = 403, description = "Transaction belongs to another Administrator", body = ErrorResponse),
        (status = 404, description = "Transaction or category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn update_transaction_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<i64>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, Response> {
    validate_request(&request)?;

    match state
        .transaction_service
        .update_transaction(transaction_id, request, &auth_user.user)
        .await
    {
        Ok(transaction) => Ok(Json(transaction)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a transaction
#[utoipa::path(
    delete,
    path = "/api/transactions/{transaction_id}",
    params(("transaction_id" = i64, Path, description = "Transaction id")),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 403, description = "Transaction belongs to another Administrator", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn delete_transaction_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<i64>,
) -> Result<StatusCode, Response> {
    match state
        .transaction_service
        .delete_transaction(transaction_id, &auth_user.user)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
