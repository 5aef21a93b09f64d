use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Transaction entity: a single dated amount recorded against a category
///
/// `category_id` is NULL for transactions that belong to the synthetic "Other"
/// category. The amount's sign is preserved exactly as the caller supplied it;
/// no income/expense polarity is inferred.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub label: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub category_id: Option<i64>,
}

/// Request payload for recording a transaction
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "label": "Weekly shop",
    "date": "2024-01-15",
    "amount": -42.5,
    "category_label": "Groceries"
}))]
pub struct CreateTransactionRequest {
    #[validate(length(
        min = 2,
        max = 50,
        message = "label length must be between 2 and 50 characters"
    ))]
    pub label: String,

    #[schema(format = "date", example = "2024-01-15")]
    pub date: NaiveDate,

    pub amount: f64,

    pub category_label: String,
}

/// Request payload for updating a transaction
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTransactionRequest {
    #[validate(length(
        min = 2,
        max = 50,
        message = "label length must be between 2 and 50 characters"
    ))]
    pub label: Option<String>,

    #[schema(format = "date", example = "2024-01-16")]
    pub date: Option<NaiveDate>,

    pub amount: Option<f64>,

    pub category_label: Option<String>,
}
