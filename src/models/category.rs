use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::transaction::Transaction;
use crate::validation::validate_default_labels;

/// Sentinel id of the synthetic "Other" category
pub const OTHER_CATEGORY_ID: i64 = 0;

/// Label of the synthetic "Other" category
pub const OTHER_CATEGORY_LABEL: &str = "Other";

/// Category entity as persisted: a labelled bucket owned by exactly one user
///
/// The synthetic "Other" category is never stored as a row; see [`CategoryView`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub label: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
}

/// Category as presented at the API boundary, with its transactions attached
///
/// Both persisted categories and the per-user synthesized "Other" category
/// (id 0, holding every transaction without a category reference) project to
/// this shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: i64,
    pub label: String,
    pub transactions: Vec<Transaction>,
}

impl CategoryView {
    /// The synthesized "Other" category holding a user's uncategorized transactions
    pub fn other(transactions: Vec<Transaction>) -> Self {
        Self {
            id: OTHER_CATEGORY_ID,
            label: OTHER_CATEGORY_LABEL.to_string(),
            transactions,
        }
    }

    /// Whether this view is the synthetic "Other" category
    pub fn is_other(&self) -> bool {
        self.id == OTHER_CATEGORY_ID
    }
}

/// Request payload for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "label": "Groceries" }))]
pub struct CreateCategoryRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "label length must be between 1 and 100 characters"
    ))]
    pub label: String,
}

/// Request payload for renaming a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "label length must be between 1 and 100 characters"
    ))]
    pub label: Option<String>,
}

/// Request payload for replacing the default-category template (admin only)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "categories": ["Food", "Transport", "Entertainment"] }))]
pub struct UpdateDefaultCategoriesRequest {
    #[validate(custom(function = "validate_default_labels"))]
    pub categories: Vec<String>,
}
