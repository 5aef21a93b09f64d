use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::handlers::{validate_request, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::category::{
    CategoryView, CreateCategoryRequest, UpdateCategoryRequest, UpdateDefaultCategoriesRequest,
};
use crate::services::category_service::CategoryError;
use crate::state::AppState;

/// Convert CategoryError to HTTP response
impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            CategoryError::LabelTaken => (
                StatusCode::CONFLICT,
                "label_taken",
                "Category with this label already exists",
            ),
            CategoryError::CategoryNotFound => (
                StatusCode::NOT_FOUND,
                "category_not_found",
                "Category not found",
            ),
            CategoryError::OtherImmutable => (
                StatusCode::BAD_REQUEST,
                "other_immutable",
                "The Other category cannot be renamed or deleted",
            ),
            CategoryError::AdminOwned => (
                StatusCode::FORBIDDEN,
                "admin_owned",
                "Not allowed to modify another Administrator's category",
            ),
            CategoryError::DatabaseError(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                msg.as_str(),
            ),
        };

        let error_response = ErrorResponse::new(error_type, message);
        (status, Json(error_response)).into_response()
    }
}

/// Handler for listing the current user's categories
///
/// The synthetic "Other" category is always appended last.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories of the current user", body = Vec<CategoryView>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<CategoryView>>, Response> {
    match state
        .category_service
        .get_user_categories(&auth_user.user)
        .await
    {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single category by id
///
/// Id 0 resolves to the current user's "Other" category. A missing category
/// yields `null`, not an error.
#[utoipa::path(
    get,
    path = "/api/categories/{category_id}",
    params(("category_id" = i64, Path, description = "Category id, 0 for Other")),
    responses(
        (status = 200, description = "Category, or null when not visible", body = Option<CategoryView>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn get_category_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(category_id): Path<i64>,
) -> Result<Json<Option<CategoryView>>, Response> {
    match state
        .category_service
        .get_category(category_id, &auth_user.user)
        .await
    {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a category for the current user
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryView),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Label already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryView>), Response> {
    validate_request(&request)?;

    match state
        .category_service
        .create_category(&auth_user.user, request)
        .await
    {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for renaming a category
#[utoipa::path(
    patch,
    path = "/api/categories/{category_id}",
    params(("category_id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryView),
        (status = 400, description = "The Other category cannot be renamed", body = ErrorResponse),
        (status = 403, description = "Category belongs to another Administrator", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Label already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(category_id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryView>, Response> {
    validate_request(&request)?;

    match state
        .category_service
        .update_category(category_id, request, &auth_user.user)
        .await
    {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a category
///
/// The category's transactions are reclassified into the owner's "Other"
/// category.
#[utoipa::path(
    delete,
    path = "/api/categories/{category_id}",
    params(("category_id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "The Other category cannot be deleted", body = ErrorResponse),
        (status = 403, description = "Category belongs to another Administrator", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, Response> {
    match state
        .category_service
        .delete_category(category_id, &auth_user.user)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for replacing the default-category template (Administrators only)
#[utoipa::path(
    put,
    path = "/api/categories/default",
    request_body = UpdateDefaultCategoriesRequest,
    responses(
        (status = 200, description = "New template label list"),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_default_categories_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateDefaultCategoriesRequest>,
) -> Result<Json<Value>, Response> {
    validate_request(&request)?;

    match state
        .category_service
        .update_default_categories(request.categories)
        .await
    {
        Ok(categories) => Ok(Json(json!({ "categories": categories }))),
        Err(e) => Err(e.into_response()),
    }
}
