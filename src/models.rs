pub mod auth;
pub mod category;
pub mod transaction;
pub mod user;

pub use auth::{AuthResponse, LoginRequest, TokenPair, UpdatePasswordRequest};
pub use category::{
    Category, CategoryView, CreateCategoryRequest, UpdateCategoryRequest,
    UpdateDefaultCategoriesRequest, OTHER_CATEGORY_ID, OTHER_CATEGORY_LABEL,
};
pub use transaction::{CreateTransactionRequest, Transaction, UpdateTransactionRequest};
pub use user::{CreateUserRequest, DeleteUserRequest, UpdateUserRequest, User, UserRole};
