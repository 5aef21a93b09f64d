use std::sync::Arc;

use crate::services::auth_service::AuthService;
use crate::services::category_service::CategoryService;
use crate::services::transaction_service::TransactionService;
use crate::services::user_service::UserService;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub category_service: Arc<dyn CategoryService>,
    pub transaction_service: Arc<dyn TransactionService>,
}
