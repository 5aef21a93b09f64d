pub mod auth_service;
pub mod category_service;
pub mod transaction_service;
pub mod user_service;
