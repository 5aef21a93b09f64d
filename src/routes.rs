use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers::auth_handlers::{
    login_handler, logout_handler, refresh_handler, register_handler, update_password_handler,
};
use crate::handlers::category_handlers::{
    create_category_handler, delete_category_handler, get_category_handler,
    list_categories_handler, update_category_handler, update_default_categories_handler,
};
use crate::handlers::transaction_handlers::{
    create_transaction_handler, delete_transaction_handler, get_transaction_handler,
    list_all_transactions_handler, list_other_transactions_handler, list_transactions_handler,
    update_transaction_handler,
};
use crate::handlers::user_handlers::{
    current_user_handler, delete_current_user_handler, delete_user_handler, get_user_handler,
    list_users_handler, update_current_user_handler, update_user_handler,
};
use crate::middleware::auth_middleware::{auth_middleware, require_admin};
use crate::state::AppState;

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the API router over the given application state
pub fn api_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", get(refresh_handler));

    let admin = Router::new()
        .route(
            "/api/categories/default",
            put(update_default_categories_handler),
        )
        .route("/api/transactions/all", get(list_all_transactions_handler))
        .route("/api/users/all", get(list_users_handler))
        .route(
            "/api/users/:user_id",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .route("/api/auth/update-password", patch(update_password_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route(
            "/api/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/api/categories/:category_id",
            get(get_category_handler)
                .patch(update_category_handler)
                .delete(delete_category_handler),
        )
        .route(
            "/api/transactions",
            get(list_transactions_handler).post(create_transaction_handler),
        )
        .route("/api/transactions/other", get(list_other_transactions_handler))
        .route(
            "/api/transactions/:transaction_id",
            get(get_transaction_handler)
                .patch(update_transaction_handler)
                .delete(delete_transaction_handler),
        )
        .route(
            "/api/users",
            get(current_user_handler)
                .patch(update_current_user_handler)
                .delete(delete_current_user_handler),
        )
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(public)
        .merge(protected)
        .with_state(state)
}
