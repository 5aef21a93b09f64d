use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use finance_tracker::config::Config;
use finance_tracker::handlers::ErrorResponse;
use finance_tracker::models::auth::{AuthResponse, LoginRequest, TokenPair, UpdatePasswordRequest};
use finance_tracker::models::category::{
    Category, CategoryView, CreateCategoryRequest, UpdateCategoryRequest,
    UpdateDefaultCategoriesRequest,
};
use finance_tracker::models::transaction::{
    CreateTransactionRequest, Transaction, UpdateTransactionRequest,
};
use finance_tracker::models::user::{
    CreateUserRequest, DeleteUserRequest, UpdateUserRequest, User, UserRole,
};
use finance_tracker::repositories::category_repository::PostgresCategoryRepository;
use finance_tracker::repositories::default_category_repository::PostgresDefaultCategoryRepository;
use finance_tracker::repositories::transaction_repository::PostgresTransactionRepository;
use finance_tracker::repositories::user_repository::PostgresUserRepository;
use finance_tracker::routes::api_router;
use finance_tracker::services::auth_service::{AuthService, AuthServiceImpl};
use finance_tracker::services::category_service::{CategoryService, CategoryServiceImpl};
use finance_tracker::services::transaction_service::{TransactionService, TransactionServiceImpl};
use finance_tracker::services::user_service::{UserService, UserServiceImpl};
use finance_tracker::state::AppState;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        finance_tracker::handlers::auth_handlers::register_handler,
        finance_tracker::handlers::auth_handlers::login_handler,
        finance_tracker::handlers::auth_handlers::refresh_handler,
        finance_tracker::handlers::auth_handlers::update_password_handler,
        finance_tracker::handlers::auth_handlers::logout_handler,
        finance_tracker::handlers::category_handlers::list_categories_handler,
        finance_tracker::handlers::category_handlers::get_category_handler,
        finance_tracker::handlers::category_handlers::create_category_handler,
        finance_tracker::handlers::category_handlers::update_category_handler,
        finance_tracker::handlers::category_handlers::delete_category_handler,
        finance_tracker::handlers::category_handlers::update_default_categories_handler,
        finance_tracker::handlers::transaction_handlers::list_all_transactions_handler,
        finance_tracker::handlers::transaction_handlers::list_transactions_handler,
        finance_tracker::handlers::transaction_handlers::list_other_transactions_handler,
        finance_tracker::handlers::transaction_handlers::get_transaction_handler,
        finance_tracker::handlers::transaction_handlers::create_transaction_handler,
        finance_tracker::handlers::transaction_handlers::update_transaction_handler,
        finance_tracker::handlers::transaction_handlers::delete_transaction_handler,
        finance_tracker::handlers::user_handlers::list_users_handler,
        finance_tracker::handlers::user_handlers::current_user_handler,
        finance_tracker::handlers::user_handlers::get_user_handler,
        finance_tracker::handlers::user_handlers::update_current_user_handler,
        finance_tracker::handlers::user_handlers::update_user_handler,
        finance_tracker::handlers::user_handlers::delete_current_user_handler,
        finance_tracker::handlers::user_handlers::delete_user_handler,
    ),
    components(schemas(
        User,
        UserRole,
        CreateUserRequest,
        UpdateUserRequest,
        DeleteUserRequest,
        LoginRequest,
        TokenPair,
        AuthResponse,
        UpdatePasswordRequest,
        Category,
        CategoryView,
        CreateCategoryRequest,
        UpdateCategoryRequest,
        UpdateDefaultCategoriesRequest,
        Transaction,
        CreateTransactionRequest,
        UpdateTransactionRequest,
        ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and session management"),
        (name = "categories", description = "Spending category management"),
        (name = "transactions", description = "Transaction management"),
        (name = "users", description = "User account management")
    ),
    info(
        title = "Finance Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal income and expenses",
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finance_tracker=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("migrations completed");

    // Repositories
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let transaction_repository = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let default_category_repository =
        Arc::new(PostgresDefaultCategoryRepository::new(pool.clone()));

    // Services
    let category_service: Arc<dyn CategoryService> = Arc::new(CategoryServiceImpl::new(
        category_repository,
        transaction_repository.clone(),
        default_category_repository,
    ));
    let transaction_service: Arc<dyn TransactionService> = Arc::new(TransactionServiceImpl::new(
        transaction_repository,
        category_service.clone(),
    ));
    let user_service: Arc<dyn UserService> = Arc::new(UserServiceImpl::new(
        user_repository,
        category_service.clone(),
    ));
    let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
        user_service.clone(),
        config.access_token_secret.clone(),
        config.refresh_token_secret.clone(),
        Duration::minutes(config.access_token_expires_minutes),
        Duration::days(config.refresh_token_expires_days),
    ));

    let state = AppState {
        auth_service,
        user_service,
        category_service,
        transaction_service,
    };

    let app = api_router(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("server running on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
