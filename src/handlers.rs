pub mod auth_handlers;
pub mod category_handlers;
pub mod transaction_handlers;
pub mod user_handlers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Validate a request body, turning field errors into a 400 response
pub fn validate_request<T: Validate>(request: &T) -> Result<(), Response> {
    if let Err(validation_errors) = request.validate() {
        let error_message = validation_errors
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages: Vec<String> = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        let error_response = ErrorResponse::new("validation_error", &error_message);
        return Err((StatusCode::BAD_REQUEST, Json(error_response)).into_response());
    }
    Ok(())
}
