use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed or missing required input (message is safe to surface).
    Validation(String),
    /// Wrong HTTP verb on the lead endpoint.
    MethodNotAllowed,
    /// Per-client request quota exceeded.
    RateLimited,
    /// Missing or empty server configuration (operator error, surfaced verbatim).
    Configuration(String),
    /// CRM or email provider returned a non-success response.
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::RateLimited => write!(f, "Rate limited"),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each variant to a status code and a `{ok:false, error}` JSON body.
    /// Upstream detail is only ever logged; the caller gets a generic message.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Método no permitido. Usa POST.".to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Demasiadas solicitudes. Intenta nuevamente en un minuto.".to_string(),
            ),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Upstream(msg) => {
                // Safe log: never includes the token or the full payload.
                tracing::error!("Upstream request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "No se pudo procesar la solicitud en este momento.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "ok": false,
            "error": error_message,
        }));

        (status, [(header::CACHE_CONTROL, "no-store")], body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}
