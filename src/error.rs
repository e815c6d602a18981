use crate::vault::CryptoError;
use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bot not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: stored credential could not be decrypted")]
    Authentication,

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("HTTPS required")]
    InsecureTransport,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable classification reported to clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Authentication => "authentication_error",
            Self::Crypto(_) => "crypto_error",
            Self::Storage(_) => "storage_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::InsecureTransport => "insecure_transport",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to hand to a client.
    ///
    /// Production deployments only ever see a fixed message per kind, so
    /// storage paths, io errors and the like stay on the server side.
    pub fn public_message(&self, production: bool) -> String {
        if !production {
            return self.to_string();
        }
        match self {
            Self::Validation(_) => "Invalid request",
            Self::NotFound(_) => "Bot not found",
            Self::Authentication => "Authentication failed",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::InsecureTransport => "HTTPS required",
            Self::Config(_) | Self::Crypto(_) | Self::Storage(_) | Self::Internal(_) => {
                "An error occurred"
            }
        }
        .to_string()
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::InsecureTransport => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Detailed error text carried as a response extension.
///
/// Error responses are rendered with the production message. A router
/// layer that knows the deployment mode swaps in this detail outside
/// production and strips it otherwise.
#[derive(Clone, Debug)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

impl ErrorDetail {
    pub fn into_response(self, status: axum::http::StatusCode) -> axum::response::Response {
        error_response(status, self.code, self.message)
    }
}

fn error_response(
    status: axum::http::StatusCode,
    code: &'static str,
    message: String,
) -> axum::response::Response {
    use axum::response::IntoResponse;
    let body = serde_json::json!({
        "success": false,
        "error": message,
        "code": code,
    });
    (status, axum::Json(body)).into_response()
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let mut response =
            error_response(self.status_code(), self.kind(), self.public_message(true));
        response.extensions_mut().insert(ErrorDetail {
            code: self.kind(),
            message: self.public_message(false),
        });
        response
    }
}
