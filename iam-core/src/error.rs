use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the IAM core. Each variant carries its own mapping to
/// an HTTP status and a client-safe message; internal detail never crosses
/// the `IntoResponse` boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Too many requests")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Account locked until {locked_until}")]
    AccountLocked { locked_until: chrono::DateTime<chrono::Utc> },

    #[error("MFA required")]
    MfaRequired,

    #[error("Infrastructure error: {0}")]
    Infrastructure(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found() -> Self {
        AppError::NotFound
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    /// Whether a caller may safely retry this error after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Infrastructure(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Infrastructure(anyhow::Error::new(err))
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Infrastructure(anyhow::Error::new(err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.constraint().unwrap_or("unique constraint").to_string())
            }
            other => AppError::Infrastructure(anyhow::Error::new(other)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

#[derive(Serialize)]
struct Envelope {
    success: bool,
    data: Option<()>,
    error: ErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(ref err) = self {
            tracing::error!(error = ?err, "internal error");
        }

        let (status, message, retry_after) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::ValidationErrors(err) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), None)
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string(), None),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests".to_string(),
                *retry_after_secs,
            ),
            AppError::AccountLocked { locked_until } => (
                StatusCode::FORBIDDEN,
                format!("account locked until {locked_until}"),
                None,
            ),
            AppError::MfaRequired => (
                StatusCode::FORBIDDEN,
                "multi-factor verification required".to_string(),
                None,
            ),
            AppError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "temporarily unavailable".to_string(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
                None,
            ),
        };

        let body = Envelope {
            success: false,
            data: None,
            error: ErrorBody {
                code: status.as_u16(),
                message,
            },
        };

        let mut res = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(val) = secs.to_string().parse() {
                res.headers_mut().insert(axum::http::header::RETRY_AFTER, val);
            }
        }
        res
    }
}
