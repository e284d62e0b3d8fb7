use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hostping_service::{ConfigError, SchedulerError, StorageError, config};
use serde::Serialize;
use thiserror::Error;

/// Fatal startup errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("settings: {0}")]
    Settings(#[from] config::Error),
    #[error("probe configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("result store: {0:#}")]
    Store(anyhow::Error),
    #[error("autostart: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Errors returned by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), field: None }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Config(ConfigError::Read { .. } | ConfigError::Write { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Config(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Scheduler(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let field = match self {
            ApiError::Config(err) => err.field(),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorBody { error: self.to_string(), field })
    }
}
