use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{api::followiz::ProviderError, store::StoreError};

/// Errors surfaced by the HTTP handlers. Every variant ends the request.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Order not found")]
    NotFound,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Provider(ProviderError::MissingApiKey) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            AppError::Validation(message) => (message.clone(), None),
            AppError::NotFound => (self.to_string(), None),
            AppError::Provider(err) => match err {
                ProviderError::MissingApiKey => (err.to_string(), None),
                ProviderError::Unreachable(source) => {
                    ("Failed to contact provider".to_string(), Some(source.to_string()))
                }
                ProviderError::BadResponse(reason) => {
                    ("Provider returned non-JSON".to_string(), Some(reason.clone()))
                }
                ProviderError::Rejected(reason) => {
                    ("Provider rejected the order".to_string(), Some(reason.clone()))
                }
            },
            AppError::Store(err) => ("Storage error".to_string(), Some(err.to_string())),
            AppError::Other(err) => ("Internal server error".to_string(), Some(format!("{err:#}"))),
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
