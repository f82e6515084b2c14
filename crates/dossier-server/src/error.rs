//! Server error types and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dossier_common::DossierError;
use serde_json::json;
use thiserror::Error;

use crate::api::ErrorResponse;

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Dossier(#[from] DossierError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Dossier(err) => match err {
                DossierError::StageViolation { .. } => StatusCode::CONFLICT,
                DossierError::WorkflowNotFound(_)
                | DossierError::StepNotFound { .. }
                | DossierError::MethodNotFound { .. } => StatusCode::NOT_FOUND,
                err if err.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let response = match self {
            AppError::Dossier(DossierError::StageViolation {
                workflow,
                current,
                required,
                operation,
            }) => {
                let message = format!(
                    "Workflow '{workflow}' is in {current}, but '{operation}' requires {required}"
                );
                ErrorResponse::with_details(
                    "STAGE_VIOLATION",
                    message,
                    json!({
                        "workflow": workflow,
                        "current": current,
                        "required": required,
                        "operation": operation,
                    }),
                )
            },
            AppError::Dossier(err) if status.is_server_error() => {
                tracing::error!(error = %err, "Request failed");
                ErrorResponse::new(err.code(), "An internal error occurred")
            },
            AppError::Dossier(err) => ErrorResponse::new(err.code(), err.to_string()),
            AppError::BadRequest(msg) => ErrorResponse::new("BAD_REQUEST", msg),
        };

        (status, Json(response)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Alias for Result with AppError
pub type ApiResult<T> = Result<T, AppError>;
