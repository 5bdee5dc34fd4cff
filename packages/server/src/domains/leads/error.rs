//! Error taxonomy for the lead discovery surface.
//!
//! Only job-setup and persistence errors are fatal to a request. Per-pair
//! search failures and per-path crawl failures are absorbed inside the
//! pipeline and never reach this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::common::auth::AuthError;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("{0}")]
    Validation(String),

    #[error("Please wait one minute between job runs")]
    RateLimited,

    #[error("Search API is not configured")]
    SearchNotConfigured,

    /// Covers both "no such job" and "not your job" so the endpoint does not
    /// leak which job ids exist.
    #[error("Job not found")]
    NotFound,

    #[error("Job is not completed yet")]
    NotReady,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl LeadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LeadError::Validation(_) => StatusCode::BAD_REQUEST,
            LeadError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            LeadError::SearchNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            LeadError::NotFound => StatusCode::NOT_FOUND,
            LeadError::NotReady => StatusCode::CONFLICT,
            LeadError::Auth(AuthError::AuthenticationRequired)
            | LeadError::Auth(AuthError::InvalidToken) => StatusCode::UNAUTHORIZED,
            LeadError::Auth(AuthError::AdminRequired)
            | LeadError::Auth(AuthError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            LeadError::Auth(AuthError::InternalError(_)) | LeadError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
