use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// MessageBody
///
/// The JSON body of every error response: `{"message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct MessageBody {
    pub message: String,
}

/// AppError
///
/// Every failure a handler or guard can produce.
///
/// Auth gate failures and unparseable requests keep their 4xx status.
/// Everything else collapses into an opaque 500 and is logged; nothing is retried.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, expired or badly signed bearer token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated, but the role or self check failed. Carries the client-facing message.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// A body or query string the extractor could not parse. Keeps the extractor's status.
    #[error("invalid request ({status}): {detail}")]
    InvalidRequest { status: StatusCode, detail: String },

    /// A path identifier that is not a valid ObjectId.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("store failure: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("token signing failed: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Maps the error to its HTTP status.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidRequest { status, .. } => *status,
            Self::MalformedIdentifier(_) | Self::Store(_) | Self::TokenSigning(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but never described to the client.
        let message = match &self {
            Self::Unauthenticated => "Unauthorized Access".to_string(),
            Self::Forbidden(message) => (*message).to_string(),
            Self::InvalidRequest { status, .. } => {
                tracing::debug!(error = %self, "rejected request");
                status.canonical_reason().unwrap_or("Bad Request").to_string()
            }
            _ => {
                tracing::error!(error = %self, "request failed");
                "Internal Server Error".to_string()
            }
        };

        (status, Json(MessageBody { message })).into_response()
    }
}
