//! HTTP error responses.
//!
//! Every failure is rendered as `{"success": false, "error": "...", "code": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkgate_node::NodeError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("access denied")]
    AccessDenied,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl RpcError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Node(e) => e.code(),
            Self::AccessDenied => "ACCESS_DENIED",
            Self::InvalidRequest(_) => "BAD_REQUEST",
            Self::Server(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for_code(self.code())
    }

    fn user_message(&self) -> String {
        match self {
            Self::Node(e) => e.user_message(),
            Self::AccessDenied => "Access denied".into(),
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Server(_) => "Internal server error".into(),
        }
    }
}

/// HTTP status for an error code.
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "LINK_NOT_FOUND" | "OWNER_NOT_FOUND" | "EXPIRED_OR_INVALID" => StatusCode::NOT_FOUND,
        "ALREADY_USED" => StatusCode::GONE,
        "OWNER_EXPIRED" | "OWNER_KEY_MISSING" | "CAPTCHA_FAILED" | "FINGERPRINT_MISMATCH"
        | "TOO_FAST" | "INVALID_REFERER" | "BROWSER_MISMATCH" | "ACCESS_DENIED" => {
            StatusCode::FORBIDDEN
        }
        "SLUG_TAKEN" => StatusCode::CONFLICT,
        "BAD_REQUEST" | "INVALID_LINK" => StatusCode::BAD_REQUEST,
        "SHORTENER_ERROR" => StatusCode::BAD_GATEWAY,
        "SHORTENER_TIMEOUT" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "request failed: {self}");
        }
        let body = ErrorBody {
            success: false,
            error: self.user_message(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
