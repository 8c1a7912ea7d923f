//! HTTP mapping of session errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;
use zephyr_domain::ZephyrError;

/// Errors surfaced by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// No stored session, or one that cannot be used for this request.
    #[error("No usable session")]
    NoSession,

    /// Failure in the OAuth session; may restart the login.
    #[error(transparent)]
    Session(#[from] ZephyrError),

    /// Failure talking to the analytics service; never restarts the login.
    #[error("Analytics error: {0}")]
    Analytics(ZephyrError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::NoSession => Redirect::to("/").into_response(),
            Self::Session(err) if err.restarts_login() => {
                tracing::warn!(error = %err, label = err.label(), "Restarting authorization");
                Redirect::to("/").into_response()
            }
            Self::Session(err) | Self::Analytics(err) => error_response(&err),
        }
    }
}

fn error_response(err: &ZephyrError) -> Response {
    let status = match err {
        ZephyrError::InsecureTransport(_) | ZephyrError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ZephyrError::Network(_) | ZephyrError::Deserialization(_) => StatusCode::BAD_GATEWAY,
        ZephyrError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, label = err.label(), "Request failed");
    } else {
        tracing::warn!(error = %err, label = err.label(), "Request rejected");
    }

    (status, Json(json!({ "error": err.label(), "message": err.to_string() }))).into_response()
}
