// =============================================================================
// Error taxonomy
// =============================================================================
//
// Three failure classes with three blast radii:
//
//   Feed        — upstream tick source unreachable or dropped. Terminates the
//                 affected session only; the client may resubscribe.
//   Store       — SQLite query/write failure. The current recompute cycle
//                 degrades to a zeroed snapshot; the session loop continues.
//   Computation — malformed pivot or insufficient window data. Resolved via
//                 zero-value defaults inside the stats engine; surfaced only
//                 as request validation on the REST boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("feed error: {0}")]
    Feed(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("computation error: {0}")]
    Computation(String),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Feed(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Computation(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<r2d2::Error> for EngineError {
    fn from(e: r2d2::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for EngineError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Feed(e.to_string())
    }
}
