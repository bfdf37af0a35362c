//! HTTP handlers.
//!
//! Bodies are taken as raw bytes so that malformed JSON or a missing
//! content type still reaches the protocol layer as an empty request.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use biff_protocol::{ConfigurationRequest, EnrollRequest};

use crate::ApiState;

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ErrorBody {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

/// POST /enroll
pub async fn enroll(State(state): State<ApiState>, body: Bytes) -> Response {
    let request = EnrollRequest::from_body(&body);
    match state.enrollment.enroll(request) {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            error!(error = %e, "enroll failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /configuration
pub async fn configuration(State(state): State<ApiState>, body: Bytes) -> Response {
    let request = ConfigurationRequest::from_body(&body);
    match state.configuration.get_configuration(request) {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            error!(error = %e, "configuration fetch failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
