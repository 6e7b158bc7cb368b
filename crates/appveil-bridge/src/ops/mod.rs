//! Read-only diagnostics endpoints.
//!
//! - `/healthz`     : liveness
//! - `/v1/status`   : bridge state, protection flag, counts
//! - `/v1/snapshot` : full policy export
//! - `/v1/linked`   : linked-apps export

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use appveil_core::error::{AppVeilError, Result};
use appveil_core::protocol::PROTOCOL_VERSION;

use crate::app_state::AppState;
use crate::policy::PolicySummary;
use crate::sync::BridgeStatus;

#[derive(Debug, Serialize)]
struct StatusBody {
    contract_version: u32,
    bridge: BridgeStatus,
    protection_active: bool,
    summary: PolicySummary,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn status(State(state): State<AppState>) -> Response {
    let bridge = state.bridge();
    let body = StatusBody {
        contract_version: PROTOCOL_VERSION,
        bridge: bridge.status(),
        protection_active: bridge.is_protection_active(),
        summary: state.store().summary(),
    };
    json_response(
        serde_json::to_string(&body)
            .map_err(|e| AppVeilError::Internal(format!("status encode: {e}"))),
    )
}

pub async fn snapshot(State(state): State<AppState>) -> Response {
    json_response(state.store().export_json())
}

pub async fn linked(State(state): State<AppState>) -> Response {
    json_response(state.store().export_linked_json())
}

fn json_response(body: Result<String>) -> Response {
    match body {
        Ok(b) => (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], b).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "diagnostics export failed");
            let b = format!(r#"{{"code":"{}"}}"#, e.code().as_str());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                b,
            )
                .into_response()
        }
    }
}
