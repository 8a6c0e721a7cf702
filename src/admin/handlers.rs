use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::AdminState;
use crate::state::StatusReport;

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub version: &'static str,
    /// `degraded` while a system error is set.
    pub status: &'static str,
    pub system_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckAccepted {
    pub status: &'static str,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<AdminStatus> {
    let system_error = state.system.error();
    Json(AdminStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if system_error.is_some() { "degraded" } else { "operational" },
        system_error,
    })
}

pub async fn get_services(
    State(state): State<AdminState>,
) -> Result<Json<StatusReport>, (StatusCode, String)> {
    let services = state.store.all_states_async().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read service states");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(StatusReport {
        system_error: state.system.error(),
        services,
    }))
}

pub async fn trigger_check(State(state): State<AdminState>) -> (StatusCode, Json<CheckAccepted>) {
    state.trigger.fire();
    (StatusCode::ACCEPTED, Json(CheckAccepted { status: "triggered" }))
}
