//! Admin/status API.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → auth.rs (bearer key check)
//!     → handlers.rs
//!         GET  /admin/status   → SystemStatus
//!         GET  /admin/services → StateStore::all_states + SystemStatus
//!         POST /admin/check    → ManualTrigger::fire
//! ```
//!
//! # Design Decisions
//! - Read-only over the state store; the monitor is the only writer
//! - A manual check is fire-and-forget and answers 202 immediately

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::monitor::ManualTrigger;
use crate::state::{StateStore, SystemStatus};

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: StateStore,
    pub system: Arc<SystemStatus>,
    pub trigger: ManualTrigger,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(store: StateStore, system: Arc<SystemStatus>, trigger: ManualTrigger, api_key: &str) -> Self {
        Self {
            store,
            system,
            trigger,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services", get(get_services))
        .route("/admin/check", post(trigger_check))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Admin API shutting down");
        })
        .await
}
