//! Probe endpoints
//!
//! - `/home` - Regular traffic, gated on readiness
//! - `/readyz` - Readiness probe, optionally budgeted
//! - `/livez` - Liveness probe, optionally budgeted
//! - `/crash` - Answers like `/home`, then terminates the process
//!
//! Every handler sleeps for the configured response delay before it looks
//! at probe state. All endpoints accept any method.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::shutdown::{Termination, TerminationController, TerminationSignal};
use crate::probe::{Clock, ProbeKind, ProbeOutcome, ProbeState};

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    probes: ProbeState,
    clock: Arc<dyn Clock>,
    response_delay: Duration,
    termination: TerminationController,
}

impl AppState {
    /// Create new handler state
    pub fn new(
        probes: ProbeState,
        clock: Arc<dyn Clock>,
        response_delay: Duration,
        termination: TerminationController,
    ) -> Self {
        Self {
            probes,
            clock,
            response_delay,
            termination,
        }
    }

    async fn delay_response(&self) {
        if !self.response_delay.is_zero() {
            self.clock.sleep(self.response_delay).await;
        }
    }
}

fn processed(path: &str) -> Response {
    (StatusCode::OK, format!("{} request processed", path)).into_response()
}

fn unavailable() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

/// Response gated on the readiness flag alone, never on budget
fn readiness_gated(state: &AppState, path: &str) -> Response {
    if state.probes.is_ready() {
        info!(path, "Request when ready");
        processed(path)
    } else {
        info!(path, "Request when not ready");
        unavailable()
    }
}

/// Response for a probe endpoint; consumes budget when one is configured
fn probe_response(state: &AppState, kind: ProbeKind) -> Response {
    let path = match kind {
        ProbeKind::Liveness => "/livez",
        ProbeKind::Readiness => "/readyz",
    };

    match state.probes.record(kind) {
        ProbeOutcome::Ok => {
            info!(path, "Request when ready");
            processed(path)
        }
        ProbeOutcome::NotReady => {
            info!(path, "Request when not ready");
            unavailable()
        }
        ProbeOutcome::BudgetExceeded => {
            info!(path, "Request after success count exceeded");
            unavailable()
        }
    }
}

async fn home(State(state): State<AppState>) -> Response {
    state.delay_response().await;
    readiness_gated(&state, "/home")
}

async fn readyz(State(state): State<AppState>) -> Response {
    state.delay_response().await;
    probe_response(&state, ProbeKind::Readiness)
}

async fn livez(State(state): State<AppState>) -> Response {
    state.delay_response().await;
    probe_response(&state, ProbeKind::Liveness)
}

/// Answer like `/home`, then request termination
///
/// The server drains in-flight responses before `main` exits, so this
/// response is flushed on a best-effort basis.
async fn crash(State(state): State<AppState>) -> Response {
    state.delay_response().await;
    let response = readiness_gated(&state, "/crash");
    error!("/crash endpoint received a request, crashing...");
    state.termination.trigger(Termination::Crash);
    response
}

/// Build the router for the probe endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/home", any(home))
        .route("/readyz", any(readyz))
        .route("/livez", any(livez))
        .route("/crash", any(crash))
        .with_state(state)
}

/// Serve the probe endpoints on an already-bound listener
///
/// Returns once `signal` fires and in-flight requests have drained.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut signal: TerminationSignal,
) -> Result<(), std::io::Error> {
    let app = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "The service is listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.wait().await;
        })
        .await
}
