//! HTTP server for the simulated probe endpoints
//!
//! Provides endpoints for orchestrator probing:
//! - `/home`, `/readyz`, `/livez` - driven by the probe-state machine
//! - `/crash` - intentional process death
//!
//! Also provides termination handling for `/crash`, sentinel failures,
//! and SIGTERM/SIGINT.

mod health;
pub mod shutdown;

pub use health::{build_router, serve, AppState};
pub use shutdown::{
    termination_channel, wait_for_signal, Termination, TerminationController, TerminationSignal,
};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
