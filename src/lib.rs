//! Configurable HTTP health-probe simulator
//!
//! Exposes `/home`, `/readyz`, `/livez` and `/crash` endpoints whose answers
//! change over time, for exercising an orchestrator's liveness and readiness
//! probing (slow startup, probe flapping, crash on demand).

pub mod config;
pub mod probe;
pub mod server;
