//! Probe-state machine
//!
//! - `state` - shared liveness/readiness flags and success budgets
//! - `timer` - delayed one-shot flag flips
//! - `sentinel` - marker files for external watchers
//! - `clock` - injectable time source

pub mod clock;
pub mod sentinel;
mod state;
mod timer;

pub use clock::{Clock, SystemClock};
pub use sentinel::SentinelError;
pub use state::{ProbeKind, ProbeOutcome, ProbeState};
pub use timer::PhaseTimer;
