//! Shared liveness/readiness state
//!
//! Flags are one-shot: they start false and are flipped to true exactly once
//! by a phase timer. Each probe optionally carries a success budget; once the
//! flag is up, every evaluation of a budgeted probe consumes one slot, and the
//! probe fails for good after the budget is spent.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Which probe a flag or counter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Liveness,
    Readiness,
}

impl ProbeKind {
    /// Endpoint name used in logs
    pub fn endpoint(&self) -> &'static str {
        match self {
            ProbeKind::Liveness => "livez",
            ProbeKind::Readiness => "readyz",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Result of evaluating a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Flag not yet raised by its phase timer
    NotReady,
    Ok,
    /// Flag is up but the success budget has been spent
    BudgetExceeded,
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Ok)
    }
}

#[derive(Debug)]
struct Probe {
    kind: ProbeKind,
    up: AtomicBool,
    /// Evaluations counted against the budget (including those past it)
    count: AtomicU64,
    /// 0 disables counting
    budget: u64,
}

impl Probe {
    fn new(kind: ProbeKind, budget: u64) -> Self {
        Self {
            kind,
            up: AtomicBool::new(false),
            count: AtomicU64::new(0),
            budget,
        }
    }

    fn record(&self) -> ProbeOutcome {
        if !self.up.load(Ordering::SeqCst) {
            return ProbeOutcome::NotReady;
        }
        if self.budget == 0 {
            return ProbeOutcome::Ok;
        }

        // Increment and compare on the value this call produced, so concurrent
        // callers each observe a distinct count.
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(probe = %self.kind, count, max = self.budget, "Probe counted against budget");
        if count > self.budget {
            ProbeOutcome::BudgetExceeded
        } else {
            ProbeOutcome::Ok
        }
    }
}

/// Process-wide probe state shared by phase timers and HTTP handlers
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct ProbeState {
    liveness: Arc<Probe>,
    readiness: Arc<Probe>,
}

impl ProbeState {
    /// Create a new probe state (both flags down, counters zero)
    pub fn new(liveness_budget: u64, readiness_budget: u64) -> Self {
        Self {
            liveness: Arc::new(Probe::new(ProbeKind::Liveness, liveness_budget)),
            readiness: Arc::new(Probe::new(ProbeKind::Readiness, readiness_budget)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.liveness_success_max, config.readiness_success_max)
    }

    fn probe(&self, kind: ProbeKind) -> &Probe {
        match kind {
            ProbeKind::Liveness => &self.liveness,
            ProbeKind::Readiness => &self.readiness,
        }
    }

    /// Raise a flag. Returns false if it was already up.
    pub fn set(&self, kind: ProbeKind) -> bool {
        !self.probe(kind).up.swap(true, Ordering::SeqCst)
    }

    pub fn set_live(&self) -> bool {
        self.set(ProbeKind::Liveness)
    }

    pub fn set_ready(&self) -> bool {
        self.set(ProbeKind::Readiness)
    }

    pub fn is_up(&self, kind: ProbeKind) -> bool {
        self.probe(kind).up.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.is_up(ProbeKind::Liveness)
    }

    pub fn is_ready(&self) -> bool {
        self.is_up(ProbeKind::Readiness)
    }

    /// Evaluate a probe, consuming budget when one is configured
    pub fn record(&self, kind: ProbeKind) -> ProbeOutcome {
        self.probe(kind).record()
    }

    pub fn record_liveness_probe(&self) -> ProbeOutcome {
        self.record(ProbeKind::Liveness)
    }

    pub fn record_readiness_probe(&self) -> ProbeOutcome {
        self.record(ProbeKind::Readiness)
    }

    /// Number of evaluations counted against the probe's budget
    pub fn count(&self, kind: ProbeKind) -> u64 {
        self.probe(kind).count.load(Ordering::SeqCst)
    }
}

impl Default for ProbeState {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
