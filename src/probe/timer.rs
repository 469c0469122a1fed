//! Phase timers
//!
//! Each timer waits out its configured delay, raises one probe flag, then
//! optionally drops a sentinel file. Timers are fire-and-forget: they are
//! never cancelled, and a sentinel failure terminates the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::clock::Clock;
use super::sentinel::{self, SentinelError};
use super::state::{ProbeKind, ProbeState};
use crate::config::Config;
use crate::server::{Termination, TerminationController};

/// One-shot delayed flag flip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTimer {
    pub kind: ProbeKind,
    pub delay: Duration,
    pub sentinel: Option<PathBuf>,
}

impl PhaseTimer {
    pub fn liveness(config: &Config) -> Self {
        Self {
            kind: ProbeKind::Liveness,
            delay: config.liveness_delay,
            sentinel: config.sentinels.as_ref().map(|s| s.liveness.clone()),
        }
    }

    pub fn readiness(config: &Config) -> Self {
        Self {
            kind: ProbeKind::Readiness,
            delay: config.readiness_delay,
            sentinel: config.sentinels.as_ref().map(|s| s.readiness.clone()),
        }
    }

    /// Wait, raise the flag, then write the sentinel if one is configured
    pub async fn run(&self, probes: &ProbeState, clock: &dyn Clock) -> Result<(), SentinelError> {
        info!(probe = %self.kind, delay_secs = self.delay.as_secs(), "Starting phase delay");
        clock.sleep(self.delay).await;

        probes.set(self.kind);
        info!(probe = %self.kind, "Completed phase delay");

        if let Some(path) = &self.sentinel {
            sentinel::signal(path).await?;
        }
        Ok(())
    }

    /// Run in the background; a sentinel failure requests process termination
    pub fn spawn(
        self,
        probes: ProbeState,
        clock: Arc<dyn Clock>,
        termination: TerminationController,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run(&probes, clock.as_ref()).await {
                error!(probe = %self.kind, error = %e, "Phase timer failed");
                termination.trigger(Termination::SentinelFailure(e.to_string()));
            }
        })
    }
}

#[cfg(test)]
#[path = "timer_test.rs"]
mod tests;
