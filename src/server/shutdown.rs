//! Process termination signaling
//!
//! Fatal conditions (the `/crash` endpoint, a failed sentinel write) and
//! SIGTERM/SIGINT are funneled through one channel so `main` can let the
//! HTTP server flush in-flight responses before the process exits.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Why the process is going down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// `/crash` was requested
    Crash,
    /// A phase timer could not write its sentinel file
    SentinelFailure(String),
    /// Orchestrator asked us to stop
    Signal(&'static str),
}

impl Termination {
    /// Exit code the process should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Crash | Termination::SentinelFailure(_) => 1,
            Termination::Signal(_) => 0,
        }
    }
}

/// Receiving side of the termination channel
#[derive(Clone)]
pub struct TerminationSignal {
    receiver: watch::Receiver<Option<Termination>>,
}

impl TerminationSignal {
    /// Wait for a termination request
    ///
    /// Returns `None` if every controller was dropped without triggering.
    pub async fn wait(&mut self) -> Option<Termination> {
        match self.receiver.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone(),
            Err(_) => None,
        }
    }

    /// Current termination reason, if any (non-blocking)
    pub fn reason(&self) -> Option<Termination> {
        self.receiver.borrow().clone()
    }
}

/// Sending side of the termination channel, shared by handlers and timers
#[derive(Clone)]
pub struct TerminationController {
    sender: Arc<watch::Sender<Option<Termination>>>,
}

impl TerminationController {
    /// Request termination. The first reason wins; later requests are ignored.
    pub fn trigger(&self, reason: Termination) {
        let accepted = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
        if accepted {
            info!(reason = ?reason, "Termination requested");
        }
    }
}

/// Create a new termination channel
///
/// Returns (controller, signal) where:
/// - controller: Cloned into anything that may need to end the process
/// - signal: Cloned and passed to components that need to listen
pub fn termination_channel() -> (TerminationController, TerminationSignal) {
    let (sender, receiver) = watch::channel(None);
    (
        TerminationController {
            sender: Arc::new(sender),
        },
        TerminationSignal { receiver },
    )
}

/// Wait for SIGTERM or SIGINT signal
///
/// Returns the signal name that was received.
///
/// # Panics
/// Panics if signal handlers cannot be registered (OS resource exhaustion).
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::error;

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to register SIGTERM handler");
            panic!("Cannot register SIGTERM handler: {}", e);
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to register SIGINT handler");
            panic!("Cannot register SIGINT handler: {}", e);
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
            "SIGTERM"
        }
        _ = sigint.recv() => {
            info!("Received SIGINT");
            "SIGINT"
        }
    }
}

/// Wait for Ctrl+C signal (Windows)
///
/// # Panics
/// Panics if Ctrl+C handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    use tracing::error;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
        panic!("Cannot wait for Ctrl+C: {}", e);
    }
    info!("Received Ctrl+C");
    "CTRL_C"
}
