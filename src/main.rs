use anyhow::Context;
use probesim::config::Config;
use probesim::probe::{sentinel, Clock, PhaseTimer, ProbeState, SystemClock};
use probesim::server::{serve, termination_channel, wait_for_signal, AppState, Termination};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long in-flight responses may drain once termination is requested
const TERMINATION_GRACE: Duration = Duration::from_secs(1);

/// Exit code for fatal startup errors
const EXIT_FATAL: i32 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting the server...");

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(EXIT_FATAL);
        }
    };

    // Stale markers from a previous run must not be mistaken for this one
    if let Some(paths) = &config.sentinels {
        if let Err(e) = sentinel::reset(paths).await {
            error!(error = %e, "Failed to reset sentinel files");
            std::process::exit(EXIT_FATAL);
        }
    }

    if config.listen_delay.is_zero() {
        info!("No listen delay");
    } else {
        info!(seconds = config.listen_delay.as_secs(), "Starting listen delay...");
        tokio::time::sleep(config.listen_delay).await;
        info!("Completed listen delay");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    if let Some(paths) = &config.sentinels {
        if let Err(e) = sentinel::signal(&paths.startup).await {
            error!(error = %e, "Failed to create startup sentinel file");
            std::process::exit(EXIT_FATAL);
        }
    }

    let (termination, signal) = termination_channel();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let probes = ProbeState::from_config(&config);

    // Fire-and-forget: timers are never joined or cancelled
    PhaseTimer::liveness(&config).spawn(probes.clone(), clock.clone(), termination.clone());
    PhaseTimer::readiness(&config).spawn(probes.clone(), clock.clone(), termination.clone());

    let signal_termination = termination.clone();
    tokio::spawn(async move {
        let name = wait_for_signal().await;
        signal_termination.trigger(Termination::Signal(name));
    });

    let state = AppState::new(probes, clock, config.response_delay, termination);
    let mut watcher = signal.clone();
    let mut server = tokio::spawn(serve(listener, state, signal));

    let reason = tokio::select! {
        reason = watcher.wait() => reason,
        result = &mut server => {
            match result {
                Ok(Ok(())) => warn!("Server stopped without a termination request"),
                Ok(Err(e)) => error!(error = %e, "Server failed"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
            std::process::exit(EXIT_FATAL);
        }
    };

    let Some(reason) = reason else {
        info!("Termination channel closed, shutting down");
        return Ok(());
    };

    // Let the server flush in-flight responses, including the /crash answer
    match tokio::time::timeout(TERMINATION_GRACE, server).await {
        Ok(Ok(Ok(()))) => info!("Server drained"),
        Ok(Ok(Err(e))) => warn!(error = %e, "Server failed while draining"),
        Ok(Err(e)) => warn!(error = %e, "Server task failed while draining"),
        Err(_) => warn!("Server did not drain in time"),
    }

    let code = reason.exit_code();
    if code == 0 {
        info!(reason = ?reason, "Shut down gracefully");
    } else {
        error!(reason = ?reason, code, "Terminating");
    }
    std::process::exit(code);
}
