//! Process-level tests: spawn the built binary and observe how it exits

use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("Failed to find a free port")
}

fn simulator(port: u16) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_probesim"));
    cmd.env("PORT", port.to_string())
        .env("LISTEN_DELAY_SECONDS", "0")
        .env("LIVENESS_DELAY_SECONDS", "0")
        .env("READINESS_DELAY_SECONDS", "0")
        .env_remove("RESPONSE_DELAY_MILLISECONDS")
        .env_remove("LIVENESS_SUCCESS_MAX")
        .env_remove("READINESS_SUCCESS_MAX")
        .env_remove("SENTINEL_FILES")
        .env_remove("STARTUP_FILE")
        .env_remove("LIVENESS_FILE")
        .env_remove("READINESS_FILE")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Poll /readyz until it answers 200
///
/// Retries with exponential backoff; the process needs a moment to bind
/// and for its zero-delay timers to fire.
async fn wait_until_ready(port: u16, max_retries: u32) -> reqwest::Client {
    let client = reqwest::Client::new();
    let mut delay = Duration::from_millis(10);

    for attempt in 1..=max_retries {
        match client
            .get(format!("http://127.0.0.1:{}/readyz", port))
            .timeout(Duration::from_millis(200))
            .send()
            .await
        {
            Ok(r) if r.status() == 200 => return client,
            _ if attempt < max_retries => {
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_millis(200));
            }
            other => panic!("Server not ready after {} attempts: {:?}", max_retries, other),
        }
    }
    client
}

async fn wait_exit(child: &mut Child) -> std::process::ExitStatus {
    tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .expect("Process did not exit")
        .expect("Failed to wait on process")
}

#[tokio::test]
async fn test_crash_answers_then_process_exits_abnormally() {
    let port = free_port();
    let mut child = simulator(port).spawn().expect("Failed to spawn simulator");

    let client = wait_until_ready(port, 50).await;

    let response = client
        .get(format!("http://127.0.0.1:{}/crash", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("/crash should answer before the process dies");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "/crash request processed");

    let status = wait_exit(&mut child).await;
    assert!(!status.success(), "Crash must exit non-zero, got {:?}", status);
}

#[tokio::test]
async fn test_malformed_numeric_setting_aborts_startup() {
    let port = free_port();
    let mut child = simulator(port)
        .env("LIVENESS_SUCCESS_MAX", "lots")
        .spawn()
        .expect("Failed to spawn simulator");

    let status = wait_exit(&mut child).await;
    assert!(!status.success());
}

#[tokio::test]
async fn test_sentinel_files_track_phases() {
    let dir = std::env::temp_dir().join(format!("probesim-process-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let startup = dir.join("startup");
    let liveness = dir.join("liveness");
    let readiness = dir.join("readiness");
    // Stale markers must be cleared at startup
    std::fs::write(&readiness, b"stale").unwrap();

    let port = free_port();
    let mut child = simulator(port)
        .env("READINESS_DELAY_SECONDS", "1")
        .env("STARTUP_FILE", &startup)
        .env("LIVENESS_FILE", &liveness)
        .env("READINESS_FILE", &readiness)
        .spawn()
        .expect("Failed to spawn simulator");

    let client = wait_until_ready(port, 50).await;
    assert!(startup.exists());
    assert!(liveness.exists());
    // Marker is written just after the flag flips
    for _ in 0..50 {
        if readiness.exists() && std::fs::metadata(&readiness).unwrap().len() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(std::fs::metadata(&readiness).unwrap().len(), 0);

    drop(client);
    child.kill().await.unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
}
