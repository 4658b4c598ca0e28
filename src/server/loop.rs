// Server loop module
// Accepts connections until shutdown, then drains the ones still open

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop until `signals` requests shutdown
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, &signals);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = signals.wait() => break,
        }
    }

    // Stop accepting before waiting on the rest
    drop(listener);

    let timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    let open = active_connections.load(Ordering::SeqCst);
    if open > 0 {
        logger::log_info(&format!(
            "Waiting up to {}s for {open} active connection(s)",
            timeout.as_secs()
        ));
    }

    if wait_for_drain(&active_connections, timeout).await {
        logger::log_info("All connections closed, shutdown complete");
    } else {
        logger::log_warning(&format!(
            "Shutdown timeout reached with {} connection(s) still open",
            active_connections.load(Ordering::SeqCst)
        ));
    }
}

/// Poll the connection counter until it reaches zero or `timeout` elapses
async fn wait_for_drain(active_connections: &AtomicUsize, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while active_connections.load(Ordering::SeqCst) > 0 {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
    true
}
