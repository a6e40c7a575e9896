// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process signals as a [`CancellationToken`].
//!
//! The server stops accepting connections once the token fires; requests
//! already in flight, including pending completion calls, run to the end.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawns a watcher that cancels the returned token on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let stop = CancellationToken::new();
    let trigger = stop.clone();
    tokio::spawn(async move {
        let signal = next_signal().await;
        info!(signal, "stopping: finishing in-flight journal turns");
        trigger.cancel();
    });
    stop
}

#[cfg(unix)]
async fn next_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!(error = %e, "SIGTERM unavailable, waiting for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn next_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_live_and_can_be_cancelled_by_hand() {
        let stop = install_signal_handler();
        assert!(!stop.is_cancelled());
        stop.cancel();
        stop.cancelled().await;
    }
}
