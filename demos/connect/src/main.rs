//! Connects to a game host and logs connection lifecycle events.
//!
//! Usage: `connect <host-addr>`, e.g. `connect 192.0.2.10:43210`.
//! Ctrl-C starts a graceful disconnect; the process exits once the
//! handshake completes or times out.

use std::net::SocketAddr;
use std::process::ExitCode;

use hostlink::prelude::*;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Minimal payload layer: logs inbound frames and becomes "live" after
/// the first one.
struct LoggingSession {
    frames: u64,
}

impl SessionHandler for LoggingSession {
    fn handle_payload(&mut self, payload: &[u8]) {
        self.frames += 1;
        tracing::info!(len = payload.len(), total = self.frames, "game frame received");
    }

    fn can_communicate(&self) -> bool {
        self.frames > 0
    }

    fn report_error(&mut self, message: &str) {
        tracing::error!(reason = message, "connection error reported");
    }
}

/// Prints connection progress to stderr via tracing.
struct LogNotices;

impl NoticeSink for LogNotices {
    fn show(&self, notice: Notice) {
        match notice {
            Notice::Connecting => tracing::info!("connecting to host..."),
            Notice::ConnectionFailed => tracing::error!("unable to connect to host"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Some(host) = std::env::args().nth(1) else {
        eprintln!("usage: connect <host-addr>");
        return ExitCode::FAILURE;
    };
    let host: SocketAddr = match host.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("bad host address {host:?}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (client, handle) = match HostClientBuilder::new()
        .tick_rate(30)
        .notices(std::sync::Arc::new(LogNotices))
        .on_disconnected(|| tracing::info!("connection ended"))
        .connect(host, LoggingSession { frames: 0 })
        .await
    {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "failed to start client");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(local = %client.local_addr(), %host, "client started");

    // Ctrl-C triggers the graceful disconnect handshake; the run loop
    // exits once the host acks or the retry policy gives up.
    let ctrl_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("disconnecting...");
            ctrl_handle.disconnect();
        }
    });

    match client.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "client loop failed");
            ExitCode::FAILURE
        }
    }
}
