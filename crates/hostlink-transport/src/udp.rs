//! UDP send/receive facilities behind the [`PacketSink`] seam.
//!
//! A [`UdpLink`] owns one UDP socket and two spawned tasks:
//!
//! - the *outbound* task drains an unbounded channel and performs
//!   `send_to` calls, so the connection core's enqueue never blocks;
//! - the *inbound* task reads datagrams into a channel that the driver
//!   drains once per tick (no blocking reads anywhere in the core).
//!
//! Both tasks exit when the link's shutdown signal fires. An enqueue that
//! races shutdown is silently dropped, which the fire-and-forget contract
//! permits.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};

use crate::{PacketSink, TransportError};

/// Largest datagram the inbound task will accept.
const MAX_DATAGRAM: usize = 65_536;

/// How many inbound datagrams a single drain call will hand back, so one
/// flooded tick cannot stall the poll loop.
const DRAIN_LIMIT: usize = 256;

/// One received datagram, tagged with its source address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Where the datagram came from.
    pub source: SocketAddr,
    /// Raw datagram bytes, untouched by this layer.
    pub bytes: Vec<u8>,
}

/// Cloneable handle into the outbound sending task.
///
/// Implements [`PacketSink`]; this is the object handed to the connection
/// core.
#[derive(Clone)]
pub struct UdpOutbound {
    tx: mpsc::UnboundedSender<(Vec<u8>, SocketAddr)>,
}

impl PacketSink for UdpOutbound {
    fn enqueue(&self, data: Vec<u8>, dest: SocketAddr) {
        // The task may already have shut down; dropping the datagram is
        // within the best-effort contract.
        if self.tx.send((data, dest)).is_err() {
            tracing::debug!(%dest, "outbound task gone, datagram dropped");
        }
    }
}

/// A bound UDP socket with its sending and receiving tasks.
pub struct UdpLink {
    outbound: UdpOutbound,
    inbound_rx: mpsc::UnboundedReceiver<Datagram>,
    shutdown_tx: watch::Sender<bool>,
    local_addr: SocketAddr,
}

impl UdpLink {
    /// Binds a UDP socket to `addr` and spawns the send/receive tasks.
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = Arc::new(UdpSocket::bind(addr).await.map_err(TransportError::Bind)?);
        let local_addr = socket.local_addr().map_err(TransportError::Bind)?;
        tracing::debug!(%local_addr, "UDP link bound");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(send_loop(
            Arc::clone(&socket),
            out_rx,
            shutdown_rx.clone(),
        ));

        let (in_tx, inbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(recv_loop(socket, in_tx, shutdown_rx));

        Ok(Self {
            outbound: UdpOutbound { tx: out_tx },
            inbound_rx,
            shutdown_tx,
            local_addr,
        })
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a cloneable fire-and-forget send handle.
    pub fn outbound(&self) -> UdpOutbound {
        self.outbound.clone()
    }

    /// Takes every datagram received since the last call (capped per call
    /// so a flood cannot stall the tick). Never blocks.
    pub fn drain_inbound(&mut self) -> Vec<Datagram> {
        let mut out = Vec::new();
        while out.len() < DRAIN_LIMIT {
            match self.inbound_rx.try_recv() {
                Ok(dgram) => out.push(dgram),
                Err(_) => break,
            }
        }
        out
    }

    /// Signals both tasks to exit. Datagrams enqueued afterwards are
    /// silently dropped.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Drains the outbound channel into `send_to` until shutdown.
async fn send_loop(
    socket: Arc<UdpSocket>,
    mut rx: mpsc::UnboundedReceiver<(Vec<u8>, SocketAddr)>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            item = rx.recv() => {
                let Some((data, dest)) = item else { break };
                // Best effort: a failed send is logged and forgotten.
                if let Err(e) = socket.send_to(&data, dest).await {
                    tracing::debug!(%dest, error = %e, "send_to failed");
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!("outbound task exiting");
}

/// Reads datagrams into the inbound channel until shutdown.
async fn recv_loop(
    socket: Arc<UdpSocket>,
    tx: mpsc::UnboundedSender<Datagram>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, source)) => {
                        let dgram = Datagram {
                            source,
                            bytes: buf[..len].to_vec(),
                        };
                        if tx.send(dgram).is_err() {
                            // Receiver side dropped, nothing left to feed.
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "recv_from failed");
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!("inbound task exiting");
}
