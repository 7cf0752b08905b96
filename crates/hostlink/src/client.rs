//! The `HostClient` driver: wires transport, codec, endpoint, and
//! scheduler into one `tokio::select!` loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;

use hostlink_protocol::{HostPacket, RequestIdAllocator};
use hostlink_session::{
    Collaborators, Lifecycle, NoticeSink, SessionHandler, UdpHostEndpoint,
};
use hostlink_tick::{TickConfig, TickScheduler};
use hostlink_transport::{Clock, EndpointId, MonotonicClock, UdpLink};

use crate::{ConnectionRegistry, HostlinkError};

/// Each connection attempt in the process gets a distinct endpoint id.
static NEXT_ENDPOINT_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum Command {
    SendGameData(Vec<u8>),
    SwitchProtocol,
    Disconnect,
    Shutdown,
}

/// Cloneable handle for controlling a running [`HostClient`].
///
/// All methods are fire-and-forget; once the client loop has exited they
/// become silent no-ops.
#[derive(Clone)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ClientHandle {
    /// Queues one frame of game data for the host.
    pub fn send_game_data(&self, payload: Vec<u8>) {
        let _ = self.tx.send(Command::SendGameData(payload));
    }

    /// Steps the offered protocol version down one. Called by the
    /// embedding engine when the host signals it cannot speak the
    /// version currently on offer.
    pub fn switch_protocol(&self) {
        let _ = self.tx.send(Command::SwitchProtocol);
    }

    /// Starts a graceful disconnect; the loop exits once the handshake
    /// completes or times out.
    pub fn disconnect(&self) {
        let _ = self.tx.send(Command::Disconnect);
    }

    /// Stops the loop immediately without a disconnect handshake.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and connects a [`HostClient`].
pub struct HostClientBuilder {
    bind_addr: SocketAddr,
    tick_rate_hz: u32,
    show_progress: bool,
    session_identifier: Option<Vec<u8>>,
    notices: Option<Arc<dyn NoticeSink>>,
    on_disconnected: Option<Box<dyn Fn() + Send + Sync>>,
    request_ids: Option<Arc<RequestIdAllocator>>,
}

impl Default for HostClientBuilder {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            tick_rate_hz: 30,
            show_progress: true,
            session_identifier: None,
            notices: None,
            on_disconnected: None,
            request_ids: None,
        }
    }
}

impl HostClientBuilder {
    /// Starts a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Local address to bind the UDP socket to. Defaults to an ephemeral
    /// port on all interfaces.
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Poll rate for the connection loop. Defaults to 30 Hz.
    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Whether to surface connection-progress notices to the notice
    /// sink. Turning this off suppresses notices only; wire behavior is
    /// unchanged.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Session identifier sent verbatim in every client request.
    /// Defaults to 16 random bytes generated per client.
    pub fn session_identifier(mut self, id: Vec<u8>) -> Self {
        self.session_identifier = Some(id);
        self
    }

    /// Where to display connection status notices.
    pub fn notices(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.notices = Some(sink);
        self
    }

    /// Callback invoked exactly once when the connection ends, however
    /// it ends.
    pub fn on_disconnected(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnected = Some(Box::new(f));
        self
    }

    /// Request-id allocator to draw from. Supply one shared allocator
    /// when running several clients in one process so ids stay distinct
    /// across them.
    pub fn request_ids(mut self, allocator: Arc<RequestIdAllocator>) -> Self {
        self.request_ids = Some(allocator);
        self
    }

    /// Binds the local socket and builds the connection loop aimed at
    /// `host`. The `session` is the payload layer above the transport.
    pub async fn connect<S: SessionHandler>(
        self,
        host: SocketAddr,
        session: S,
    ) -> Result<(HostClient<S>, ClientHandle), HostlinkError> {
        let link = UdpLink::bind(self.bind_addr).await?;
        let clock = MonotonicClock::new();

        let id = EndpointId::new(NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed));
        let registry = Arc::new(ConnectionRegistry::new(
            self.on_disconnected.unwrap_or_else(|| Box::new(|| {})),
        ));
        registry.set_current(id);

        let session_identifier = self
            .session_identifier
            .unwrap_or_else(|| rand::rng().random::<[u8; 16]>().to_vec());

        let endpoint = UdpHostEndpoint::new(
            id,
            host,
            session_identifier,
            Collaborators {
                sink: Arc::new(link.outbound()),
                registry: registry.clone(),
                notices: if self.show_progress {
                    self.notices
                } else {
                    None
                },
                request_ids: self
                    .request_ids
                    .unwrap_or_else(|| Arc::new(RequestIdAllocator::new())),
            },
            session,
            clock.now_ms(),
        );

        let scheduler = TickScheduler::new(TickConfig::with_rate(self.tick_rate_hz));
        let (tx, cmd_rx) = mpsc::unbounded_channel();

        let client = HostClient {
            link,
            endpoint,
            registry,
            scheduler,
            clock,
            host,
            cmd_rx,
        };
        Ok((client, ClientHandle { tx }))
    }
}

// ---------------------------------------------------------------------------
// HostClient
// ---------------------------------------------------------------------------

/// The connection loop for one client-to-host attempt.
///
/// Owns the socket, the endpoint state machine, and the poll scheduler.
/// [`run`](Self::run) consumes the client and drives everything until the
/// connection ends.
pub struct HostClient<S: SessionHandler> {
    link: UdpLink,
    endpoint: UdpHostEndpoint<S>,
    registry: Arc<ConnectionRegistry>,
    scheduler: TickScheduler,
    clock: MonotonicClock,
    host: SocketAddr,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl<S: SessionHandler> HostClient<S> {
    /// The local address the client's socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.link.local_addr()
    }

    /// Runs the connection loop until the endpoint dies or a shutdown
    /// command arrives.
    pub async fn run(mut self) -> Result<(), HostlinkError> {
        tracing::info!(host = %self.host, local = %self.link.local_addr(), "client loop started");
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    let now = self.clock.now_ms();
                    match cmd {
                        Some(Command::SendGameData(payload)) => {
                            self.endpoint.send_game_data(&payload);
                        }
                        Some(Command::SwitchProtocol) => {
                            if !self.endpoint.switch_protocol() {
                                tracing::warn!("already at oldest supported protocol version");
                            }
                        }
                        Some(Command::Disconnect) => {
                            self.endpoint.request_disconnect(now);
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }
                _ = self.scheduler.wait_for_tick() => {
                    let now = self.clock.now_ms();
                    for dgram in self.link.drain_inbound() {
                        if dgram.source != self.host {
                            tracing::debug!(
                                source = %dgram.source,
                                "datagram from unexpected source dropped"
                            );
                            continue;
                        }
                        self.dispatch(now, &dgram.bytes);
                    }
                    self.endpoint.poll(now);
                }
            }
            if self.endpoint.lifecycle() == Lifecycle::Dead {
                break;
            }
        }
        self.endpoint.retire();
        self.registry.clear();
        self.link.shutdown();
        tracing::info!(host = %self.host, "client loop finished");
        Ok(())
    }

    /// Routes one inbound datagram into the endpoint.
    fn dispatch(&mut self, now: u64, bytes: &[u8]) {
        match HostPacket::decode(bytes) {
            Ok(HostPacket::Accept {
                request_id,
                client_id,
            }) => {
                self.endpoint.touch(now);
                if request_id != self.endpoint.request_id() {
                    tracing::debug!(
                        request_id,
                        current = self.endpoint.request_id(),
                        "stale accept dropped"
                    );
                    return;
                }
                if let Err(e) = self.endpoint.set_client_id(client_id) {
                    // Duplicate accept for the current round; the
                    // endpoint keeps its original id.
                    tracing::debug!(error = %e, "accept ignored");
                }
            }
            Ok(HostPacket::GameFrame { payload }) => {
                self.endpoint.handle_packet(now, &payload);
            }
            Ok(HostPacket::DisconnectAck { .. }) => {
                self.endpoint.touch(now);
                self.endpoint.acknowledge_disconnect();
            }
            Ok(HostPacket::DisconnectFromHost) => {
                self.endpoint.touch(now);
                self.endpoint.error(now, "disconnected by host");
            }
            Err(e) => {
                tracing::debug!(error = %e, "undecodable datagram dropped");
            }
        }
    }
}
