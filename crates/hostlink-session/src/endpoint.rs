//! The client-side connection state machine.
//!
//! One [`UdpHostEndpoint`] represents one attempted connection to one
//! host. It is driven entirely from a single logical thread: an external
//! scheduler calls [`poll`](UdpHostEndpoint::poll) once per tick with the
//! current time, and the dispatch layer calls
//! [`handle_packet`](UdpHostEndpoint::handle_packet) whenever a datagram
//! for this connection arrives. Nothing in here blocks; outbound bytes go
//! through the fire-and-forget [`PacketSink`].

use std::net::SocketAddr;
use std::sync::Arc;

use hostlink_protocol::{
    ClientPacket, RequestIdAllocator, PROTOCOL_VERSION, PROTOCOL_VERSION_MIN,
};
use hostlink_transport::{EndpointId, PacketSink};

use crate::policy::{self, PolicyState, PollAction};
use crate::{EndpointError, HostRegistry, Notice, NoticeSink, SessionHandler};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Where the endpoint is in its life.
///
/// Checked at the top of every public operation. `Dying` suppresses all
/// sends while dependent objects unwind; `Dead` means the one-shot
/// teardown notification has fired and the endpoint does nothing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Normal operation.
    Active,
    /// Being dismantled; sends are suppressed but state is still valid.
    Dying,
    /// Teardown notification delivered. Terminal.
    Dead,
}

// ---------------------------------------------------------------------------
// HostConnection
// ---------------------------------------------------------------------------

/// The capability set the engine consumes from any connection-to-host
/// variant. [`UdpHostEndpoint`] is the UDP variant; other transports can
/// implement the same surface without sharing state with it.
pub trait HostConnection {
    /// The protocol version currently being offered or spoken.
    fn protocol_version(&self) -> u16;

    /// Whether the connection counts as established.
    fn can_communicate(&self) -> bool;

    /// Runs one tick of retry/timeout logic.
    fn poll(&mut self, now: u64);

    /// Feeds one inbound game-data payload into the connection.
    fn handle_packet(&mut self, now: u64, payload: &[u8]);

    /// Sends one frame of opaque game data. Best effort.
    fn send_game_data(&mut self, payload: &[u8]);

    /// Starts a graceful local disconnect.
    fn request_disconnect(&mut self, now: u64);

    /// Puts the connection into its error/disconnect path.
    fn error(&mut self, now: u64, message: &str);
}

// ---------------------------------------------------------------------------
// UdpHostEndpoint
// ---------------------------------------------------------------------------

/// Shared services the endpoint needs from its environment, grouped so
/// the constructor signature stays readable.
pub struct Collaborators {
    /// Fire-and-forget outbound send path.
    pub sink: Arc<dyn PacketSink>,
    /// Tracker of "the current" host connection.
    pub registry: Arc<dyn HostRegistry>,
    /// Optional user-notice display. `None` suppresses notices only.
    pub notices: Option<Arc<dyn NoticeSink>>,
    /// Process-wide request-id source, shared across endpoints.
    pub request_ids: Arc<RequestIdAllocator>,
}

/// State machine for one client-to-host UDP connection attempt.
///
/// Owns its destination address for life. The `session` type parameter is
/// the payload layer above this core; it receives decoded game data and
/// error reports, and supplies the liveness signal.
pub struct UdpHostEndpoint<S: SessionHandler> {
    id: EndpointId,
    address: SocketAddr,
    session: S,
    sink: Arc<dyn PacketSink>,
    registry: Arc<dyn HostRegistry>,
    notices: Option<Arc<dyn NoticeSink>>,
    request_ids: Arc<RequestIdAllocator>,
    /// Included verbatim in every client request; unique per process run.
    session_identifier: Vec<u8>,
    /// Only ever stepped down, never up.
    protocol_version: u16,
    request_id: u8,
    client_id: Option<u8>,
    last_client_id_request: u64,
    last_host_response: u64,
    last_disconnect_request: u64,
    /// One-way false -> true; true means disconnect-handshake mode.
    errored: bool,
    lifecycle: Lifecycle,
}

impl<S: SessionHandler> UdpHostEndpoint<S> {
    /// Creates an endpoint aimed at `address` and announces the attempt.
    ///
    /// The response timer is seeded to `now` so a fresh endpoint is not
    /// immediately judged silent; the request timer is back-dated so the
    /// first poll sends a client request right away.
    pub fn new(
        id: EndpointId,
        address: SocketAddr,
        session_identifier: Vec<u8>,
        collaborators: Collaborators,
        session: S,
        now: u64,
    ) -> Self {
        let request_id = collaborators.request_ids.next();
        tracing::info!(%id, %address, request_id, "connecting to host");
        if let Some(notices) = &collaborators.notices {
            notices.show(Notice::Connecting);
        }
        Self {
            id,
            address,
            session,
            sink: collaborators.sink,
            registry: collaborators.registry,
            notices: collaborators.notices,
            request_ids: collaborators.request_ids,
            session_identifier,
            protocol_version: PROTOCOL_VERSION,
            request_id,
            client_id: None,
            last_client_id_request: now.saturating_sub(policy::CLIENT_ID_RETRY_MS + 1),
            last_host_response: now,
            last_disconnect_request: 0,
            errored: false,
            lifecycle: Lifecycle::Active,
        }
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The request id stamped on the current round of client requests.
    pub fn request_id(&self) -> u8 {
        self.request_id
    }

    pub fn client_id(&self) -> Option<u8> {
        self.client_id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Access to the payload layer above this endpoint.
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Records host traffic for liveness without forwarding anything.
    /// Used for control packets that carry no game payload.
    pub fn touch(&mut self, now: u64) {
        if self.lifecycle == Lifecycle::Dead {
            return;
        }
        self.last_host_response = now;
    }

    /// Accepts the host's client-id assignment. One-shot: a second call
    /// leaves state untouched and returns an error.
    pub fn set_client_id(&mut self, id: u8) -> Result<(), EndpointError> {
        if let Some(current) = self.client_id {
            tracing::warn!(
                endpoint = %self.id,
                current,
                offered = id,
                "duplicate client id assignment ignored"
            );
            return Err(EndpointError::ClientIdAlreadySet {
                current,
                offered: id,
            });
        }
        tracing::info!(endpoint = %self.id, client_id = id, "host assigned client id");
        self.client_id = Some(id);
        Ok(())
    }

    /// Steps the offered protocol version down one and invalidates the
    /// in-flight request round. Returns false when already at the oldest
    /// supported version; giving up at that point is the caller's call.
    pub fn switch_protocol(&mut self) -> bool {
        if self.protocol_version <= PROTOCOL_VERSION_MIN {
            return false;
        }
        self.protocol_version -= 1;
        self.request_id = self.request_ids.next();
        tracing::debug!(
            endpoint = %self.id,
            protocol_version = self.protocol_version,
            request_id = self.request_id,
            "downgraded protocol version",
        );
        true
    }

    /// Marks the endpoint as being dismantled. All further sends become
    /// no-ops; safe to call at any point before dropping the endpoint.
    pub fn retire(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            self.lifecycle = Lifecycle::Dying;
        }
    }

    // ------------------------------------------------------------------
    // Tick-driven behavior
    // ------------------------------------------------------------------

    /// Evaluates the retry/timeout policy against `now` and performs the
    /// single resulting action.
    pub fn poll(&mut self, now: u64) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }
        let action = policy::evaluate(PolicyState {
            now,
            errored: self.errored,
            has_client_id: self.client_id.is_some(),
            can_communicate: self.session.can_communicate(),
            last_client_id_request: self.last_client_id_request,
            last_host_response: self.last_host_response,
            last_disconnect_request: self.last_disconnect_request,
        });
        match action {
            PollAction::Idle => {}
            PollAction::SendClientIdRequest => {
                self.last_client_id_request = now;
                self.send_client_id_request();
            }
            PollAction::SendDisconnectRequest => {
                self.last_disconnect_request = now;
                self.send_disconnect_request();
            }
            PollAction::Timeout => {
                if !self.session.can_communicate() {
                    tracing::warn!(endpoint = %self.id, "connection attempt timed out");
                    if let Some(notices) = &self.notices {
                        notices.show(Notice::ConnectionFailed);
                    }
                } else {
                    tracing::warn!(endpoint = %self.id, "host went silent; giving up");
                }
                self.teardown();
            }
        }
    }

    /// Handles one inbound game-data payload. Any recognized traffic
    /// counts as liveness regardless of content.
    pub fn handle_packet(&mut self, now: u64, payload: &[u8]) {
        if self.lifecycle == Lifecycle::Dead {
            return;
        }
        self.last_host_response = now;
        if !payload.is_empty() {
            self.session.handle_payload(payload);
        }
    }

    // ------------------------------------------------------------------
    // Shutdown paths
    // ------------------------------------------------------------------

    /// Puts the endpoint into its error path: reports the message to the
    /// session layer and begins the disconnect handshake, or tears down
    /// immediately if there is no client id to hand the host.
    pub fn error(&mut self, now: u64, message: &str) {
        // The message always reaches the base error-reporting path;
        // only the handshake below is first-invocation-only.
        self.session.report_error(message);
        if self.errored {
            return;
        }
        tracing::warn!(endpoint = %self.id, reason = message, "connection error");
        self.errored = true;
        if self.client_id.is_some() {
            self.last_disconnect_request = now;
            self.send_disconnect_request();
        } else {
            self.teardown();
        }
    }

    /// Starts a graceful local disconnect. Not an error; uses the same
    /// handshake machinery, with retries driven by [`poll`](Self::poll).
    pub fn request_disconnect(&mut self, now: u64) {
        if self.errored {
            return;
        }
        tracing::info!(endpoint = %self.id, "disconnecting from host");
        self.errored = true;
        if self.client_id.is_some() {
            self.last_disconnect_request = now;
            self.send_disconnect_request();
        }
    }

    /// The host acknowledged our disconnect request; finish tearing down
    /// without waiting out the retry loop.
    pub fn acknowledge_disconnect(&mut self) {
        if !self.errored {
            tracing::debug!(endpoint = %self.id, "unsolicited disconnect ack ignored");
            return;
        }
        self.teardown();
    }

    /// Sends one frame of game data. Silently does nothing unless the
    /// endpoint is active, has a client id, and the payload is non-empty.
    pub fn send_game_data(&mut self, payload: &[u8]) {
        if self.lifecycle != Lifecycle::Active || payload.is_empty() {
            return;
        }
        let Some(client_id) = self.client_id else {
            tracing::debug!(endpoint = %self.id, "dropping game data; no client id yet");
            return;
        };
        let packet = ClientPacket::GameFrame {
            client_id,
            payload: payload.to_vec(),
        };
        self.sink.enqueue(packet.encode(), self.address);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn send_client_id_request(&self) {
        let packet = ClientPacket::Request {
            protocol_version: self.protocol_version,
            request_id: self.request_id,
            session_identifier: self.session_identifier.clone(),
        };
        tracing::debug!(
            endpoint = %self.id,
            request_id = self.request_id,
            protocol_version = self.protocol_version,
            "requesting client id",
        );
        self.sink.enqueue(packet.encode(), self.address);
    }

    fn send_disconnect_request(&self) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }
        let Some(client_id) = self.client_id else {
            return;
        };
        let packet = ClientPacket::DisconnectRequest { client_id };
        self.sink.enqueue(packet.encode(), self.address);
    }

    /// Delivers the one-shot "this connection is gone" notification, but
    /// only while the registry still considers this endpoint current. A
    /// teardown attempt on a superseded endpoint is an inconsistency
    /// worth logging, not a crash.
    fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::Dead {
            tracing::warn!(endpoint = %self.id, "duplicate teardown attempt ignored");
            return;
        }
        if !self.registry.is_current(self.id) {
            tracing::warn!(
                endpoint = %self.id,
                "teardown on non-current endpoint; notification withheld"
            );
            return;
        }
        tracing::info!(endpoint = %self.id, "connection ended");
        self.registry.notify_disconnected_from_host();
        self.lifecycle = Lifecycle::Dead;
    }
}

impl<S: SessionHandler> HostConnection for UdpHostEndpoint<S> {
    fn protocol_version(&self) -> u16 {
        self.protocol_version
    }

    fn can_communicate(&self) -> bool {
        self.session.can_communicate()
    }

    fn poll(&mut self, now: u64) {
        UdpHostEndpoint::poll(self, now);
    }

    fn handle_packet(&mut self, now: u64, payload: &[u8]) {
        UdpHostEndpoint::handle_packet(self, now, payload);
    }

    fn send_game_data(&mut self, payload: &[u8]) {
        UdpHostEndpoint::send_game_data(self, payload);
    }

    fn request_disconnect(&mut self, now: u64) {
        UdpHostEndpoint::request_disconnect(self, now);
    }

    fn error(&mut self, now: u64, message: &str) {
        UdpHostEndpoint::error(self, now, message);
    }
}
