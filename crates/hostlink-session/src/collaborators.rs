//! Contracts the endpoint requires from its environment.
//!
//! The state machine in [`endpoint`](crate::endpoint) owns no sockets, no
//! clock, and no UI. Everything it needs from the outside world comes
//! through these traits, which keeps every timing and lifecycle behavior
//! testable with in-memory mocks.

use hostlink_transport::EndpointId;

/// The base payload layer sitting above this transport core.
///
/// The endpoint hands decoded game-data bytes upward through
/// `handle_payload` and consults `can_communicate` to pick its liveness
/// timeout. Interpretation of the payload bytes is entirely this
/// collaborator's business.
pub trait SessionHandler: Send + 'static {
    /// Accepts one inbound game-data payload (framing byte stripped).
    fn handle_payload(&mut self, payload: &[u8]);

    /// True once enough has been exchanged with the host to consider the
    /// connection established. Established connections tolerate longer
    /// silence before timing out.
    fn can_communicate(&self) -> bool;

    /// Receives the human-readable reason when the endpoint errors out.
    fn report_error(&mut self, message: &str);
}

/// Tracks which endpoint, if any, is "the current" connection to a host.
///
/// Teardown consults this before announcing departure: only the current
/// endpoint may notify, and it does so exactly once.
pub trait HostRegistry: Send + Sync + 'static {
    /// Whether `id` is still the registry's current host connection.
    fn is_current(&self, id: EndpointId) -> bool;

    /// Announces that the current host connection is gone.
    fn notify_disconnected_from_host(&self);
}

/// User-visible connection status events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A connection attempt has started.
    Connecting,
    /// The attempt timed out before the connection ever became live.
    ConnectionFailed,
}

/// Displays connection status to the user.
///
/// Optional: an endpoint constructed without one behaves identically on
/// the wire and merely stays silent.
pub trait NoticeSink: Send + Sync + 'static {
    fn show(&self, notice: Notice);
}
