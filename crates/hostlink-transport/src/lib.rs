//! Transport layer for Hostlink.
//!
//! Provides the seams the connection core talks through, [`PacketSink`]
//! for fire-and-forget outbound sends and [`Clock`] for monotonic time,
//! plus the tokio-backed UDP facilities ([`UdpLink`]) that implement them.
//!
//! The connection core never performs socket I/O itself: it hands encoded
//! bytes to a [`PacketSink`] and forgets about them, and it drains inbound
//! datagrams once per tick. Everything that blocks lives behind spawned
//! tasks in this crate.

mod error;
mod udp;

pub use error::TransportError;
pub use udp::{Datagram, UdpLink, UdpOutbound};

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

/// Opaque identifier for a host-connection endpoint.
///
/// Used by the registry to decide whether a given endpoint is still "the
/// current" connection to the host when teardown fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(u64);

impl EndpointId {
    /// Creates a new `EndpointId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}

/// Fire-and-forget outbound send facility.
///
/// `enqueue` must never block and never report delivery: the caller hands
/// the bytes off and moves on. Loss of an enqueued datagram is invisible
/// to the connection core; retries are the job of its timing policy, not
/// the transport.
pub trait PacketSink: Send + Sync + 'static {
    /// Queues `data` for transmission to `dest`. Best effort only.
    fn enqueue(&self, data: Vec<u8>, dest: SocketAddr);
}

/// Monotonic millisecond time source shared process-wide.
///
/// The connection core is driven by explicit `now` values so its timing
/// behavior stays deterministic under test; production code gets those
/// values from a [`MonotonicClock`].
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since this clock's epoch. Never goes backwards.
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by [`std::time::Instant`], anchored at construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose epoch is "now".
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_id_new_and_into_inner() {
        let id = EndpointId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_endpoint_id_display() {
        let id = EndpointId::new(7);
        assert_eq!(id.to_string(), "ep-7");
    }

    #[test]
    fn test_endpoint_id_equality() {
        let a = EndpointId::new(1);
        let b = EndpointId::new(1);
        let c = EndpointId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
