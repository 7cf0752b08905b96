//! Wire format for the Hostlink client protocol.
//!
//! Defines the packet shapes exchanged between a game client and a game
//! host over UDP ([`ClientPacket`], [`HostPacket`]), the protocol version
//! constants the two sides negotiate over, and the shared
//! [`RequestIdAllocator`] that stamps client-id request rounds.
//!
//! This crate is pure data: no I/O, no time, no state machine. Everything
//! here is deterministic and unit-testable byte by byte.

mod error;
mod request_id;
mod wire;

pub use error::ProtocolError;
pub use request_id::RequestIdAllocator;
pub use wire::{tags, ClientPacket, HostPacket};

/// Newest protocol version this client speaks. Requests start here.
pub const PROTOCOL_VERSION: u16 = 33;

/// Oldest protocol version this client still speaks. Downgrading below
/// this means the host is too old to talk to.
pub const PROTOCOL_VERSION_MIN: u16 = 24;
