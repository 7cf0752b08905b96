//! # Hostlink
//!
//! Client-side UDP connection layer for game hosts.
//!
//! Hostlink establishes, maintains, and tears down a logical connection
//! from a game client to a game host over plain UDP: it negotiates a
//! protocol version, obtains a client id, watches for host silence, and
//! runs a best-effort graceful disconnect handshake. The embedding game
//! supplies a [`SessionHandler`] for the payload layer above the
//! transport and receives exactly one disconnected callback when the
//! connection ends, however it ends.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hostlink::prelude::*;
//!
//! # struct MySession;
//! # impl SessionHandler for MySession {
//! #     fn handle_payload(&mut self, _payload: &[u8]) {}
//! #     fn can_communicate(&self) -> bool { false }
//! #     fn report_error(&mut self, _message: &str) {}
//! # }
//! # async fn connect() -> Result<(), HostlinkError> {
//! let host = "203.0.113.9:43210".parse().unwrap();
//! let (client, handle) = HostClientBuilder::new()
//!     .tick_rate(30)
//!     .on_disconnected(|| println!("connection ended"))
//!     .connect(host, MySession)
//!     .await?;
//!
//! tokio::spawn(client.run());
//! handle.send_game_data(b"hello".to_vec());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod registry;

pub use client::{ClientHandle, HostClient, HostClientBuilder};
pub use error::HostlinkError;
pub use registry::ConnectionRegistry;

/// The commonly used surface, importable in one line.
pub mod prelude {
    pub use crate::{
        ClientHandle, ConnectionRegistry, HostClient, HostClientBuilder, HostlinkError,
    };
    pub use hostlink_protocol::{
        ClientPacket, HostPacket, RequestIdAllocator, PROTOCOL_VERSION, PROTOCOL_VERSION_MIN,
    };
    pub use hostlink_session::{
        HostConnection, HostRegistry, Lifecycle, Notice, NoticeSink, SessionHandler,
    };
    pub use hostlink_tick::{TickConfig, TickScheduler};
    pub use hostlink_transport::{Clock, EndpointId, MonotonicClock, PacketSink};
}
