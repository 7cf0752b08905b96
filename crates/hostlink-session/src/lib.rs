//! Connection state machine and retry/timeout policy for Hostlink.
//!
//! The centerpiece is [`UdpHostEndpoint`]: the client-side object for one
//! attempted connection to one host. It negotiates a protocol version,
//! obtains a client id, watches for host silence, and runs the graceful
//! disconnect handshake, all from a single poll-driven thread with
//! fire-and-forget sends.
//!
//! Timing decisions live in [`policy`], a pure function over timestamps.
//! Everything the endpoint needs from its environment comes in through
//! the traits in [`collaborators`].

mod collaborators;
pub mod endpoint;
mod error;
pub mod policy;

pub use collaborators::{HostRegistry, Notice, NoticeSink, SessionHandler};
pub use endpoint::{Collaborators, HostConnection, Lifecycle, UdpHostEndpoint};
pub use error::EndpointError;
