//! Error types for the session layer.

/// Errors that can occur while driving a host-connection endpoint.
///
/// Most misuse in this layer is logged and ignored rather than returned
/// (a dead endpoint swallowing a send is normal operation, not a fault);
/// only genuine caller logic errors surface here.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The host already assigned this endpoint a client id. Ids are
    /// assigned at most once per endpoint; a second assignment means the
    /// caller forwarded a stale or duplicate accept.
    #[error("client id already set to {current}, refusing {offered}")]
    ClientIdAlreadySet { current: u8, offered: u8 },
}
