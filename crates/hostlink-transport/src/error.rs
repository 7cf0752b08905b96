/// Errors that can occur in the transport layer.
///
/// Sends never error: they are fire-and-forget, and failures are logged
/// inside the sending task instead of surfacing to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the local UDP socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),
}
