//! Unified error type for Hostlink.

use hostlink_transport::TransportError;

/// Top-level error returned by the client driver.
///
/// Only transport-level failures (socket bind) escape the driver.
/// Protocol errors and endpoint state-machine errors are handled where
/// they arise: undecodable datagrams and duplicate accepts are logged
/// and dropped inside the run loop rather than ending the connection.
#[derive(Debug, thiserror::Error)]
pub enum HostlinkError {
    /// A transport-level error (socket bind).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Bind(io::Error::new(
            io::ErrorKind::AddrInUse,
            "address in use",
        ));
        let top: HostlinkError = err.into();
        assert!(matches!(top, HostlinkError::Transport(_)));
        assert!(top.to_string().contains("address in use"));
    }
}
