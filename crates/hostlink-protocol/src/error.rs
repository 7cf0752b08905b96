/// Errors produced while decoding inbound datagrams.
///
/// Encoding never fails; every error here comes from bytes that arrived
/// off the wire. `PartialEq` is derived so tests can assert on exact
/// variants.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer is shorter than the minimum for its shape.
    #[error("{shape} packet too short: {len} bytes")]
    Truncated { shape: &'static str, len: usize },

    /// The leading tag byte is not one we know.
    #[error("unknown packet tag: 0x{0:02x}")]
    UnknownTag(u8),

    /// A game-frame packet arrived with no payload bytes after the header.
    #[error("game frame carries no payload")]
    EmptyPayload,
}
