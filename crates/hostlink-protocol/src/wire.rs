//! Packet shapes and their byte layouts.
//!
//! Every packet is a single datagram: one tag byte followed by a fixed
//! header and, for game frames, an opaque payload. Multi-byte integers are
//! little-endian on the wire. Decoding is the exact inverse of encoding;
//! trailing bytes past a fixed-size shape are ignored, since a datagram
//! transport may pad.

use crate::ProtocolError;

/// One-byte packet tags. Values start at 0x0a so that common garbage
/// datagrams (all zeros, all 0xff) never alias a real packet.
pub mod tags {
    pub const CLIENT_REQUEST: u8 = 0x0a;
    pub const CLIENT_ACCEPT: u8 = 0x0b;
    pub const CLIENT_GAME_FRAME: u8 = 0x0c;
    pub const HOST_GAME_FRAME: u8 = 0x0d;
    pub const DISCONNECT_FROM_CLIENT_REQUEST: u8 = 0x0e;
    pub const DISCONNECT_FROM_CLIENT_ACK: u8 = 0x0f;
    pub const DISCONNECT_FROM_HOST: u8 = 0x10;
}

/// Minimum length of a client request: tag, version (2), request id.
const CLIENT_REQUEST_MIN: usize = 4;
/// Length of a disconnect request: tag, client id.
const DISCONNECT_REQUEST_LEN: usize = 2;
/// Minimum length of a client game frame: tag, client id, one payload byte.
const CLIENT_GAME_FRAME_MIN: usize = 3;
/// Minimum length of a client accept: tag, request id, client id.
const CLIENT_ACCEPT_MIN: usize = 3;
/// Length of a disconnect ack: tag, client id.
const DISCONNECT_ACK_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Client -> host
// ---------------------------------------------------------------------------

/// Packets sent from the client to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    /// Asks the host for a client id under a given protocol version.
    ///
    /// Layout: `[tag][protocol_version: u16 le][request_id: u8][session_identifier..]`.
    /// The request id lets the host's reply be matched to the round that
    /// asked for it; replies to older rounds are dropped as stale.
    Request {
        protocol_version: u16,
        request_id: u8,
        session_identifier: Vec<u8>,
    },

    /// Announces that the client is leaving.
    ///
    /// Layout: `[tag][client_id: u8]`.
    DisconnectRequest { client_id: u8 },

    /// Carries one frame of opaque game data. Payload must be non-empty;
    /// the sending side drops empty frames before they reach the codec.
    ///
    /// Layout: `[tag][client_id: u8][payload..]`.
    GameFrame { client_id: u8, payload: Vec<u8> },
}

impl ClientPacket {
    /// Serializes the packet into a fresh datagram buffer.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Request {
                protocol_version,
                request_id,
                session_identifier,
            } => {
                let mut buf = Vec::with_capacity(CLIENT_REQUEST_MIN + session_identifier.len());
                buf.push(tags::CLIENT_REQUEST);
                buf.extend_from_slice(&protocol_version.to_le_bytes());
                buf.push(*request_id);
                buf.extend_from_slice(session_identifier);
                buf
            }
            Self::DisconnectRequest { client_id } => {
                vec![tags::DISCONNECT_FROM_CLIENT_REQUEST, *client_id]
            }
            Self::GameFrame { client_id, payload } => {
                let mut buf = Vec::with_capacity(2 + payload.len());
                buf.push(tags::CLIENT_GAME_FRAME);
                buf.push(*client_id);
                buf.extend_from_slice(payload);
                buf
            }
        }
    }

    /// Parses a datagram as a client packet.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let Some(&tag) = data.first() else {
            return Err(ProtocolError::Truncated {
                shape: "client",
                len: 0,
            });
        };
        match tag {
            tags::CLIENT_REQUEST => {
                if data.len() < CLIENT_REQUEST_MIN {
                    return Err(ProtocolError::Truncated {
                        shape: "client request",
                        len: data.len(),
                    });
                }
                Ok(Self::Request {
                    protocol_version: u16::from_le_bytes([data[1], data[2]]),
                    request_id: data[3],
                    session_identifier: data[CLIENT_REQUEST_MIN..].to_vec(),
                })
            }
            tags::DISCONNECT_FROM_CLIENT_REQUEST => {
                if data.len() < DISCONNECT_REQUEST_LEN {
                    return Err(ProtocolError::Truncated {
                        shape: "disconnect request",
                        len: data.len(),
                    });
                }
                Ok(Self::DisconnectRequest { client_id: data[1] })
            }
            tags::CLIENT_GAME_FRAME => {
                if data.len() < 2 {
                    return Err(ProtocolError::Truncated {
                        shape: "game frame",
                        len: data.len(),
                    });
                }
                if data.len() < CLIENT_GAME_FRAME_MIN {
                    return Err(ProtocolError::EmptyPayload);
                }
                Ok(Self::GameFrame {
                    client_id: data[1],
                    payload: data[2..].to_vec(),
                })
            }
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Host -> client
// ---------------------------------------------------------------------------

/// Packets sent from the host to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPacket {
    /// The host's reply to a [`ClientPacket::Request`], granting a client
    /// id. Carries back the request id so the client can reject replies
    /// to rounds it has since abandoned.
    ///
    /// Layout: `[tag][request_id: u8][client_id: u8]`.
    Accept { request_id: u8, client_id: u8 },

    /// One frame of opaque game data from the host.
    ///
    /// Layout: `[tag][payload..]`.
    GameFrame { payload: Vec<u8> },

    /// The host confirms our disconnect request; the connection can be
    /// torn down without waiting out the timeout.
    ///
    /// Layout: `[tag][client_id: u8]`.
    DisconnectAck { client_id: u8 },

    /// The host is dropping us.
    ///
    /// Layout: `[tag]`.
    DisconnectFromHost,
}

impl HostPacket {
    /// Serializes the packet into a fresh datagram buffer. Used by test
    /// harnesses that play the host side.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Accept {
                request_id,
                client_id,
            } => vec![tags::CLIENT_ACCEPT, *request_id, *client_id],
            Self::GameFrame { payload } => {
                let mut buf = Vec::with_capacity(1 + payload.len());
                buf.push(tags::HOST_GAME_FRAME);
                buf.extend_from_slice(payload);
                buf
            }
            Self::DisconnectAck { client_id } => {
                vec![tags::DISCONNECT_FROM_CLIENT_ACK, *client_id]
            }
            Self::DisconnectFromHost => vec![tags::DISCONNECT_FROM_HOST],
        }
    }

    /// Parses a datagram as a host packet.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let Some(&tag) = data.first() else {
            return Err(ProtocolError::Truncated {
                shape: "host",
                len: 0,
            });
        };
        match tag {
            tags::CLIENT_ACCEPT => {
                if data.len() < CLIENT_ACCEPT_MIN {
                    return Err(ProtocolError::Truncated {
                        shape: "client accept",
                        len: data.len(),
                    });
                }
                Ok(Self::Accept {
                    request_id: data[1],
                    client_id: data[2],
                })
            }
            tags::HOST_GAME_FRAME => {
                if data.len() < 2 {
                    return Err(ProtocolError::EmptyPayload);
                }
                Ok(Self::GameFrame {
                    payload: data[1..].to_vec(),
                })
            }
            tags::DISCONNECT_FROM_CLIENT_ACK => {
                if data.len() < DISCONNECT_ACK_LEN {
                    return Err(ProtocolError::Truncated {
                        shape: "disconnect ack",
                        len: data.len(),
                    });
                }
                Ok(Self::DisconnectAck { client_id: data[1] })
            }
            tags::DISCONNECT_FROM_HOST => Ok(Self::DisconnectFromHost),
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}
