//! Retry/timeout policy.
//!
//! A pure function of timestamps: given what has (not) happened recently,
//! decide the single action this tick takes. All of the endpoint's
//! temporal behavior lives here, where it can be tested without a clock,
//! a socket, or an endpoint.

/// How long to wait before re-sending a client-id request.
pub const CLIENT_ID_RETRY_MS: u64 = 500;

/// How long to wait before re-sending a disconnect request.
pub const DISCONNECT_RETRY_MS: u64 = 1_000;

/// Host silence tolerated once the connection is live.
pub const SILENCE_TIMEOUT_LIVE_MS: u64 = 10_000;

/// Host silence tolerated before the connection becomes live. Shorter:
/// an attempt that never got off the ground should fail fast.
pub const SILENCE_TIMEOUT_CONNECTING_MS: u64 = 5_000;

/// Everything the policy looks at. All timestamps are monotonic
/// milliseconds from the same clock as `now`.
#[derive(Debug, Clone, Copy)]
pub struct PolicyState {
    pub now: u64,
    /// The endpoint is in disconnect-handshake mode.
    pub errored: bool,
    /// The host has assigned a client id.
    pub has_client_id: bool,
    /// The connection counts as established (see `SessionHandler`).
    pub can_communicate: bool,
    pub last_client_id_request: u64,
    pub last_host_response: u64,
    pub last_disconnect_request: u64,
}

/// The single action a poll tick takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Nothing is due.
    Idle,
    /// Re-send the client-id request (caller stamps the request timer).
    SendClientIdRequest,
    /// Re-send the disconnect request (caller stamps the request timer).
    SendDisconnectRequest,
    /// The host has been silent too long, or there is no identity left to
    /// disconnect with. Tear the endpoint down.
    Timeout,
}

/// Evaluates the retry/timeout rules. Exactly one action is returned
/// per tick; the silence timeout is checked ahead of the retry rules so
/// that a retry due on the same tick can never mask a dead host. At
/// poll intervals longer than the retry window a retry is due on every
/// single tick, so any other ordering would starve the timeout forever.
pub fn evaluate(s: PolicyState) -> PollAction {
    // Rule 1: silence timeout. First, unconditionally; re-requesting
    // anything from a host this silent is pointless.
    let silence_limit = if s.can_communicate {
        SILENCE_TIMEOUT_LIVE_MS
    } else {
        SILENCE_TIMEOUT_CONNECTING_MS
    };
    if s.now.saturating_sub(s.last_host_response) > silence_limit {
        return PollAction::Timeout;
    }

    // Rule 2: keep asking for a client id until the host grants one.
    if !s.errored
        && !s.has_client_id
        && s.now.saturating_sub(s.last_client_id_request) > CLIENT_ID_RETRY_MS
    {
        return PollAction::SendClientIdRequest;
    }

    // Rule 3: drive the disconnect handshake. With no client id there is
    // nothing to hand the host, so give up immediately.
    if s.errored && s.now.saturating_sub(s.last_disconnect_request) > DISCONNECT_RETRY_MS {
        return if s.has_client_id {
            PollAction::SendDisconnectRequest
        } else {
            PollAction::Timeout
        };
    }

    PollAction::Idle
}
