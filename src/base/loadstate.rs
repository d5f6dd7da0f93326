/// Coarse connection status reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No attempt in flight.
    #[default]
    Disconnected,

    /// Resolving, connecting, negotiating TLS or exchanging the upgrade.
    Connecting,

    /// Handshake validated, frames flow through the established peer.
    Connected,

    /// The last attempt failed and was torn down.
    Error,
}

/// The stage a connection attempt is currently waiting on.
/// This roughly matches net/base/load_states.h
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No attempt in flight.
    #[default]
    Idle,

    /// Waiting for the hostname lookup. No transport exists yet.
    ResolvingHost,

    /// Connecting to the host (TCP handshake).
    Connecting,

    /// Establishing an SSL connection.
    TlsHandshake,

    /// Sending the upgrade request.
    SendingRequest,

    /// Waiting for the server's upgrade response.
    WaitingForResponse,

    /// Handed off to the established peer.
    Established,
}
