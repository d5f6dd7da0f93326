//! Handoff from the handshake to the frame transport.

use super::message::CloseCode;
use crate::socket::stream::StreamPeer;

/// Bytes of framing overhead reserved out of the output buffer.
pub const PROTO_SIZE: usize = 8;

/// Which end of the connection a peer plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Client,
    Server,
}

/// Power-of-two size classes for the peer's queues.
///
/// Each field is an exponent: a buffer of `1 << in_buffer` bytes, a queue
/// of `1 << in_packets` messages, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    pub in_buffer: u32,
    pub in_packets: u32,
    pub out_buffer: u32,
    pub out_packets: u32,
}

impl Default for BufferSizes {
    fn default() -> Self {
        // 64 KiB buffers, 1024 packets each way.
        Self {
            in_buffer: 16,
            in_packets: 10,
            out_buffer: 16,
            out_packets: 10,
        }
    }
}

/// Number of bits needed to represent `n` (0 for 0).
pub fn nearest_shift(n: u32) -> u32 {
    u32::BITS - n.leading_zeros()
}

impl BufferSizes {
    /// Size classes from kibibyte buffer sizes and packet counts, rounding up
    /// to the next power of two.
    pub fn from_limits(in_kb: u32, in_packets: u32, out_kb: u32, out_packets: u32) -> Self {
        Self {
            in_buffer: nearest_shift(in_kb.saturating_sub(1)) + 10,
            in_packets: nearest_shift(in_packets.saturating_sub(1)),
            out_buffer: nearest_shift(out_kb.saturating_sub(1)) + 10,
            out_packets: nearest_shift(out_packets.saturating_sub(1)),
        }
    }

    pub fn in_buffer_bytes(&self) -> usize {
        1usize << self.in_buffer
    }

    pub fn in_packet_limit(&self) -> usize {
        1usize << self.in_packets
    }

    pub fn out_buffer_bytes(&self) -> usize {
        1usize << self.out_buffer
    }

    pub fn out_packet_limit(&self) -> usize {
        1usize << self.out_packets
    }

    /// Largest payload that fits the output buffer.
    pub fn max_packet_size(&self) -> usize {
        self.out_buffer_bytes().saturating_sub(PROTO_SIZE)
    }
}

/// Everything a frame transport needs to take over a validated connection.
pub struct PeerContext {
    pub role: PeerRole,
    pub id: u32,
    pub stream: Box<dyn StreamPeer>,
    pub buffers: BufferSizes,
}

impl std::fmt::Debug for PeerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerContext")
            .field("role", &self.role)
            .field("id", &self.id)
            .field("buffers", &self.buffers)
            .finish_non_exhaustive()
    }
}

/// The post-handshake frame transport.
///
/// After [`make_context`](EstablishedPeer::make_context) the peer owns the
/// stream exclusively; the client only polls, queries and closes it.
pub trait EstablishedPeer: Send {
    fn make_context(&mut self, context: PeerContext);

    fn poll(&mut self);

    fn is_connected(&self) -> bool;

    /// Close code received from the remote end, if any.
    fn close_code(&self) -> Option<u16>;

    /// Start a close handshake.
    fn close(&mut self, code: CloseCode, reason: &str);
}

/// Hand a validated stream to `peer` as client peer 1.
pub fn hand_off(peer: &mut dyn EstablishedPeer, mut stream: Box<dyn StreamPeer>, buffers: BufferSizes) {
    // Frame writes favour latency over throughput.
    if let Err(e) = stream.set_no_delay(true) {
        tracing::warn!(error = %e, "failed to disable write coalescing");
    }
    peer.make_context(PeerContext {
        role: PeerRole::Client,
        id: 1,
        stream,
        buffers,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_shift() {
        assert_eq!(nearest_shift(0), 0);
        assert_eq!(nearest_shift(1), 1);
        assert_eq!(nearest_shift(63), 6);
        assert_eq!(nearest_shift(64), 7);
        assert_eq!(nearest_shift(1023), 10);
    }

    #[test]
    fn test_from_limits_matches_defaults() {
        assert_eq!(BufferSizes::from_limits(64, 1024, 64, 1024), BufferSizes::default());
    }

    #[test]
    fn test_sizes() {
        let sizes = BufferSizes::default();
        assert_eq!(sizes.in_buffer_bytes(), 65536);
        assert_eq!(sizes.in_packet_limit(), 1024);
        assert_eq!(sizes.max_packet_size(), 65536 - PROTO_SIZE);
    }
}
