//! Collaborator traits for the packet pipeline
//!
//! The injector never touches the wire itself. It hands bytes to an
//! [`ActiveResponse`] implementation, which owns transmission and session
//! teardown for the packet being processed.

/// Direction in which injected bytes travel, relative to the current packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendDirection {
    /// Same direction as the packet (packet came from the server)
    Forward,
    /// Opposite direction to the packet (packet came from the client)
    Reverse,
}

impl SendDirection {
    /// Direction that delivers bytes to the client for a packet sent by
    /// the server (`from_server`) or by the client.
    pub fn toward_client(from_server: bool) -> Self {
        if from_server { Self::Forward } else { Self::Reverse }
    }
}

/// Active-response hooks for the packet an injection is performed on.
///
/// Implement this trait for your packet pipeline (inline IPS, test harness)
/// to let the injector transmit a block page and end the session.
pub trait ActiveResponse {
    /// Transmit `data` in `direction`. Returns the number of bytes queued.
    fn send_data(&mut self, direction: SendDirection, data: &[u8]) -> usize;

    /// Block the rest of the session
    fn block_session(&mut self);

    /// Stop detection on the current packet
    fn disable_detection(&mut self);
}
