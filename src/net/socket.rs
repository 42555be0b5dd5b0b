//! In-memory substitute for a stream socket: buffered send/recv, no real
//! I/O anywhere.

#![allow(missing_docs)]

/// Address family of the emulated socket; accepted for signature parity,
/// never validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    #[default]
    Inet,
    Inet6,
    Unix,
}

/// Socket type of the emulated socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketKind {
    #[default]
    Stream,
    Datagram,
}

/// Byte-buffer socket double. `sent_data` grows with every `send`;
/// `recv_data` is seeded by the test and consumed from the front.
#[derive(Debug, Default)]
pub struct SocketEmul {
    pub family: AddressFamily,
    pub kind: SocketKind,
    pub protocol: i32,
    pub recv_data: Vec<u8>,
    pub sent_data: Vec<u8>,
}

impl SocketEmul {
    #[must_use]
    pub fn new(family: AddressFamily, kind: SocketKind, protocol: i32) -> Self {
        Self {
            family,
            kind,
            protocol,
            recv_data: Vec::new(),
            sent_data: Vec::new(),
        }
    }

    /// Always succeeds; no address validation of any kind.
    pub fn connect(&mut self, address: &str) {
        tracing::debug!(address, "emulated connect");
    }

    /// Return up to `buf_size` bytes from the front of the receive buffer.
    ///
    /// Consumes `buf_size + 1` bytes, one more than it returns. The extra
    /// consumed byte is a long-standing quirk of this double that callers
    /// may rely on to swallow a trailing delimiter; flagged as a likely
    /// latent defect, do not fix without auditing every consumer.
    pub fn recv(&mut self, buf_size: usize) -> Vec<u8> {
        let returned: Vec<u8> = self.recv_data.iter().take(buf_size).copied().collect();
        let consumed = buf_size.saturating_add(1).min(self.recv_data.len());
        self.recv_data.drain(..consumed);
        tracing::debug!(bytes = returned.len(), "emulated recv");
        returned
    }

    /// Append to the sent buffer. Always a full send: no partial writes,
    /// no backpressure.
    pub fn send(&mut self, data: &[u8]) -> usize {
        self.sent_data.extend_from_slice(data);
        tracing::debug!(bytes = data.len(), "emulated send");
        data.len()
    }

    pub fn set_blocking(&mut self, state: bool) {
        tracing::debug!(state, "emulated setblocking");
    }

    #[must_use]
    pub fn fileno(&self) -> i32 {
        0
    }

    pub fn close(&mut self) {
        tracing::debug!("emulated close");
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressFamily, SocketEmul, SocketKind};

    #[test]
    fn send_appends_and_reports_full_length() {
        let mut sock = SocketEmul::default();
        assert_eq!(sock.send(b"hello "), 6);
        assert_eq!(sock.send(b"world"), 5);
        assert_eq!(sock.sent_data, b"hello world");
    }

    #[test]
    fn recv_consumes_one_byte_more_than_it_returns() {
        let mut sock = SocketEmul::new(AddressFamily::Inet, SocketKind::Stream, 0);
        sock.recv_data = b"abcdefgh".to_vec();

        let chunk = sock.recv(3);
        assert_eq!(chunk, b"abc");
        // The fourth byte is gone without ever being returned.
        assert_eq!(sock.recv_data, b"efgh");
    }

    #[test]
    fn recv_short_buffer_drains_everything() {
        let mut sock = SocketEmul::default();
        sock.recv_data = b"xy".to_vec();

        let chunk = sock.recv(10);
        assert_eq!(chunk, b"xy");
        assert!(sock.recv_data.is_empty());

        assert!(sock.recv(10).is_empty());
    }

    #[test]
    fn control_methods_are_noops() {
        let mut sock = SocketEmul::default();
        sock.connect("203.0.113.5:4444");
        sock.set_blocking(false);
        assert_eq!(sock.fileno(), 0);
        sock.close();
        assert!(sock.sent_data.is_empty());
    }
}
