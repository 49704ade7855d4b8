//! The minimal receive capability the completion driver needs from a transport.

use std::io;
use std::io::Read;

/// Something bytes can be received from.
///
/// Every [`std::io::Read`] is a socket, so a `TcpStream`, a file or a byte
/// slice can be handed to [`Message::complete_from`](crate::protocol::Message::complete_from)
/// directly.
pub trait Socket {
    /// Receives into `buf`, returning how many bytes were written. `Ok(0)` means the peer is done.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Read + ?Sized> Socket for T {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Whether a receive failure may go away by trying again.
///
/// Would-block, timed-out and interrupted receives are retryable, everything
/// else is fatal.
pub fn is_retryable(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(is_retryable(io::ErrorKind::WouldBlock));
        assert!(is_retryable(io::ErrorKind::TimedOut));
        assert!(is_retryable(io::ErrorKind::Interrupted));
        assert!(!is_retryable(io::ErrorKind::ConnectionReset));
        assert!(!is_retryable(io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn readers_are_sockets() {
        let mut source: &[u8] = b"abc";
        let mut buf = [0u8; 2];
        assert_eq!(source.receive(&mut buf).unwrap(), 2);
        assert_eq!(source.receive(&mut buf).unwrap(), 1);
        assert_eq!(source.receive(&mut buf).unwrap(), 0);
    }
}
