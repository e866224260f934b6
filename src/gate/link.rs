//! Duplex line link to the reader

use std::io;

/// The gatekeeper's view of the serial session.
///
/// `poll_line` blocks for at most one poll interval and yields one complete
/// line with its `\n` removed, or `None` if nothing complete arrived.
pub trait Link {
    fn poll_line(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Write and flush one response
    fn send(&mut self, data: &[u8]) -> io::Result<()>;
}
