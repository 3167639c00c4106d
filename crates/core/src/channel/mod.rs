//! Byte-channel transports between the host frontend and the simulator.
//!
//! The protocol engine only needs two blocking primitives over an established
//! duplex byte stream; how the bytes physically move (pipe, terminal) is a
//! transport concern behind [`HostChannel`].

/// Pseudo-terminal transport and attach handshake (unix only).
#[cfg(unix)]
pub mod pty;
/// Standard input/output transport, the default channel.
pub mod stdio;

use std::io;

pub use self::stdio::StdioChannel;

/// A blocking duplex byte channel.
pub trait HostChannel {
    /// Writes the whole buffer, blocking until every byte is accepted.
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Fills the whole buffer, blocking until every byte arrives.
    ///
    /// A channel that closes before the buffer fills must fail with
    /// [`io::ErrorKind::UnexpectedEof`].
    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;
}

impl HostChannel for Box<dyn HostChannel> {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).send(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (**self).recv_exact(buf)
    }
}
