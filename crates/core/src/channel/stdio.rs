//! Standard input/output byte channel.
//!
//! The default transport: the host frontend runs the simulator as a child
//! process and speaks the protocol over its stdin/stdout pair. Diagnostics
//! go to stderr so the stream stays clean.

use std::io::{self, Read, Write};

use super::HostChannel;

/// Byte channel over the process's standard streams.
#[derive(Debug, Default)]
pub struct StdioChannel;

impl StdioChannel {
    /// Creates the stdio channel.
    pub const fn new() -> Self {
        Self
    }
}

impl HostChannel for StdioChannel {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        io::stdin().lock().read_exact(buf)
    }
}
