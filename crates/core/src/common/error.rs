//! Error taxonomy for the protocol engine and simulation driver.
//!
//! Two classes exist and they never mix:
//! 1. **Protocol violations** ([`ProtocolError`]) — the two peers are
//!    generated from the same contract, so any divergence means the channel
//!    or one side is broken beyond repair. Always fatal; there is no error
//!    reply packet kind to report them over the wire.
//! 2. **Recoverable conditions** — memory exhaustion degrades by shrinking,
//!    pseudo-terminal failure falls back to stdio. Resolved locally with a
//!    diagnostic.

use thiserror::Error;

use super::constants::MAX_PAYLOAD_BYTES;

/// A violation of the HTIF wire contract. Every variant is fatal.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The channel closed or failed mid-packet; no partial packet is exposed.
    #[error("channel failed mid-packet: {0}")]
    Framing(#[from] std::io::Error),

    /// The header carried a command code outside the defined set.
    #[error("unrecognized command code {0:#x}")]
    UnknownCommand(u8),

    /// Lock-step sequencing broke: the peer skipped, repeated, or reordered.
    #[error("sequence number {got} does not match expected {expected}")]
    SequenceMismatch {
        /// Sequence number carried by the incoming header.
        got: u8,
        /// Sequence number the dispatcher expected.
        expected: u8,
    },

    /// A control-register command must address exactly one register.
    #[error("control-register command carries {0} data units, expected 1")]
    ControlUnitCount(u16),

    /// The decoded core index is neither a valid core nor the system sentinel.
    #[error("core index {core} out of range for {num_cores} cores")]
    CoreOutOfRange {
        /// Core index decoded from the control-register address.
        core: u64,
        /// Number of cores the machine was built with.
        num_cores: usize,
    },

    /// System control registers are read-only; a write addressed the sentinel.
    #[error("write addressed to the system control register space")]
    SystemRegisterWrite,

    /// The header declared a payload larger than the engine will buffer.
    #[error("declared payload of {0} bytes exceeds the {MAX_PAYLOAD_BYTES}-byte cap")]
    PayloadTooLarge(usize),

    /// A memory command addressed past the end of target memory.
    #[error("memory access at byte offset {offset} ({len} bytes) exceeds the {mem_bytes}-byte target memory")]
    MemoryOutOfRange {
        /// Starting byte offset of the access.
        offset: u64,
        /// Length of the access in bytes.
        len: u64,
        /// Size the target memory was actually mapped at.
        mem_bytes: usize,
    },
}

/// Top-level error type for the simulation driver.
#[derive(Debug, Error)]
pub enum SimError {
    /// Wire-contract violation; terminates the run.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// Target memory could not be allocated even after shrinking to zero.
    #[error("could not allocate target memory (requested {requested} bytes)")]
    OutOfMemory {
        /// Size originally requested, before any shrinking.
        requested: usize,
    },

    /// Pseudo-terminal bootstrap failed; callers fall back to stdio.
    #[error("pseudo-terminal setup failed: {0}")]
    Bootstrap(String),

    /// A `sets:ways:block` cache specification did not parse or validate.
    #[error("bad cache spec '{spec}': {reason}")]
    CacheSpec {
        /// The specification string as given.
        spec: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl SimError {
    /// Whether this error terminates the run.
    ///
    /// Bootstrap failures are recoverable (the caller degrades to the default
    /// channel); everything else is fatal by the time it reaches a caller —
    /// memory exhaustion has already exhausted its shrink retries.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Bootstrap(_))
    }
}
