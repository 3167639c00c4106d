//! HTIF packet header codec and framing helpers.
//!
//! A header is a single little-endian 64-bit word, packed:
//!
//! | bits  | field           |
//! |-------|-----------------|
//! | 3:0   | command code    |
//! | 15:4  | data unit count |
//! | 23:16 | sequence number |
//! | 63:24 | address         |
//!
//! Payload length is derived from the command kind, never trusted blindly:
//! write commands carry `data units × 8` bytes after the header, everything
//! else carries none. A reply to a read carries its data after a separate
//! acknowledgement header.

use crate::channel::HostChannel;
use crate::common::constants::{HTIF_DATA_ALIGN, MAX_PAYLOAD_BYTES};
use crate::common::error::ProtocolError;

/// Size of an encoded packet header on the wire.
pub const HEADER_BYTES: usize = 8;

const CMD_BITS: u32 = 4;
const UNITS_BITS: u32 = 12;
const SEQNO_BITS: u32 = 8;

/// HTIF command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Host reads words from target memory.
    ReadMem = 0,
    /// Host writes words into target memory.
    WriteMem = 1,
    /// Host reads one control register.
    ReadCr = 2,
    /// Host writes one control register.
    WriteCr = 3,
    /// Acknowledgement reply.
    Ack = 4,
    /// Negative acknowledgement reply.
    Nack = 5,
}

impl Command {
    /// Decodes a wire command code.
    pub const fn from_raw(raw: u8) -> Result<Self, ProtocolError> {
        match raw {
            0 => Ok(Self::ReadMem),
            1 => Ok(Self::WriteMem),
            2 => Ok(Self::ReadCr),
            3 => Ok(Self::WriteCr),
            4 => Ok(Self::Ack),
            5 => Ok(Self::Nack),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

/// A decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Command kind.
    pub cmd: Command,
    /// Lock-step sequence number.
    pub seqno: u8,
    /// Number of 8-byte units in the associated data.
    pub data_units: u16,
    /// Memory address in alignment units, or an encoded control-register
    /// address.
    pub addr: u64,
}

impl PacketHeader {
    /// Builds a header, truncating each field to its wire width.
    pub const fn new(cmd: Command, seqno: u8, data_units: u16, addr: u64) -> Self {
        Self {
            cmd,
            seqno,
            data_units: data_units & ((1 << UNITS_BITS) - 1),
            addr: addr & ((1 << (64 - CMD_BITS - UNITS_BITS - SEQNO_BITS)) - 1),
        }
    }

    /// Packs the header into its wire form.
    pub const fn encode(&self) -> [u8; HEADER_BYTES] {
        let word = self.cmd as u64
            | (self.data_units as u64) << CMD_BITS
            | (self.seqno as u64) << (CMD_BITS + UNITS_BITS)
            | self.addr << (CMD_BITS + UNITS_BITS + SEQNO_BITS);
        word.to_le_bytes()
    }

    /// Unpacks a header from its wire form.
    pub fn decode(bytes: [u8; HEADER_BYTES]) -> Result<Self, ProtocolError> {
        let word = u64::from_le_bytes(bytes);
        let cmd = Command::from_raw((word & ((1 << CMD_BITS) - 1)) as u8)?;
        Ok(Self {
            cmd,
            data_units: (word >> CMD_BITS & ((1 << UNITS_BITS) - 1)) as u16,
            seqno: (word >> (CMD_BITS + UNITS_BITS) & ((1 << SEQNO_BITS) - 1)) as u8,
            addr: word >> (CMD_BITS + UNITS_BITS + SEQNO_BITS),
        })
    }

    /// Bytes of payload following this header on a request.
    pub const fn request_payload_bytes(&self) -> usize {
        match self.cmd {
            Command::WriteMem | Command::WriteCr => {
                self.data_units as usize * HTIF_DATA_ALIGN as usize
            }
            _ => 0,
        }
    }
}

/// Reads exactly one header from the channel.
pub fn read_header<C: HostChannel>(channel: &mut C) -> Result<PacketHeader, ProtocolError> {
    let mut bytes = [0u8; HEADER_BYTES];
    channel.recv_exact(&mut bytes)?;
    PacketHeader::decode(bytes)
}

/// Reads exactly `len` payload bytes, bounds-checked against the cap.
///
/// No partial packet is ever exposed: a short read surfaces as a framing
/// error and the buffer is dropped.
pub fn read_payload<C: HostChannel>(channel: &mut C, len: usize) -> Result<Vec<u8>, ProtocolError> {
    if len > MAX_PAYLOAD_BYTES {
        return Err(ProtocolError::PayloadTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    if len > 0 {
        channel.recv_exact(&mut payload)?;
    }
    Ok(payload)
}
