//! HTIF protocol engine.
//!
//! The dispatcher runs one command per cycle through a fixed state machine:
//! wait for a header, validate the sequence number, execute, acknowledge,
//! advance the counter. It is stateless across cycles except for the
//! sequence counter and the run-level reset flag.
//!
//! The dispatcher never sees the driver's concrete type: it executes against
//! the narrow [`HtifTarget`] capability interface, which exposes exactly the
//! state the protocol may touch.

/// Control-register address decoding and memory-unit translation.
pub mod addr;
/// Packet header codec and framing helpers.
pub mod packet;

use tracing::trace;

use crate::channel::HostChannel;
use crate::common::constants::{HTIF_DATA_ALIGN, PCR_FROMHOST, PCR_RESET, PCR_TOHOST};
use crate::common::error::ProtocolError;

use self::addr::{PcrTarget, decode_pcr_addr, mem_offset};
use self::packet::{Command, PacketHeader, read_header, read_payload};

/// Capability interface the dispatcher executes commands against.
///
/// Implemented by the simulation context ([`crate::sim::Machine`]); the
/// dispatcher holds no reference to the context and is handed one per tick,
/// so the borrow never outlives a single command.
pub trait HtifTarget {
    /// Number of cores in the machine.
    fn num_cores(&self) -> usize;
    /// Target memory size in bytes; memory commands are validated against it.
    fn mem_size(&self) -> usize;
    /// Whether the given core currently reports itself running.
    fn core_running(&self, core: usize) -> bool;
    /// Loads an aligned 8-byte word from target memory at a byte offset.
    fn load_word(&mut self, byte_offset: u64) -> u64;
    /// Stores an aligned 8-byte word to target memory at a byte offset.
    fn store_word(&mut self, byte_offset: u64, value: u64);
    /// Reads a per-core control register.
    fn get_pcr(&self, core: usize, regno: u64) -> u64;
    /// Writes a per-core control register.
    fn set_pcr(&mut self, core: usize, regno: u64, value: u64);
    /// Asserts or deasserts reset on the given core.
    fn reset_core(&mut self, core: usize, active: bool);
    /// Reads a system control register; undefined indices return a sentinel.
    fn read_scr(&self, regno: u64) -> u64;
}

/// The HTIF command dispatcher.
///
/// Owns the byte channel, the lock-step sequence counter, and the run-level
/// reset flag. One [`Htif::tick`] services protocol requests until the target
/// has been taken out of reset at least once in this call.
#[derive(Debug)]
pub struct Htif<C> {
    channel: C,
    seqno: u8,
    reset: bool,
}

impl<C: HostChannel> Htif<C> {
    /// Creates a dispatcher over an established duplex byte channel.
    pub const fn new(channel: C) -> Self {
        Self {
            channel,
            seqno: 1,
            reset: true,
        }
    }

    /// Whether the target is still waiting for its first reset-off write.
    pub const fn reset_pending(&self) -> bool {
        self.reset
    }

    /// Consumes the dispatcher and returns the underlying channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Services protocol requests: at least one command, and as many more as
    /// it takes for the reset flag to clear.
    ///
    /// While the target is held in reset there is nothing to execute, so the
    /// host is given the channel until it releases the cores.
    pub fn tick<M: HtifTarget>(&mut self, machine: &mut M) -> Result<(), ProtocolError> {
        loop {
            self.tick_once(machine)?;
            if !self.reset {
                return Ok(());
            }
        }
    }

    /// The completion predicate for the whole simulation.
    ///
    /// Never true while the reset flag holds, regardless of core state; after
    /// that, true iff every core reports not-running.
    pub fn done<M: HtifTarget>(&self, machine: &M) -> bool {
        if self.reset {
            return false;
        }
        (0..machine.num_cores()).all(|i| !machine.core_running(i))
    }

    /// Runs one full command cycle: header, sequence check, execute,
    /// acknowledge, advance.
    pub fn tick_once<M: HtifTarget>(&mut self, machine: &mut M) -> Result<(), ProtocolError> {
        let hdr = read_header(&mut self.channel)?;
        if hdr.seqno != self.seqno {
            return Err(ProtocolError::SequenceMismatch {
                got: hdr.seqno,
                expected: self.seqno,
            });
        }
        let payload = read_payload(&mut self.channel, hdr.request_payload_bytes())?;
        trace!(
            cmd = ?hdr.cmd,
            seqno = hdr.seqno,
            units = hdr.data_units,
            addr = hdr.addr,
            "htif request"
        );

        match hdr.cmd {
            Command::ReadMem => self.read_mem(machine, &hdr)?,
            Command::WriteMem => self.write_mem(machine, &hdr, &payload)?,
            Command::ReadCr | Command::WriteCr => self.control_reg(machine, &hdr, &payload)?,
            Command::Ack | Command::Nack => {
                return Err(ProtocolError::UnknownCommand(hdr.cmd as u8));
            }
        }

        self.seqno = self.seqno.wrapping_add(1);
        Ok(())
    }

    /// Streams `data_units` words out of target memory, acknowledgement first.
    fn read_mem<M: HtifTarget>(
        &mut self,
        machine: &mut M,
        hdr: &PacketHeader,
    ) -> Result<(), ProtocolError> {
        check_mem_range(machine, hdr)?;
        self.send_ack(hdr.data_units)?;

        let mut data = Vec::with_capacity(hdr.data_units as usize * HTIF_DATA_ALIGN as usize);
        for i in 0..u64::from(hdr.data_units) {
            let word = machine.load_word(mem_offset(hdr.addr + i));
            data.extend_from_slice(&word.to_le_bytes());
        }
        self.channel.send(&data)?;
        Ok(())
    }

    /// Writes payload words into target memory in ascending index order.
    fn write_mem<M: HtifTarget>(
        &mut self,
        machine: &mut M,
        hdr: &PacketHeader,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        check_mem_range(machine, hdr)?;
        for (i, chunk) in payload.chunks_exact(HTIF_DATA_ALIGN as usize).enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            machine.store_word(mem_offset(hdr.addr + i as u64), u64::from_le_bytes(word));
        }
        self.send_ack(0)
    }

    /// Control-register read/write: resolves the address, acknowledges with
    /// the old value, then applies side effects.
    fn control_reg<M: HtifTarget>(
        &mut self,
        machine: &mut M,
        hdr: &PacketHeader,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        if hdr.data_units != 1 {
            return Err(ProtocolError::ControlUnitCount(hdr.data_units));
        }

        let target = decode_pcr_addr(hdr.addr, machine.num_cores())?;

        let (core, regno) = match target {
            PcrTarget::System { regno } => {
                // System registers are read-only.
                if hdr.cmd == Command::WriteCr {
                    return Err(ProtocolError::SystemRegisterWrite);
                }
                self.send_ack(1)?;
                let scr = machine.read_scr(regno);
                self.channel.send(&scr.to_le_bytes())?;
                return Ok(());
            }
            PcrTarget::Core { core, regno } => (core, regno),
        };

        self.send_ack(1)?;
        let old_val = machine.get_pcr(core, regno);
        self.channel.send(&old_val.to_le_bytes())?;

        // The to-host latch drains on any access that observed it.
        if regno == PCR_TOHOST {
            machine.set_pcr(core, PCR_TOHOST, 0);
        }

        if hdr.cmd == Command::WriteCr {
            let mut word = [0u8; 8];
            word.copy_from_slice(&payload[..8]);
            let new_val = u64::from_le_bytes(word);

            if regno == PCR_RESET {
                if self.reset && new_val & 1 == 0 {
                    self.reset = false;
                }
                machine.reset_core(core, new_val & 1 != 0);
            } else if regno == PCR_FROMHOST && old_val != 0 {
                // Back-pressure: the target has not consumed the previous
                // value, so the host's write is dropped.
            } else {
                machine.set_pcr(core, regno, new_val);
            }
        }
        Ok(())
    }

    fn send_ack(&mut self, units: u16) -> Result<(), ProtocolError> {
        let ack = PacketHeader::new(Command::Ack, self.seqno, units, 0);
        self.channel.send(&ack.encode())?;
        Ok(())
    }
}

/// Validates a memory command against the mapped memory size before any word
/// moves. The mapping may be smaller than requested, so the wire address is
/// never trusted.
fn check_mem_range<M: HtifTarget>(machine: &M, hdr: &PacketHeader) -> Result<(), ProtocolError> {
    let offset = mem_offset(hdr.addr);
    let len = u64::from(hdr.data_units) * HTIF_DATA_ALIGN;
    let in_range = offset
        .checked_add(len)
        .is_some_and(|end| end <= machine.mem_size() as u64);
    if in_range {
        Ok(())
    } else {
        Err(ProtocolError::MemoryOutOfRange {
            offset,
            len,
            mem_bytes: machine.mem_size(),
        })
    }
}
