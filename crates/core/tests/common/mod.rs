//! Shared test infrastructure: scripted channels, request builders, and
//! machine constructors.

use std::io::{self, Read};

use htsim_core::Machine;
use htsim_core::channel::HostChannel;
use htsim_core::core::{Processor, SoftCore};
use htsim_core::htif::packet::{Command, HEADER_BYTES, PacketHeader};
use htsim_core::mem::TargetMemory;

/// A channel that replays a scripted request stream and captures every byte
/// the dispatcher sends back.
pub struct ScriptedChannel {
    input: io::Cursor<Vec<u8>>,
    /// Raw reply stream, acknowledgements and data interleaved.
    pub sent: Vec<u8>,
}

impl ScriptedChannel {
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            input: io::Cursor::new(script),
            sent: Vec::new(),
        }
    }

    /// Parses the reply stream into (ack header, data) pairs. Every
    /// acknowledgement is followed by `data_units * 8` bytes of data.
    pub fn replies(&self) -> Vec<(PacketHeader, Vec<u8>)> {
        let mut out = Vec::new();
        let mut rest = self.sent.as_slice();
        while !rest.is_empty() {
            let mut hdr = [0u8; HEADER_BYTES];
            hdr.copy_from_slice(&rest[..HEADER_BYTES]);
            let hdr = PacketHeader::decode(hdr).unwrap();
            let len = hdr.data_units as usize * 8;
            let data = rest[HEADER_BYTES..HEADER_BYTES + len].to_vec();
            rest = &rest[HEADER_BYTES + len..];
            out.push((hdr, data));
        }
        out
    }
}

impl HostChannel for ScriptedChannel {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sent.extend_from_slice(buf);
        Ok(())
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.input.read_exact(buf)
    }
}

/// Builds a correctly sequenced request stream.
pub struct Session {
    script: Vec<u8>,
    seqno: u8,
}

impl Session {
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            seqno: 1,
        }
    }

    fn push(&mut self, cmd: Command, units: u16, addr: u64, payload: &[u8]) -> &mut Self {
        let hdr = PacketHeader::new(cmd, self.seqno, units, addr);
        self.script.extend_from_slice(&hdr.encode());
        self.script.extend_from_slice(payload);
        self.seqno = self.seqno.wrapping_add(1);
        self
    }

    pub fn read_mem(&mut self, addr_units: u64, units: u16) -> &mut Self {
        self.push(Command::ReadMem, units, addr_units, &[])
    }

    pub fn write_mem(&mut self, addr_units: u64, words: &[u64]) -> &mut Self {
        let payload: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.push(Command::WriteMem, words.len() as u16, addr_units, &payload)
    }

    pub fn read_cr(&mut self, addr: u64) -> &mut Self {
        self.push(Command::ReadCr, 1, addr, &[])
    }

    pub fn write_cr(&mut self, addr: u64, value: u64) -> &mut Self {
        self.push(Command::WriteCr, 1, addr, &value.to_le_bytes())
    }

    /// Appends a raw header, for deliberately malformed requests.
    pub fn raw(&mut self, hdr: PacketHeader, payload: &[u8]) -> &mut Self {
        self.script.extend_from_slice(&hdr.encode());
        self.script.extend_from_slice(payload);
        self
    }

    pub fn channel(&self) -> ScriptedChannel {
        ScriptedChannel::new(self.script.clone())
    }
}

/// Encodes a control-register address.
pub fn cr_addr(core: u64, regno: u64) -> u64 {
    core << 20 | regno
}

/// A machine with `ncores` placeholder cores and 1 MB of target memory.
pub fn test_machine(ncores: usize) -> Machine {
    let mem = TargetMemory::allocate(1).unwrap();
    let cores = (0..ncores)
        .map(|i| Box::new(SoftCore::new(i)) as Box<dyn Processor>)
        .collect();
    Machine::new(mem, cores)
}
