//! Processor abstraction.
//!
//! Instruction decode and execution are external collaborators; the driver
//! and protocol layers only ever touch a core through the narrow
//! [`Processor`] surface. [`SoftCore`] is the built-in behavioral model: it
//! holds the control-register file and run state but executes nothing, which
//! is exactly what the control plane needs to be driven and tested.

use crate::common::constants::PCR_COUNT;

/// The surface a simulated core exposes to the control plane.
pub trait Processor {
    /// Advances the core by up to `n` instructions.
    fn step(&mut self, n: u64);
    /// Asserts (`true`) or deasserts (`false`) reset.
    fn reset(&mut self, active: bool);
    /// Whether the core is currently executing.
    fn running(&self) -> bool;
    /// Reads a control register by number.
    fn get_pcr(&self, regno: u64) -> u64;
    /// Writes a control register by number.
    fn set_pcr(&mut self, regno: u64, value: u64);
    /// Posts an inter-processor interrupt to this core.
    fn deliver_ipi(&mut self);
}

/// Behavioral placeholder core.
///
/// Comes up held in reset. Running state tracks the reset line: the core
/// runs from the moment the host releases reset until the host asserts it
/// again. `step` only accounts retired-instruction time.
#[derive(Debug)]
pub struct SoftCore {
    id: usize,
    pcr: [u64; PCR_COUNT],
    in_reset: bool,
    ipi_pending: bool,
    instret: u64,
}

impl SoftCore {
    /// Creates core number `id`, held in reset.
    pub const fn new(id: usize) -> Self {
        Self {
            id,
            pcr: [0; PCR_COUNT],
            in_reset: true,
            ipi_pending: false,
            instret: 0,
        }
    }

    /// This core's index.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Instructions accounted so far.
    pub const fn instret(&self) -> u64 {
        self.instret
    }

    /// Whether an IPI is pending delivery.
    pub const fn ipi_pending(&self) -> bool {
        self.ipi_pending
    }
}

impl Processor for SoftCore {
    fn step(&mut self, n: u64) {
        if !self.in_reset {
            self.instret += n;
        }
    }

    fn reset(&mut self, active: bool) {
        self.in_reset = active;
    }

    fn running(&self) -> bool {
        !self.in_reset
    }

    fn get_pcr(&self, regno: u64) -> u64 {
        usize::try_from(regno)
            .ok()
            .and_then(|r| self.pcr.get(r).copied())
            .unwrap_or(0)
    }

    fn set_pcr(&mut self, regno: u64, value: u64) {
        if let Some(reg) = usize::try_from(regno).ok().and_then(|r| self.pcr.get_mut(r)) {
            *reg = value;
        }
    }

    fn deliver_ipi(&mut self) {
        self.ipi_pending = true;
    }
}
