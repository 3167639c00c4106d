//! The simulation context.
//!
//! One `Machine` owns the target's mutable state for a whole run: the memory
//! region, every core, and the registered memory-access observers. The
//! protocol dispatcher executes against it through [`HtifTarget`] and never
//! sees the concrete type; cores are reached only through the
//! [`Processor`] trait.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cache::MemTracer;
use crate::common::constants::{SCR_CORE_COUNT, SCR_INVALID, SCR_MEM_MB};
use crate::core::Processor;
use crate::htif::HtifTarget;
use crate::mem::TargetMemory;

/// Target-side state of one simulation run.
pub struct Machine {
    mem: TargetMemory,
    cores: Vec<Box<dyn Processor>>,
    tracers: Vec<Rc<RefCell<dyn MemTracer>>>,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("mem_bytes", &self.mem.len())
            .field("cores", &self.cores.len())
            .field("tracers", &self.tracers.len())
            .finish()
    }
}

impl Machine {
    /// Builds a machine from an allocated memory region and a set of cores.
    pub fn new(mem: TargetMemory, cores: Vec<Box<dyn Processor>>) -> Self {
        Self {
            mem,
            cores,
            tracers: Vec::new(),
        }
    }

    /// Registers a memory-access observer on the shared memory engine.
    pub fn register_tracer(&mut self, tracer: Rc<RefCell<dyn MemTracer>>) {
        self.tracers.push(tracer);
    }

    /// Posts an inter-processor interrupt; out-of-range targets are dropped.
    pub fn send_ipi(&mut self, who: u64) {
        if let Some(core) = usize::try_from(who).ok().and_then(|i| self.cores.get_mut(i)) {
            core.deliver_ipi();
        }
    }

    /// Borrows core `i` for stepping.
    pub fn core_mut(&mut self, i: usize) -> &mut dyn Processor {
        &mut *self.cores[i]
    }

    fn trace(&self, addr: u64, len: usize, store: bool) {
        for tracer in &self.tracers {
            tracer.borrow_mut().trace(addr, len, store);
        }
    }
}

impl HtifTarget for Machine {
    fn num_cores(&self) -> usize {
        self.cores.len()
    }

    fn mem_size(&self) -> usize {
        self.mem.len()
    }

    fn core_running(&self, core: usize) -> bool {
        self.cores[core].running()
    }

    fn load_word(&mut self, byte_offset: u64) -> u64 {
        let word = self.mem.load_u64(byte_offset);
        self.trace(byte_offset, 8, false);
        word
    }

    fn store_word(&mut self, byte_offset: u64, value: u64) {
        self.mem.store_u64(byte_offset, value);
        self.trace(byte_offset, 8, true);
    }

    fn get_pcr(&self, core: usize, regno: u64) -> u64 {
        self.cores[core].get_pcr(regno)
    }

    fn set_pcr(&mut self, core: usize, regno: u64, value: u64) {
        self.cores[core].set_pcr(regno, value);
    }

    fn reset_core(&mut self, core: usize, active: bool) {
        self.cores[core].reset(active);
    }

    fn read_scr(&self, regno: u64) -> u64 {
        match regno {
            SCR_CORE_COUNT => self.cores.len() as u64,
            SCR_MEM_MB => (self.mem.len() >> 20) as u64,
            _ => SCR_INVALID,
        }
    }
}
