//! Top-level driver: owns the machine and the dispatcher side by side.
//!
//! Keeping the two halves as siblings is what lets one borrow the other per
//! tick: the dispatcher never stores a reference into the machine, it is
//! handed one for the duration of a single protocol action.

use tracing::{debug, info};

use crate::channel::HostChannel;
use crate::common::constants::{BURST_INSTRUCTIONS, BURST_INTERLEAVE};
use crate::common::error::SimError;
use crate::config::SimConfig;
use crate::core::{Processor, SoftCore};
use crate::htif::{Htif, HtifTarget};
use crate::mem::TargetMemory;
use crate::sim::Machine;

/// The simulation driver.
#[derive(Debug)]
pub struct Simulator<C> {
    /// Target-side state; public so callers can wire cache observers.
    pub machine: Machine,
    htif: Htif<C>,
    debug: bool,
}

impl<C: HostChannel> Simulator<C> {
    /// Allocates target memory, constructs the cores, and attaches the
    /// dispatcher to an established channel.
    ///
    /// # Errors
    ///
    /// Fails only when target memory cannot be allocated at any size.
    pub fn new(config: &SimConfig, channel: C) -> Result<Self, SimError> {
        let mem = TargetMemory::allocate(config.mem_mb)?;
        let cores = (0..config.nprocs)
            .map(|i| Box::new(SoftCore::new(i)) as Box<dyn Processor>)
            .collect();
        info!(
            cores = config.nprocs,
            mem_mb = mem.len() >> 20,
            "machine constructed"
        );
        Ok(Self {
            machine: Machine::new(mem, cores),
            htif: Htif::new(channel),
            debug: config.debug,
        })
    }

    /// Runs the simulation to completion.
    ///
    /// Free-run mode alternates one protocol service with one bounded
    /// execution burst; interactive mode services the protocol only, so the
    /// external host single-steps the target through control-register
    /// commands. Either way the loop ends when the completion predicate
    /// holds: the target has been released from reset at least once and
    /// every core reports not-running.
    pub fn run(&mut self) -> Result<(), SimError> {
        while !self.htif.done(&self.machine) {
            if self.debug {
                self.htif.tick(&mut self.machine)?;
            } else {
                self.step_all(BURST_INSTRUCTIONS, BURST_INTERLEAVE)?;
            }
        }
        debug!("all cores halted; simulation done");
        Ok(())
    }

    /// One burst: a single protocol service, then every core advanced
    /// round-robin in `interleave`-sized chunks up to `n` instructions.
    pub fn step_all(&mut self, n: u64, interleave: u64) -> Result<(), SimError> {
        self.htif.tick(&mut self.machine)?;
        let mut stepped = 0;
        while stepped < n {
            for i in 0..self.machine.num_cores() {
                self.machine.core_mut(i).step(interleave);
            }
            stepped += interleave;
        }
        Ok(())
    }

    /// Whether the completion predicate currently holds.
    pub fn done(&self) -> bool {
        self.htif.done(&self.machine)
    }
}
