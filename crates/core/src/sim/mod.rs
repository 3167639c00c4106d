//! Simulation driver.
//!
//! [`Machine`] is the simulation context: it owns target memory and every
//! core, and implements the capability interface the protocol dispatcher
//! executes against. [`Simulator`] owns a machine and a dispatcher side by
//! side and runs the top-level loop.

/// The simulation context: target memory, cores, observers.
pub mod machine;
/// The top-level driver loop.
pub mod simulator;

pub use machine::Machine;
pub use simulator::Simulator;
