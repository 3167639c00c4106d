//! Host-target interface (HTIF) engine and simulation driver.
//!
//! This crate implements the host-side control plane of an ISA simulator:
//! 1. **Protocol:** packet framing, lock-step command dispatch, and the
//!    control-register address gateway.
//! 2. **Driver:** target-memory allocation, core ownership, and the top-level
//!    loop interleaving protocol servicing with bounded execution bursts.
//! 3. **Channel:** blocking byte-channel transports (stdio, pseudo-terminal).
//! 4. **Caches:** `sets:ways:block` cache models wired as memory observers.
//!
//! Instruction execution itself lives behind the [`core::Processor`] trait;
//! this crate never decodes or executes target instructions.

/// Common constants and error types.
pub mod common;
/// Simulator configuration (defaults, serde structures).
pub mod config;
/// Processor abstraction and the behavioral placeholder core.
pub mod core;
/// Byte-channel transports and the pseudo-terminal bootstrap.
pub mod channel;
/// HTIF packet codec, address gateway, and command dispatcher.
pub mod htif;
/// Target memory buffer with shrink-and-retry allocation.
pub mod mem;
/// Cache models and memory-access observer wiring.
pub mod cache;
/// Simulation driver: machine context and top-level loop.
pub mod sim;

/// Protocol-violation error kinds; all fatal.
pub use crate::common::error::ProtocolError;
/// Top-level error type; use [`SimError::is_fatal`] to classify.
pub use crate::common::error::SimError;
/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// HTIF command dispatcher; owns the sequence counter and reset flag.
pub use crate::htif::Htif;
/// Simulation context owning target memory and cores.
pub use crate::sim::Machine;
/// Top-level driver; construct with [`Simulator::new`] and call `run`.
pub use crate::sim::Simulator;
