//! Address-space gateway.
//!
//! Memory commands address in fixed 8-byte units; control-register commands
//! encode `(core index, register number)` with the register number in the
//! low 20 bits. An all-ones core field selects the system control register
//! space instead of any core.

use crate::common::constants::{HTIF_DATA_ALIGN, PCR_REG_BITS, SYSTEM_CORE_ID};
use crate::common::error::ProtocolError;

/// Resolved destination of a control-register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcrTarget {
    /// A register on one core.
    Core {
        /// Core index, validated against the machine's core count.
        core: usize,
        /// Register number within the core.
        regno: u64,
    },
    /// A system control register, not tied to any core.
    System {
        /// Register index within the system space.
        regno: u64,
    },
}

/// Converts a memory address in alignment units to a byte offset.
pub const fn mem_offset(addr_units: u64) -> u64 {
    addr_units * HTIF_DATA_ALIGN
}

/// Decodes a control-register address.
///
/// Rejects core indices outside `[0, num_cores)` unless the field is the
/// system sentinel, which routes to system registers regardless of the
/// register-number bits.
pub fn decode_pcr_addr(addr: u64, num_cores: usize) -> Result<PcrTarget, ProtocolError> {
    let core = addr >> PCR_REG_BITS;
    let regno = addr & ((1 << PCR_REG_BITS) - 1);

    if core == SYSTEM_CORE_ID {
        Ok(PcrTarget::System { regno })
    } else if (core as usize) < num_cores {
        Ok(PcrTarget::Core {
            core: core as usize,
            regno,
        })
    } else {
        Err(ProtocolError::CoreOutOfRange { core, num_cores })
    }
}
