//! Protocol and driver constants.
//!
//! The wire-level values (alignment, command codes, header field widths) are
//! fixed by the HTIF contract; both peers are generated from the same tables,
//! so any change here is a protocol break.

/// Byte stride addressed by one memory-command unit.
pub const HTIF_DATA_ALIGN: u64 = 8;

/// Hard cap on a single request payload. The 12-bit unit-count field already
/// bounds payloads below this; the cap stands on its own so no buffer is ever
/// sized from an unchecked wire field.
pub const MAX_PAYLOAD_BYTES: usize = 32 * 1024;

/// Width of the register-number field in a control-register address.
pub const PCR_REG_BITS: u32 = 20;

/// Core-index value selecting the system control register space.
pub const SYSTEM_CORE_ID: u64 = 0xFFFFF;

/// Control register number of the target-to-host notification latch.
pub const PCR_TOHOST: u64 = 16;
/// Control register number of the host-to-target notification latch.
pub const PCR_FROMHOST: u64 = 17;
/// Control register number of the per-core reset register.
pub const PCR_RESET: u64 = 29;

/// Number of control registers modeled per core.
pub const PCR_COUNT: usize = 32;

/// System control register index reporting the core count.
pub const SCR_CORE_COUNT: u64 = 0;
/// System control register index reporting memory size in megabytes.
pub const SCR_MEM_MB: u64 = 1;
/// Value returned for any undefined system control register index.
pub const SCR_INVALID: u64 = u64::MAX;

/// Instructions executed per core between two protocol servicing points.
pub const BURST_INSTRUCTIONS: u64 = 10_000;
/// Round-robin interleave chunk within one burst.
pub const BURST_INTERLEAVE: u64 = 1_000;

/// Target memory shrink ratio numerator (retry at size * 10 / 11).
pub const MEM_SHRINK_NUM: usize = 10;
/// Target memory shrink ratio denominator.
pub const MEM_SHRINK_DEN: usize = 11;

/// Default target memory size when none is configured.
pub const DEFAULT_MEM_BYTES: usize = if usize::BITS == 64 {
    1 << 32
} else {
    1 << 30
};
