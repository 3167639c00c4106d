//! Common types and constants shared across the protocol and driver layers.

/// Wire-protocol and driver constants.
pub mod constants;
/// Error taxonomy: fatal protocol violations vs. recoverable conditions.
pub mod error;
