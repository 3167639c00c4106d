//! Configuration for the simulation driver.
//!
//! A small serde structure in the usual shape: a `defaults` module holds the
//! baseline values, per-field default functions wire them into
//! deserialization, and `Default` mirrors them for programmatic use. The CLI
//! fills the same struct from flags; embedders can deserialize it from JSON.

use serde::Deserialize;

/// Baseline configuration values.
mod defaults {
    /// Simulate one core unless told otherwise.
    pub const NPROCS: usize = 1;

    /// Target memory request in megabytes; zero selects the platform
    /// default.
    pub const MEM_MB: usize = 0;
}

/// Root configuration for one simulation run.
///
/// # Examples
///
/// ```
/// use htsim_core::config::SimConfig;
///
/// let config = SimConfig::from_json(r#"{ "nprocs": 2, "mem_mb": 64 }"#).unwrap();
/// assert_eq!(config.nprocs, 2);
/// assert_eq!(config.mem_mb, 64);
/// assert!(!config.debug);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Number of simulated cores.
    #[serde(default = "SimConfig::default_nprocs")]
    pub nprocs: usize,

    /// Target memory in megabytes; 0 means the platform default.
    #[serde(default = "SimConfig::default_mem_mb")]
    pub mem_mb: usize,

    /// Interactive mode: service the protocol without free-running bursts.
    #[serde(default)]
    pub debug: bool,

    /// Expose the protocol endpoint on a pseudo-terminal.
    #[serde(default)]
    pub pty: bool,

    /// Instruction-cache model spec (`sets:ways:block-bytes`).
    #[serde(default)]
    pub icache: Option<String>,

    /// Data-cache model spec (`sets:ways:block-bytes`).
    #[serde(default)]
    pub dcache: Option<String>,

    /// Shared L2 model spec (`sets:ways:block-bytes`).
    #[serde(default)]
    pub l2: Option<String>,
}

impl SimConfig {
    /// Deserializes a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the default core count.
    fn default_nprocs() -> usize {
        defaults::NPROCS
    }

    /// Returns the default memory request in megabytes.
    fn default_mem_mb() -> usize {
        defaults::MEM_MB
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nprocs: defaults::NPROCS,
            mem_mb: defaults::MEM_MB,
            debug: false,
            pty: false,
            icache: None,
            dcache: None,
            l2: None,
        }
    }
}
