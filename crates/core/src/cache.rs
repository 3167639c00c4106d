//! Cache models and memory-access observer wiring.
//!
//! The control plane does not own cache policy; it only composes models and
//! attaches them to the memory path. A model is configured from a
//! `sets:ways:block-bytes` string (sets and block size powers of two), may
//! chain to a next-level model as its miss handler, and observes traffic
//! through the [`MemTracer`] callback the machine invokes on every access.

use std::cell::RefCell;
use std::rc::Rc;

use crate::common::error::SimError;

/// Observer invoked on every memory access of the engine it registered with.
pub trait MemTracer {
    /// Called once per access with the byte address, length, and direction.
    fn trace(&mut self, addr: u64, len: usize, store: bool);
}

/// Geometry of one cache model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheParams {
    /// Number of sets; power of two.
    pub sets: usize,
    /// Associativity.
    pub ways: usize,
    /// Block size in bytes; power of two.
    pub block_bytes: usize,
}

impl CacheParams {
    /// Parses a `sets:ways:block-bytes` specification string.
    pub fn parse(spec: &str) -> Result<Self, SimError> {
        let bad = |reason: &str| SimError::CacheSpec {
            spec: spec.to_owned(),
            reason: reason.to_owned(),
        };

        let mut fields = spec.split(':');
        let mut next = |name: &str| {
            fields
                .next()
                .and_then(|f| f.parse::<usize>().ok())
                .ok_or_else(|| bad(&format!("missing or non-numeric {name}")))
        };
        let sets = next("set count")?;
        let ways = next("way count")?;
        let block_bytes = next("block size")?;
        if fields.next().is_some() {
            return Err(bad("trailing fields"));
        }

        if !sets.is_power_of_two() {
            return Err(bad("set count must be a power of two"));
        }
        if !block_bytes.is_power_of_two() {
            return Err(bad("block size must be a power of two"));
        }
        if ways == 0 {
            return Err(bad("way count must be non-zero"));
        }
        Ok(Self {
            sets,
            ways,
            block_bytes,
        })
    }
}

/// A set-associative tag store with round-robin fill.
///
/// Tracks hits and misses only; replacement policy and timing belong to the
/// excluded cache collaborators. Misses forward to the configured next-level
/// model.
pub struct CacheSim {
    name: String,
    params: CacheParams,
    tags: Vec<Option<u64>>,
    fill: Vec<usize>,
    accesses: u64,
    misses: u64,
    stores: u64,
    miss_handler: Option<Rc<RefCell<CacheSim>>>,
}

impl std::fmt::Debug for CacheSim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSim")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("accesses", &self.accesses)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

impl CacheSim {
    /// Creates a model with the given geometry.
    pub fn new(params: CacheParams, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            params,
            tags: vec![None; params.sets * params.ways],
            fill: vec![0; params.sets],
            accesses: 0,
            misses: 0,
            stores: 0,
            miss_handler: None,
        }
    }

    /// Creates a model from a `sets:ways:block-bytes` string.
    pub fn from_spec(spec: &str, name: &str) -> Result<Self, SimError> {
        Ok(Self::new(CacheParams::parse(spec)?, name))
    }

    /// Installs the next-level model misses are forwarded to.
    pub fn set_miss_handler(&mut self, handler: Rc<RefCell<CacheSim>>) {
        self.miss_handler = Some(handler);
    }

    /// Model name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total accesses observed.
    pub const fn accesses(&self) -> u64 {
        self.accesses
    }

    /// Misses observed (and forwarded, when a handler is installed).
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Store accesses observed.
    pub const fn stores(&self) -> u64 {
        self.stores
    }

    /// Looks up one block address; returns whether it hit.
    pub fn access(&mut self, addr: u64, store: bool) -> bool {
        self.accesses += 1;
        if store {
            self.stores += 1;
        }

        let tag = addr / self.params.block_bytes as u64;
        let set = (tag % self.params.sets as u64) as usize;
        let ways = &mut self.tags[set * self.params.ways..(set + 1) * self.params.ways];
        if ways.contains(&Some(tag)) {
            return true;
        }

        self.misses += 1;
        ways[self.fill[set]] = Some(tag);
        self.fill[set] = (self.fill[set] + 1) % self.params.ways;
        if let Some(next) = &self.miss_handler {
            let _ = next.borrow_mut().access(addr, store);
        }
        false
    }
}

impl MemTracer for CacheSim {
    fn trace(&mut self, addr: u64, len: usize, store: bool) {
        let block = self.params.block_bytes as u64;
        let first = addr / block;
        let last = addr.saturating_add(len.saturating_sub(1) as u64) / block;
        for b in first..=last {
            let _ = self.access(b * block, store);
        }
    }
}
