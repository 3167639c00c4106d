//! Cache model tests: spec parsing, lookup behavior, and miss chaining.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rstest::rstest;

use htsim_core::SimError;
use htsim_core::cache::{CacheParams, CacheSim, MemTracer};

#[test]
fn well_formed_specs_parse() {
    let params = CacheParams::parse("64:4:32").unwrap();
    assert_eq!(
        params,
        CacheParams {
            sets: 64,
            ways: 4,
            block_bytes: 32
        }
    );
}

#[rstest]
#[case("63:4:32")] // sets not a power of two
#[case("64:4:33")] // block not a power of two
#[case("64:0:32")] // zero ways
#[case("64:4")] // missing field
#[case("64:4:32:1")] // trailing field
#[case("sixty:4:32")] // non-numeric
fn malformed_specs_are_rejected(#[case] spec: &str) {
    assert!(matches!(
        CacheParams::parse(spec),
        Err(SimError::CacheSpec { .. })
    ));
}

#[test]
fn repeated_access_hits_after_the_first_miss() {
    let mut cache = CacheSim::from_spec("16:2:64", "D$").unwrap();
    assert!(!cache.access(0x1000, false));
    assert!(cache.access(0x1000, false));
    assert!(cache.access(0x1020, true)); // same block
    assert_eq!(cache.accesses(), 3);
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.stores(), 1);
}

#[test]
fn misses_forward_to_the_miss_handler_once() {
    let l2 = Rc::new(RefCell::new(CacheSim::from_spec("64:8:64", "L2$").unwrap()));
    let mut l1 = CacheSim::from_spec("1:1:64", "D$").unwrap();
    l1.set_miss_handler(l2.clone());

    let _ = l1.access(0x0, false);
    let _ = l1.access(0x0, false); // hit, nothing forwarded
    let _ = l1.access(0x40, false); // evicts, forwarded

    assert_eq!(l1.misses(), 2);
    assert_eq!(l2.borrow().accesses(), 2);
}

#[test]
fn traces_spanning_blocks_touch_each_block() {
    let mut cache = CacheSim::from_spec("16:1:8", "I$").unwrap();
    cache.trace(4, 8, false); // straddles two 8-byte blocks
    assert_eq!(cache.accesses(), 2);
    cache.trace(0, 1, false);
    assert_eq!(cache.accesses(), 3);
}
