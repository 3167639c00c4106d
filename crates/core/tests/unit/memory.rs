//! Target memory allocation and access tests.

use pretty_assertions::assert_eq;

use htsim_core::mem::{TargetMemory, page_size};

#[test]
fn allocation_rounds_to_the_page_quantum() {
    let mem = TargetMemory::allocate(1).unwrap();
    assert!(mem.len() > 0);
    assert_eq!(mem.len() % page_size(), 0);
    assert_eq!(mem.len(), 1 << 20);
}

#[test]
fn words_roundtrip_at_byte_offsets() {
    let mem = TargetMemory::allocate(1).unwrap();
    mem.store_u64(0, u64::MAX);
    mem.store_u64(8, 0x0102_0304_0506_0708);
    assert_eq!(mem.load_u64(0), u64::MAX);
    assert_eq!(mem.load_u64(8), 0x0102_0304_0506_0708);
    // Fresh anonymous mappings read as zero.
    assert_eq!(mem.load_u64(16), 0);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn out_of_bounds_reads_panic() {
    let mem = TargetMemory::allocate(1).unwrap();
    let _ = mem.load_u64(mem.len() as u64);
}

#[test]
fn page_size_is_sane() {
    let quantum = page_size();
    assert!(quantum >= 4096);
    assert!(quantum.is_power_of_two());
}
