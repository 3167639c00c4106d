//! Configuration tests.

use pretty_assertions::assert_eq;

use htsim_core::SimConfig;

#[test]
fn empty_json_yields_the_defaults() {
    let config = SimConfig::from_json("{}").unwrap();
    assert_eq!(config.nprocs, 1);
    assert_eq!(config.mem_mb, 0);
    assert!(!config.debug);
    assert!(!config.pty);
    assert!(config.icache.is_none());
    assert!(config.dcache.is_none());
    assert!(config.l2.is_none());
}

#[test]
fn full_json_roundtrips_every_field() {
    let config = SimConfig::from_json(
        r#"{
            "nprocs": 4,
            "mem_mb": 256,
            "debug": true,
            "pty": true,
            "icache": "64:2:64",
            "dcache": "64:4:64",
            "l2": "512:8:64"
        }"#,
    )
    .unwrap();
    assert_eq!(config.nprocs, 4);
    assert_eq!(config.mem_mb, 256);
    assert!(config.debug);
    assert!(config.pty);
    assert_eq!(config.icache.as_deref(), Some("64:2:64"));
    assert_eq!(config.dcache.as_deref(), Some("64:4:64"));
    assert_eq!(config.l2.as_deref(), Some("512:8:64"));
}

#[test]
fn programmatic_default_matches_the_json_default() {
    let a = SimConfig::default();
    let b = SimConfig::from_json("{}").unwrap();
    assert_eq!(a.nprocs, b.nprocs);
    assert_eq!(a.mem_mb, b.mem_mb);
    assert_eq!(a.debug, b.debug);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(SimConfig::from_json("{ nprocs: }").is_err());
}
