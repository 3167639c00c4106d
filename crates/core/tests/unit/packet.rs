//! Packet header codec tests.

use pretty_assertions::assert_eq;
use rstest::rstest;

use htsim_core::ProtocolError;
use htsim_core::htif::packet::{Command, PacketHeader, read_payload};

use crate::common::ScriptedChannel;

#[rstest]
#[case(Command::ReadMem, 1, 0, 0)]
#[case(Command::WriteMem, 0xFF, 0xFFF, 0xFF_FFFF_FFFF)]
#[case(Command::ReadCr, 42, 1, (0xFFFFF << 20) | 1)]
#[case(Command::Ack, 200, 3, 0x1234_5678)]
fn header_roundtrips_every_field(
    #[case] cmd: Command,
    #[case] seqno: u8,
    #[case] units: u16,
    #[case] addr: u64,
) {
    let hdr = PacketHeader::new(cmd, seqno, units, addr);
    let decoded = PacketHeader::decode(hdr.encode()).unwrap();
    assert_eq!(decoded, hdr);
    assert_eq!(decoded.cmd, cmd);
    assert_eq!(decoded.seqno, seqno);
    assert_eq!(decoded.data_units, units);
    assert_eq!(decoded.addr, addr);
}

#[test]
fn unknown_command_codes_fail_decode() {
    let mut bytes = PacketHeader::new(Command::ReadMem, 1, 0, 0).encode();
    bytes[0] |= 0xE; // corrupt the command nibble
    assert!(matches!(
        PacketHeader::decode(bytes),
        Err(ProtocolError::UnknownCommand(0xE))
    ));
}

#[rstest]
#[case(Command::ReadMem, 4, 0)]
#[case(Command::WriteMem, 4, 32)]
#[case(Command::ReadCr, 1, 0)]
#[case(Command::WriteCr, 1, 8)]
fn request_payload_follows_the_command_kind(
    #[case] cmd: Command,
    #[case] units: u16,
    #[case] expected: usize,
) {
    let hdr = PacketHeader::new(cmd, 1, units, 0);
    assert_eq!(hdr.request_payload_bytes(), expected);
}

#[test]
fn oversized_payload_declarations_are_rejected() {
    let mut channel = ScriptedChannel::new(Vec::new());
    assert!(matches!(
        read_payload(&mut channel, 40_000),
        Err(ProtocolError::PayloadTooLarge(40_000))
    ));
}

#[test]
fn short_payload_read_is_a_framing_error() {
    let mut channel = ScriptedChannel::new(vec![0u8; 4]);
    assert!(matches!(
        read_payload(&mut channel, 8),
        Err(ProtocolError::Framing(_))
    ));
}
