//! Parser contract tests against custom protocols built on the public API.

use std::sync::Arc;

use pktview_core::cursor::Cursor;
use pktview_core::error::{DecodeError, DecodeResult};
use pktview_core::protocol::{FieldKind, Layout, LayoutDecoder, Width};
use pktview_core::{
    ByteOrder, Direction, Dissector, FieldValue, MemoryLog, Packet, PacketFlags, ParseState,
    PayloadDecoder, Protocol, Record, ViewerSession,
};

/// Decoder selected by the first byte of the packet, for exercising each outcome.
struct ScriptedDecoder;

impl PayloadDecoder for ScriptedDecoder {
    fn type_name(&self) -> &'static str {
        "ScriptedDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        match cursor.read_u8()? {
            0 => Ok(Record::new("Nothing")),
            1 => Err(DecodeError::invalid("mode", "rejected")),
            2 => panic!("scripted panic"),
            n => Ok(Record::new("Value").with("n", FieldValue::UInt8(n))),
        }
    }
}

/// Whole packet goes to one decoder, no opcode header.
struct Scripted;

impl Protocol for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn select_dissector(&self, _packet: &Packet) -> Dissector {
        Dissector::Fixed(Arc::new(ScriptedDecoder))
    }
}

fn parse_one(protocol: Arc<dyn Protocol>, data: &[u8]) -> (String, bool) {
    let log = Arc::new(MemoryLog::new("contract"));
    log.push(Arc::new(Packet::new(
        data.to_vec(),
        Direction::ToServer,
        PacketFlags::NONE,
    )));
    let session = ViewerSession::new(log, Some(protocol));
    session.sync_items().unwrap();

    let item = session.item(0).unwrap();
    let parser = Arc::clone(item.parser().unwrap());
    assert_eq!(parser.state(), ParseState::Unparsed);
    parser.parse();
    assert_eq!(parser.state(), ParseState::Parsed);
    assert_eq!(session.parsed_count(), 1);
    (parser.parsed_text().to_string(), parser.parsing_error())
}

#[test]
fn test_success_with_footer() {
    let (text, error) = parse_one(Arc::new(Scripted), &[7]);
    assert!(!error);
    assert_eq!(text, "Value\n  n = 7\n\nDecoder: ScriptedDecoder\n");
}

#[test]
fn test_decoder_error_is_folded_into_text() {
    let (text, error) = parse_one(Arc::new(Scripted), &[1]);
    assert!(error);
    assert!(text.starts_with("Parse error: invalid mode: rejected\n"));
    assert!(text.ends_with("\nDecoder: ScriptedDecoder\n"));
}

#[test]
fn test_decoder_panic_is_contained() {
    let (text, error) = parse_one(Arc::new(Scripted), &[2, 0]);
    assert!(error);
    assert!(text.contains("decoder panicked: scripted panic"));
    assert!(text.contains("bytes read 1 of 2"));
}

#[test]
fn test_empty_and_fieldless_outputs() {
    // Empty packet: the read fails, so an error is reported.
    let (text, error) = parse_one(Arc::new(Scripted), &[]);
    assert!(error);
    assert!(text.starts_with("Parse error: unexpected end of data"));

    // Record without fields from a non-empty packet is a content mismatch.
    let (text, error) = parse_one(Arc::new(Scripted), &[0]);
    assert!(!error);
    assert_eq!(text, "(error: packet should be empty)\n\nDecoder: ScriptedDecoder\n");
}

#[test]
fn test_layout_protocol_from_outside_the_crate() {
    struct Framed {
        decoder: Arc<dyn PayloadDecoder>,
    }

    impl Protocol for Framed {
        fn name(&self) -> &'static str {
            "framed"
        }

        fn select_dissector(&self, packet: &Packet) -> Dissector {
            if packet.is_empty() {
                Dissector::Undefined
            } else {
                Dissector::Fixed(Arc::clone(&self.decoder))
            }
        }
    }

    let layout = Layout::new("Frame")
        .field("kind", FieldKind::U8)
        .field("label", FieldKind::PrefixedString(Width::U16))
        .field("tail", FieldKind::Rest);
    let framed = Arc::new(Framed {
        decoder: Arc::new(LayoutDecoder::new(layout, ByteOrder::BigEndian)),
    });

    let (text, error) = parse_one(framed.clone(), &[1, 0, 2, b'o', b'k', 0xAA]);
    assert!(!error);
    assert_eq!(
        text,
        "Frame\n  kind = 1\n  label = \"ok\"\n  tail = aa\n\nDecoder: Frame\n"
    );

    let (text, error) = parse_one(framed, &[]);
    assert_eq!(text, "");
    assert!(!error);
}
