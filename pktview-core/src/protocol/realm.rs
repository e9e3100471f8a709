//! Realm protocol decoder.
//!
//! In-game traffic between client and realm server. Every packet starts with
//! a little-endian 2-byte opcode; strings are length-prefixed with a
//! little-endian `u16`.

use compact_str::CompactString;

use super::{
    EnumType, FieldValue, Layout, LayoutDecoder, OpcodeRegistry, PayloadDecoder, Protocol,
    Record,
};
use crate::cursor::{ByteOrder, Cursor};
use crate::error::{DecodeError, DecodeResult, SetupError};

/// Realm opcodes are little-endian.
const ORDER: ByteOrder = ByteOrder::LittleEndian;

/// Longest chat message the server accepts.
const MAX_CHAT_LEN: usize = 512;

crate::wire_enum! {
    /// Realm message opcodes.
    pub enum RealmOpcode: u16 {
        Ping = 0x0001,
        /// Server reply to Ping. Carries no client-visible data and has no decoder.
        Pong = 0x0002,
        ChatMessage = 0x0003,
        MoveUpdate = 0x0004,
        LogoutRequest = 0x0005,
    }
}

crate::wire_enum! {
    /// Chat channel of a message.
    pub enum ChatChannel: u8 {
        Say = 0,
        Yell = 1,
        Whisper = 2,
        Guild = 3,
        System = 4,
    }
}

bitflags::bitflags! {
    /// Movement state bits of a MoveUpdate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MovementFlags: u32 {
        const FORWARD = 0x0001;
        const BACKWARD = 0x0002;
        const STRAFE_LEFT = 0x0004;
        const STRAFE_RIGHT = 0x0008;
        const JUMPING = 0x0010;
        const SWIMMING = 0x0020;
    }
}

/// Ping: sequence number and last measured latency.
#[derive(Debug, Clone, Copy)]
struct PingDecoder;

impl PayloadDecoder for PingDecoder {
    fn type_name(&self) -> &'static str {
        "PingDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        let sequence = cursor.read_u32(ORDER)?;
        let latency = cursor.read_u32(ORDER)?;
        Ok(Record::new("Ping")
            .with("sequence", FieldValue::UInt32(sequence))
            .with("latency_ms", FieldValue::UInt32(latency)))
    }
}

#[derive(Debug, Clone, Copy)]
struct ChatMessageDecoder;

impl ChatMessageDecoder {
    fn read_text(cursor: &mut Cursor<'_>, field: &'static str) -> DecodeResult<CompactString> {
        let len = cursor.read_u16(ORDER)? as usize;
        if len > MAX_CHAT_LEN {
            return Err(DecodeError::invalid(
                field,
                format!("length {len} exceeds {MAX_CHAT_LEN}"),
            ));
        }
        Ok(CompactString::new(cursor.read_str(len, field)?))
    }
}

impl PayloadDecoder for ChatMessageDecoder {
    fn type_name(&self) -> &'static str {
        "ChatMessageDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        let channel = cursor.read_u8()?;
        let mut record = Record::new("ChatMessage").with(
            "channel",
            FieldValue::enumeration::<ChatChannel>(channel as u64),
        );

        // Only whispers name a recipient.
        if channel == ChatChannel::Whisper as u8 {
            let target = cursor.read_cstring("target")?;
            record.push("target", FieldValue::string(target));
        }

        let text = Self::read_text(cursor, "text")?;
        record.push("text", FieldValue::String(text));
        Ok(record)
    }
}

#[derive(Debug, Clone, Copy)]
struct MoveUpdateDecoder;

impl PayloadDecoder for MoveUpdateDecoder {
    fn type_name(&self) -> &'static str {
        "MoveUpdateDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        let flags = MovementFlags::from_bits_retain(cursor.read_u32(ORDER)?);

        let mut position = Record::new("Position");
        for axis in ["x", "y", "z"] {
            position.push(axis, FieldValue::Float(cursor.read_f32(ORDER)? as f64));
        }
        let orientation = cursor.read_f32(ORDER)?;

        let mut record = Record::new("MoveUpdate")
            .with("flags", FieldValue::flags(flags))
            .with("position", FieldValue::record(position))
            .with("orientation", FieldValue::Float(orientation as f64));

        if flags.contains(MovementFlags::JUMPING) {
            record.push("fall_time", FieldValue::UInt32(cursor.read_u32(ORDER)?));
        }
        Ok(record)
    }
}

/// The realm protocol.
#[derive(Debug)]
pub struct RealmProtocol {
    registry: OpcodeRegistry,
}

impl RealmProtocol {
    pub fn new() -> Result<Self, SetupError> {
        let registry = OpcodeRegistry::builder("realm", ORDER)
            .register(RealmOpcode::Ping as u16, PingDecoder)?
            .register(RealmOpcode::ChatMessage as u16, ChatMessageDecoder)?
            .register(RealmOpcode::MoveUpdate as u16, MoveUpdateDecoder)?
            .register(
                RealmOpcode::LogoutRequest as u16,
                LayoutDecoder::new(Layout::new("LogoutRequest"), ORDER),
            )?
            .build();
        Ok(Self { registry })
    }
}

impl Protocol for RealmProtocol {
    fn name(&self) -> &'static str {
        "realm"
    }

    fn display_name(&self) -> &'static str {
        "Realm"
    }

    fn opcode_type(&self) -> Option<EnumType> {
        Some(EnumType::of::<RealmOpcode>())
    }

    fn registry(&self) -> Option<&OpcodeRegistry> {
        Some(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Direction;
    use crate::protocol::test_utils::{viewer_item, PayloadBuilder, TestViewer};
    use crate::protocol::WireEnum;
    use std::sync::Arc;

    fn parse(data: Vec<u8>) -> (String, bool, Vec<Record>) {
        let protocol: Arc<dyn Protocol> = Arc::new(RealmProtocol::new().unwrap());
        let viewer = Arc::new(TestViewer::with_protocol(protocol));
        let (_viewer, item) = viewer_item(viewer, data, Direction::ToServer);
        let parser = item.parse().unwrap();
        (
            parser.parsed_text().to_string(),
            parser.parsing_error(),
            parser.contained_data().to_vec(),
        )
    }

    fn payload(opcode: RealmOpcode) -> PayloadBuilder {
        PayloadBuilder::new(ORDER, opcode as u16)
    }

    #[test]
    fn test_ping() {
        let data = payload(RealmOpcode::Ping).u32(42).u32(87).build();
        assert_eq!(&data[..2], &[0x01, 0x00]);

        let (text, error, records) = parse(data);
        assert!(!error);
        assert_eq!(
            text,
            "Ping\n  sequence = 42\n  latency_ms = 87\n\nDecoder: PingDecoder\n"
        );
        assert_eq!(records[0].get("sequence"), Some(&FieldValue::UInt32(42)));
    }

    #[test]
    fn test_ping_with_trailing_bytes() {
        let data = payload(RealmOpcode::Ping).u32(1).u32(2).u16(0xBEEF).build();
        let (text, error, _) = parse(data);
        assert!(error);
        assert!(text.ends_with("Warning: bytes read 10 of 12\n"));
    }

    #[test]
    fn test_chat_whisper() {
        let data = payload(RealmOpcode::ChatMessage)
            .u8(ChatChannel::Whisper as u8)
            .cstring("Thrall")
            .str16("for the horde")
            .build();
        let (text, error, records) = parse(data);

        assert!(!error, "{text}");
        assert!(text.contains("  channel = Whisper\n"));
        assert!(text.contains("  target = \"Thrall\"\n"));
        assert!(text.contains("  text = \"for the horde\"\n"));
        assert_eq!(records[0].get("channel").and_then(FieldValue::enum_name), Some("Whisper"));
    }

    #[test]
    fn test_chat_unknown_channel_and_oversized_text() {
        let data = payload(RealmOpcode::ChatMessage).u8(9).str16("hi").build();
        let (text, error, _) = parse(data);
        assert!(!error);
        assert!(text.contains("channel = Unknown(9)"));

        let data = payload(RealmOpcode::ChatMessage).u8(0).u16(1000).build();
        let (text, error, records) = parse(data);
        assert!(error);
        assert!(text.contains("Parse error: invalid text: length 1000 exceeds 512"));
        assert!(records.is_empty());
    }

    #[test]
    fn test_move_update() {
        let flags = MovementFlags::FORWARD | MovementFlags::JUMPING;
        let data = payload(RealmOpcode::MoveUpdate)
            .u32(flags.bits())
            .f32(1.5)
            .f32(-2.0)
            .f32(0.25)
            .f32(3.0)
            .u32(120)
            .build();
        let (text, error, _) = parse(data);

        assert!(!error, "{text}");
        assert!(text.contains("  flags = FORWARD | JUMPING\n"));
        assert!(text.contains("  position: Position\n    x = 1.5\n    y = -2\n    z = 0.25\n"));
        assert!(text.contains("  fall_time = 120\n"));
    }

    #[test]
    fn test_move_update_truncated() {
        let data = payload(RealmOpcode::MoveUpdate).u32(0).f32(1.0).build();
        let (text, error, _) = parse(data);
        assert!(error);
        assert!(text.contains("unexpected end of data at offset 8"));
        // Every byte was consumed before the read failed, so no audit line.
        assert!(!text.contains("bytes read"));
    }

    #[test]
    fn test_logout_has_no_fields() {
        let (text, error, records) = parse(payload(RealmOpcode::LogoutRequest).build());
        assert!(!error);
        assert_eq!(text, "(packet is empty)\n\nDecoder: LogoutRequest\n");
        assert!(records.is_empty());

        let (text, error, _) = parse(payload(RealmOpcode::LogoutRequest).u8(9).u8(9).build());
        assert!(error);
        assert_eq!(
            text,
            "(error: packet should be empty)\n\nDecoder: LogoutRequest\nWarning: bytes read 2 of 4\n"
        );
    }

    #[test]
    fn test_pong_has_no_decoder() {
        let (text, error, records) = parse(payload(RealmOpcode::Pong).u32(1).build());
        assert_eq!(text, "");
        assert!(!error);
        assert!(records.is_empty());
        assert_eq!(RealmOpcode::from_raw(2), Some(RealmOpcode::Pong));
    }
}
