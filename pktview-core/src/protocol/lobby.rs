//! Lobby protocol decoder.
//!
//! Matchmaking traffic before a client joins a realm. Opcodes and integers
//! are big-endian. Every message has a fixed shape, so all decoders here
//! are [`LayoutDecoder`]s.

use std::sync::Arc;

use super::{
    EnumType, FieldKind, Layout, LayoutDecoder, OpcodeRegistry, Protocol, RenderOptions, Width,
};
use crate::cursor::ByteOrder;
use crate::error::SetupError;

const ORDER: ByteOrder = ByteOrder::BigEndian;

crate::wire_enum! {
    /// Lobby message opcodes.
    pub enum LobbyOpcode: u16 {
        Hello = 0x0001,
        Heartbeat = 0x0002,
        RoomList = 0x0100,
        JoinRoom = 0x0101,
        Disconnect = 0x0200,
    }
}

crate::wire_enum! {
    pub enum RoomState: u8 {
        Open = 0,
        Full = 1,
        InGame = 2,
        Closed = 3,
    }
}

crate::wire_enum! {
    pub enum DisconnectReason: u16 {
        ClientQuit = 0,
        Timeout = 1,
        Kicked = 2,
        ServerShutdown = 3,
        VersionMismatch = 4,
    }
}

fn layouts() -> Vec<(LobbyOpcode, Layout)> {
    let room = Layout::new("Room")
        .field("id", FieldKind::U32)
        .field("name", FieldKind::PrefixedString(Width::U8))
        .field("players", FieldKind::U8)
        .field("capacity", FieldKind::U8)
        .field("state", FieldKind::Enum(Width::U8, EnumType::of::<RoomState>()));

    vec![
        (
            LobbyOpcode::Hello,
            Layout::new("Hello")
                .field("version", FieldKind::U16)
                .field("client", FieldKind::CString),
        ),
        (
            LobbyOpcode::Heartbeat,
            Layout::new("Heartbeat").field("tick", FieldKind::U32),
        ),
        (
            LobbyOpcode::RoomList,
            Layout::new("RoomList").field("rooms", FieldKind::List(Width::U8, Arc::new(room))),
        ),
        (
            LobbyOpcode::JoinRoom,
            Layout::new("JoinRoom")
                .field("room_id", FieldKind::U32)
                .field("password", FieldKind::PrefixedString(Width::U8)),
        ),
        (
            LobbyOpcode::Disconnect,
            Layout::new("Disconnect").field(
                "reason",
                FieldKind::Enum(Width::U16, EnumType::of::<DisconnectReason>()),
            ),
        ),
    ]
}

/// The lobby protocol.
#[derive(Debug)]
pub struct LobbyProtocol {
    registry: OpcodeRegistry,
}

impl LobbyProtocol {
    pub fn new() -> Result<Self, SetupError> {
        let mut builder = OpcodeRegistry::builder("lobby", ORDER);
        for (opcode, layout) in layouts() {
            builder = builder.register(opcode as u16, LayoutDecoder::new(layout, ORDER))?;
        }
        Ok(Self {
            registry: builder.build(),
        })
    }
}

impl Protocol for LobbyProtocol {
    fn name(&self) -> &'static str {
        "lobby"
    }

    fn display_name(&self) -> &'static str {
        "Lobby"
    }

    fn opcode_type(&self) -> Option<EnumType> {
        Some(EnumType::of::<LobbyOpcode>())
    }

    fn registry(&self) -> Option<&OpcodeRegistry> {
        Some(&self.registry)
    }

    fn render_options(&self) -> RenderOptions {
        // Room lists nest two levels deep.
        RenderOptions {
            indent_width: 2,
            hex_limit: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Direction;
    use crate::protocol::test_utils::{viewer_item, PayloadBuilder, TestViewer};
    use crate::protocol::FieldValue;

    fn parse(data: Vec<u8>) -> (String, bool) {
        let protocol: Arc<dyn Protocol> = Arc::new(LobbyProtocol::new().unwrap());
        let viewer = Arc::new(TestViewer::with_protocol(protocol));
        let (_viewer, item) = viewer_item(viewer, data, Direction::ToClient);
        let parser = item.parse().unwrap();
        (parser.parsed_text().to_string(), parser.parsing_error())
    }

    fn payload(opcode: LobbyOpcode) -> PayloadBuilder {
        PayloadBuilder::new(ORDER, opcode as u16)
    }

    #[test]
    fn test_opcode_is_big_endian() {
        let protocol = LobbyProtocol::new().unwrap();
        let registry = protocol.registry().unwrap();
        assert_eq!(registry.read_opcode(&[0x01, 0x00]), Some(LobbyOpcode::RoomList as u16));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_hello() {
        let (text, error) = parse(payload(LobbyOpcode::Hello).u16(3).cstring("pktview").build());
        assert!(!error);
        assert_eq!(
            text,
            "Hello\n  version = 3\n  client = \"pktview\"\n\nDecoder: Hello\n"
        );
    }

    #[test]
    fn test_room_list() {
        let data = payload(LobbyOpcode::RoomList)
            .u8(2)
            .u32(10)
            .str8("north")
            .u8(3)
            .u8(4)
            .u8(RoomState::Open as u8)
            .u32(11)
            .str8("south")
            .u8(4)
            .u8(4)
            .u8(RoomState::Full as u8)
            .build();
        let (text, error) = parse(data);

        assert!(!error, "{text}");
        assert!(text.starts_with("RoomList\n  rooms: 2 items\n    [0]: Room\n      id = 10\n"));
        assert!(text.contains("      name = \"south\"\n"));
        assert!(text.contains("      state = Full\n"));
    }

    #[test]
    fn test_room_list_count_overruns() {
        let data = payload(LobbyOpcode::RoomList).u8(200).u32(1).u8(5).u8(b'a').build();
        let (text, error) = parse(data);
        assert!(error);
        assert!(text.starts_with("Parse error: unexpected end of data"));
        assert!(text.contains("bytes read 8 of 9"));
    }

    #[test]
    fn test_disconnect_reason() {
        let protocol = LobbyProtocol::new().unwrap();
        let registry = protocol.registry().unwrap();
        let (result, consumed) = registry
            .decode(LobbyOpcode::Disconnect as u16, &[0x00, 0x04])
            .unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(
            result.unwrap().get("reason").and_then(FieldValue::enum_name),
            Some("VersionMismatch")
        );
    }

    #[test]
    fn test_short_packet() {
        let (text, error) = parse(vec![0x00]);
        assert_eq!(text, "");
        assert!(!error);
    }
}
