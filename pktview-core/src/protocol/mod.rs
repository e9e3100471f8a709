//! Protocol decoding framework.
//!
//! This module provides:
//! - [`Protocol`] trait, the factory that creates a [`Parser`] per item
//! - [`OpcodeRegistry`] mapping 2-byte opcode headers to [`PayloadDecoder`]s
//! - [`Layout`]-driven decoders for fixed-shape messages
//! - [`Record`] and [`FieldValue`], the decoded form of a message
//! - Built-in protocols, found through [`protocol_types`]
//!
//! ## Built-in Protocols
//!
//! | Name | Routing | Byte order |
//! |------|---------|------------|
//! | realm | opcode header | little-endian |
//! | lobby | opcode header | big-endian |
//! | line | by direction | text |
//!
//! ## Example
//!
//! ```rust
//! use pktview_core::protocol::find_protocol;
//!
//! let realm = find_protocol("realm").unwrap().unwrap();
//! let opcodes = realm.opcode_type().unwrap();
//! assert_eq!(opcodes.variant_name(0x0001), Some("Ping"));
//! ```

mod field;
mod layout;
mod registry;
mod wire_enum;

// Protocol implementations
mod line;
mod lobby;
mod realm;

// Test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

pub use field::{EnumValue, FieldEntry, FieldValue, FlagsValue, Record, RenderOptions};
pub use layout::{FieldKind, Layout, LayoutDecoder, Width};
pub use line::{CommandDecoder, LineProtocol, ReplyClass, ReplyDecoder};
pub use lobby::{DisconnectReason, LobbyOpcode, LobbyProtocol, RoomState};
pub use realm::{ChatChannel, MovementFlags, RealmOpcode, RealmProtocol};
pub use registry::{
    decode_payload, OpcodeRegistry, PayloadDecoder, RegistryBuilder, OPCODE_HEADER_SIZE,
};
pub use wire_enum::{EnumType, WireEnum};

use crate::error::SetupError;
use crate::item::ViewerItem;
use crate::packet::Packet;
use crate::parser::{Dissector, Parser};
use crate::plugin::{Candidate, PluginDiscovery, PluginType};

/// A protocol: chooses how each packet of a log is decoded.
///
/// Implementors are plugins; they must be constructible without arguments
/// to be found by [`protocol_types`].
pub trait Protocol: Send + Sync {
    /// Short identifier (e.g. "realm").
    fn name(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Enum of this protocol's opcodes, `None` if it has none.
    fn opcode_type(&self) -> Option<EnumType> {
        None
    }

    /// Opcode registry, for opcode-routed protocols.
    fn registry(&self) -> Option<&OpcodeRegistry> {
        None
    }

    /// Rendering settings for parsed text.
    fn render_options(&self) -> RenderOptions {
        RenderOptions::default()
    }

    /// Choose the decoder for a packet.
    ///
    /// The default routes through [`registry`](Self::registry); without a
    /// registry every packet is undefined.
    fn select_dissector(&self, packet: &Packet) -> Dissector {
        match self.registry() {
            Some(registry) => Dissector::route(registry, packet.data()),
            None => Dissector::Undefined,
        }
    }

    /// Create the parser for an item.
    fn create_parser(&self, item: &Arc<ViewerItem>) -> Parser {
        let dissector = self.select_dissector(item.packet());
        Parser::new(item, dissector, self.render_options())
    }
}

fn new_realm() -> Result<Box<dyn Protocol>, SetupError> {
    Ok(Box::new(RealmProtocol::new()?))
}

fn new_lobby() -> Result<Box<dyn Protocol>, SetupError> {
    Ok(Box::new(LobbyProtocol::new()?))
}

fn new_line() -> Result<Box<dyn Protocol>, SetupError> {
    Ok(Box::new(LineProtocol::new()))
}

/// Types shipped with the crate, as seen by protocol discovery.
pub static BUILTIN_TYPES: [Candidate<dyn Protocol>; 6] = [
    Candidate::Implements {
        type_name: "RealmProtocol",
        constructor: Some(new_realm),
    },
    Candidate::Implements {
        type_name: "LobbyProtocol",
        constructor: Some(new_lobby),
    },
    Candidate::Implements {
        type_name: "LineProtocol",
        constructor: Some(new_line),
    },
    Candidate::Unrelated {
        type_name: "OpcodeRegistry",
    },
    Candidate::Unrelated {
        type_name: "LayoutDecoder",
    },
    Candidate::Unrelated {
        type_name: "ViewerSession",
    },
];

static PROTOCOLS: PluginDiscovery<dyn Protocol> = PluginDiscovery::new();

/// Built-in protocol types. Discovered once per process.
pub fn protocol_types() -> &'static [PluginType<dyn Protocol>] {
    PROTOCOLS.discover(&BUILTIN_TYPES)
}

/// Fresh instances of every built-in protocol.
pub fn create_protocols() -> Result<Vec<Box<dyn Protocol>>, SetupError> {
    PROTOCOLS.create_instances(&BUILTIN_TYPES)
}

/// Create the built-in protocol called `name`.
pub fn find_protocol(name: &str) -> Result<Option<Box<dyn Protocol>>, SetupError> {
    Ok(create_protocols()?.into_iter().find(|p| p.name() == name))
}
