//! # pktview-core
//!
//! Packet dissection engine for captured client/server traffic.
//!
//! This crate turns raw captured packets into structured, human-readable
//! text. It is the engine behind the `pktview` CLI and can be embedded in any
//! viewer that shows one packet per row.
//!
//! ## Features
//!
//! - **Cached parsing**: each packet is decoded at most once, even under
//!   concurrent access; results are frozen and shared
//! - **Contained failures**: decode errors and decoder panics become a
//!   diagnostic block in the output, never an error for the caller
//! - **Consumption audit**: bytes a decoder leaves unread are reported
//! - **Opcode routing**: per-protocol registries keyed by a 2-byte header,
//!   little- or big-endian
//! - **Protocol discovery**: built-in protocols are found once per process
//!   and instantiated fresh on demand
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pktview_core::prelude::*;
//!
//! let log = Arc::new(MemoryLog::new("capture"));
//! log.push(Arc::new(Packet::new(
//!     vec![0x01, 0x00, 7, 0, 0, 0, 20, 0, 0, 0],
//!     Direction::ToServer,
//!     PacketFlags::NONE,
//! )));
//!
//! let protocol: Arc<dyn Protocol> = find_protocol("realm").unwrap().unwrap().into();
//! let session = ViewerSession::new(log, Some(protocol));
//! session.sync_items().unwrap();
//!
//! let item = session.item(0).unwrap();
//! let parser = item.parse().unwrap();
//! assert!(!parser.parsing_error());
//! assert!(parser.parsed_text().starts_with("Ping\n  sequence = 7\n"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        pktview-core                                 |
//! +---------------------------------------------------------------------+
//! |  packet     - Packet, Direction, PacketFlags                        |
//! |  cursor     - bounds-checked reader with byte order                 |
//! |  protocol/  - Protocol trait, opcode registry, layouts, records     |
//! |  parser     - at-most-once decode, diagnostics, consumption audit   |
//! |  item       - ViewerItem, Viewer and NetworkLog traits              |
//! |  session    - MemoryLog and ViewerSession                           |
//! |  plugin     - capability-based type discovery                      |
//! |  format/    - hex dump and hex parsing                              |
//! |  error      - Error types                                           |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Built-in Protocols
//!
//! | Name | Opcodes | Messages |
//! |------|---------|----------|
//! | realm | LE u16 | Ping, ChatMessage, MoveUpdate, LogoutRequest |
//! | lobby | BE u16 | Hello, Heartbeat, RoomList, JoinRoom, Disconnect |
//! | line | none | text commands and numbered replies |

pub mod cursor;
pub mod error;
pub mod format;
pub mod item;
pub mod packet;
pub mod parser;
pub mod plugin;
pub mod prelude;
pub mod protocol;
pub mod session;

// Re-export commonly used types at crate root for convenience
pub use cursor::{ByteOrder, Cursor};
pub use error::{DecodeError, DecodeResult, DomainError, Error, Result, SetupError};
pub use format::{format_hex, parse_hex};
pub use item::{NetworkLog, Viewer, ViewerItem};
pub use packet::{current_ticks, Direction, Packet, PacketFlags};
pub use parser::{Dissector, ParseState, Parser, UNDEFINED_DECODER};
pub use plugin::{Candidate, PluginDiscovery, PluginType, TypeUniverse};
pub use protocol::{
    create_protocols, find_protocol, protocol_types, EnumType, FieldValue, OpcodeRegistry,
    PayloadDecoder, Protocol, Record, RenderOptions, WireEnum,
};
pub use session::{MemoryLog, ParseObserver, ViewerSession};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
