//! Convenient re-exports for common usage.
//!
//! This module provides a curated set of the most commonly used types
//! from pktview-core, allowing you to import them with a single `use` statement.
//!
//! # Example
//!
//! ```rust
//! use pktview_core::prelude::*;
//!
//! // Every built-in protocol, freshly constructed
//! let protocols = create_protocols().unwrap();
//! assert!(protocols.iter().any(|p| p.name() == "lobby"));
//! ```

// Packet types
pub use crate::packet::{Direction, Packet, PacketFlags};

// Protocol types
pub use crate::protocol::{
    create_protocols, find_protocol, FieldValue, OpcodeRegistry, PayloadDecoder, Protocol, Record,
    RenderOptions,
};

// Parsing pipeline
pub use crate::item::{NetworkLog, Viewer, ViewerItem};
pub use crate::parser::{Dissector, Parser};
pub use crate::session::{MemoryLog, ViewerSession};

// Error types
pub use crate::error::{Error, Result};
