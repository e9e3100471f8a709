//! Opcode registry: per-protocol mapping from header opcode to decoder.
//!
//! Every opcode-routed packet starts with a 2-byte opcode. The byte order of
//! that header is a property of the protocol, so each protocol owns its own
//! registry and numeric collisions between protocols are harmless.
//!
//! Registries are built once, when the protocol is constructed, from an
//! explicit table:
//!
//! ```
//! use pktview_core::cursor::{ByteOrder, Cursor};
//! use pktview_core::error::DecodeResult;
//! use pktview_core::protocol::{OpcodeRegistry, PayloadDecoder, FieldValue, Record};
//!
//! struct Tick;
//!
//! impl PayloadDecoder for Tick {
//!     fn type_name(&self) -> &'static str {
//!         "Tick"
//!     }
//!
//!     fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
//!         let tick = cursor.read_u32(ByteOrder::LittleEndian)?;
//!         Ok(Record::new("Tick").with("tick", FieldValue::UInt32(tick)))
//!     }
//! }
//!
//! let registry = OpcodeRegistry::builder("demo", ByteOrder::LittleEndian)
//!     .register(0x0001, Tick)
//!     .unwrap()
//!     .build();
//!
//! assert_eq!(registry.read_opcode(&[0x01, 0x00, 0xff]), Some(1));
//! assert!(registry.get(1).is_some());
//! assert!(registry.get(2).is_none());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cursor::{ByteOrder, Cursor};
use crate::error::{DecodeResult, SetupError};

use super::Record;

/// Size of the opcode header in bytes.
pub const OPCODE_HEADER_SIZE: usize = 2;

/// Decoder for the payload that follows an opcode header.
///
/// The cursor covers only the payload bytes; the decoder reads what it
/// understands and returns the decoded record. Bytes it leaves unread are
/// reported by the parser, not by the decoder.
pub trait PayloadDecoder: Send + Sync {
    /// Type name shown in the diagnostic footer of the parsed text.
    fn type_name(&self) -> &'static str;

    /// Decode one message.
    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record>;
}

/// Run a decoder over `payload`.
///
/// Returns the decode result together with the number of bytes the decoder
/// consumed, which is also meaningful when decoding failed part way.
pub fn decode_payload(
    decoder: &dyn PayloadDecoder,
    payload: &[u8],
) -> (DecodeResult<Record>, usize) {
    let mut cursor = Cursor::new(payload);
    let result = decoder.decode(&mut cursor);
    (result, cursor.position())
}

/// Registry mapping opcodes to payload decoders for one protocol.
#[derive(Clone)]
pub struct OpcodeRegistry {
    protocol: &'static str,
    byte_order: ByteOrder,
    decoders: BTreeMap<u16, Arc<dyn PayloadDecoder>>,
}

impl OpcodeRegistry {
    /// Start building a registry for `protocol`.
    pub fn builder(protocol: &'static str, byte_order: ByteOrder) -> RegistryBuilder {
        RegistryBuilder {
            registry: OpcodeRegistry {
                protocol,
                byte_order,
                decoders: BTreeMap::new(),
            },
        }
    }

    /// Name of the owning protocol.
    pub fn protocol(&self) -> &'static str {
        self.protocol
    }

    /// Byte order of the opcode header.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Extract the opcode from the start of a payload.
    ///
    /// Returns `None` if the payload is shorter than the header.
    #[inline]
    pub fn read_opcode(&self, data: &[u8]) -> Option<u16> {
        let header: [u8; OPCODE_HEADER_SIZE] = data.get(..OPCODE_HEADER_SIZE)?.try_into().ok()?;
        Some(match self.byte_order {
            ByteOrder::LittleEndian => u16::from_le_bytes(header),
            ByteOrder::BigEndian => u16::from_be_bytes(header),
        })
    }

    /// Get the decoder registered for an opcode.
    pub fn get(&self, opcode: u16) -> Option<&Arc<dyn PayloadDecoder>> {
        self.decoders.get(&opcode)
    }

    /// Read the opcode of a payload and look up its decoder.
    pub fn lookup(&self, data: &[u8]) -> Option<(u16, Arc<dyn PayloadDecoder>)> {
        let opcode = self.read_opcode(data)?;
        let decoder = self.get(opcode)?;
        Some((opcode, Arc::clone(decoder)))
    }

    /// Decode a payload that follows the header of `opcode`.
    ///
    /// Returns `None` for an unregistered opcode.
    pub fn decode(&self, opcode: u16, payload: &[u8]) -> Option<(DecodeResult<Record>, usize)> {
        self.get(opcode).map(|d| decode_payload(d.as_ref(), payload))
    }

    /// Registered opcodes in ascending order.
    pub fn opcodes(&self) -> impl Iterator<Item = u16> + '_ {
        self.decoders.keys().copied()
    }

    /// Get the number of registered opcodes.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for OpcodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcodeRegistry")
            .field("protocol", &self.protocol)
            .field("byte_order", &self.byte_order)
            .field("opcodes", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder that rejects duplicate opcodes.
pub struct RegistryBuilder {
    registry: OpcodeRegistry,
}

impl RegistryBuilder {
    /// Register a decoder for an opcode.
    ///
    /// Fails with [`SetupError::DuplicateOpcode`] if the opcode is taken.
    pub fn register<D>(self, opcode: u16, decoder: D) -> Result<Self, SetupError>
    where
        D: PayloadDecoder + 'static,
    {
        self.register_shared(opcode, Arc::new(decoder))
    }

    /// Register an already shared decoder for an opcode.
    pub fn register_shared(
        mut self,
        opcode: u16,
        decoder: Arc<dyn PayloadDecoder>,
    ) -> Result<Self, SetupError> {
        if self.registry.decoders.contains_key(&opcode) {
            return Err(SetupError::DuplicateOpcode {
                protocol: self.registry.protocol,
                opcode,
            });
        }
        self.registry.decoders.insert(opcode, decoder);
        Ok(self)
    }

    /// Finish the registry.
    pub fn build(self) -> OpcodeRegistry {
        tracing::debug!(
            protocol = self.registry.protocol,
            byte_order = self.registry.byte_order.as_str(),
            opcodes = self.registry.decoders.len(),
            "built opcode registry"
        );
        self.registry
    }
}
