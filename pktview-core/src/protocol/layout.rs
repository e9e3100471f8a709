//! Declarative message layouts.
//!
//! Most messages are a flat sequence of fixed-width integers, strings and
//! short lists. Rather than hand-writing a decoder for each, a protocol can
//! describe the message as a [`Layout`] and register a [`LayoutDecoder`],
//! which walks the layout and builds the record.

use std::sync::Arc;

use compact_str::CompactString;

use crate::cursor::{ByteOrder, Cursor};
use crate::error::{DecodeError, DecodeResult};

use super::{EnumType, FieldValue, PayloadDecoder, Record};

/// Width of a length prefix or enum field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U8,
    U16,
    U32,
}

impl Width {
    fn read(self, cursor: &mut Cursor<'_>, order: ByteOrder) -> DecodeResult<u64> {
        Ok(match self {
            Width::U8 => cursor.read_u8()? as u64,
            Width::U16 => cursor.read_u16(order)? as u64,
            Width::U32 => cursor.read_u32(order)? as u64,
        })
    }
}

/// How one field is laid out on the wire.
#[derive(Debug, Clone)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    /// NUL-terminated UTF-8 string.
    CString,
    /// UTF-8 string preceded by its byte length.
    PrefixedString(Width),
    /// Fixed number of raw bytes.
    Bytes(usize),
    /// All bytes left in the payload.
    Rest,
    /// Integer rendered by its symbolic name.
    Enum(Width, EnumType),
    /// Count-prefixed list of nested records.
    List(Width, Arc<Layout>),
}

/// Ordered field list of one message type.
#[derive(Debug, Clone)]
pub struct Layout {
    name: &'static str,
    fields: Vec<(&'static str, FieldKind)>,
}

impl Layout {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style).
    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push((name, kind));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Decode one record following this layout.
    pub fn decode(&self, cursor: &mut Cursor<'_>, order: ByteOrder) -> DecodeResult<Record> {
        let mut record = Record::new(self.name);
        for (name, kind) in &self.fields {
            let value = read_field(cursor, order, name, kind)?;
            record.push(name, value);
        }
        Ok(record)
    }
}

fn read_field(
    cursor: &mut Cursor<'_>,
    order: ByteOrder,
    name: &'static str,
    kind: &FieldKind,
) -> DecodeResult<FieldValue> {
    Ok(match kind {
        FieldKind::U8 => FieldValue::UInt8(cursor.read_u8()?),
        FieldKind::U16 => FieldValue::UInt16(cursor.read_u16(order)?),
        FieldKind::U32 => FieldValue::UInt32(cursor.read_u32(order)?),
        FieldKind::U64 => FieldValue::UInt64(cursor.read_u64(order)?),
        FieldKind::I8 => FieldValue::Int8(cursor.read_i8()?),
        FieldKind::I16 => FieldValue::Int16(cursor.read_i16(order)?),
        FieldKind::I32 => FieldValue::Int32(cursor.read_i32(order)?),
        FieldKind::I64 => FieldValue::Int64(cursor.read_i64(order)?),
        FieldKind::F32 => FieldValue::Float(cursor.read_f32(order)? as f64),
        FieldKind::F64 => FieldValue::Float(cursor.read_f64(order)?),
        FieldKind::Bool => FieldValue::Bool(cursor.read_bool()?),
        FieldKind::CString => FieldValue::String(CompactString::new(cursor.read_cstring(name)?)),
        FieldKind::PrefixedString(width) => {
            let len = width.read(cursor, order)? as usize;
            FieldValue::String(CompactString::new(cursor.read_str(len, name)?))
        }
        FieldKind::Bytes(count) => FieldValue::Bytes(cursor.read_bytes(*count)?.to_vec()),
        FieldKind::Rest => FieldValue::Bytes(cursor.read_to_end().to_vec()),
        FieldKind::Enum(width, ty) => {
            let raw = width.read(cursor, order)?;
            FieldValue::Enum(super::EnumValue {
                type_name: ty.name(),
                name: ty.variant_name(raw),
                raw,
            })
        }
        FieldKind::List(width, item) => {
            let count = width.read(cursor, order)? as usize;
            let mut items = Vec::with_capacity(count.min(cursor.remaining()));
            for i in 0..count {
                let start = cursor.position();
                items.push(FieldValue::record(item.decode(cursor, order)?));
                // Items that read nothing would let the count run unbounded.
                if cursor.position() == start {
                    return Err(DecodeError::invalid(
                        name,
                        format!("item {i} of {count} consumed no bytes"),
                    ));
                }
            }
            FieldValue::List(items)
        }
    })
}

/// Payload decoder driven by a [`Layout`].
#[derive(Debug, Clone)]
pub struct LayoutDecoder {
    layout: Layout,
    byte_order: ByteOrder,
}

impl LayoutDecoder {
    pub fn new(layout: Layout, byte_order: ByteOrder) -> Self {
        Self { layout, byte_order }
    }
}

impl PayloadDecoder for LayoutDecoder {
    fn type_name(&self) -> &'static str {
        self.layout.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        self.layout.decode(cursor, self.byte_order)
    }
}
