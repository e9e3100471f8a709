//! Decoded values and their text rendering.
//!
//! A decoder produces a [`Record`]: a named, ordered list of fields. Field
//! order is the order the decoder pushed them, so the rendered text is stable
//! for a given packet. Enum and flag fields keep their symbolic names and are
//! rendered by name rather than by number.

use std::fmt::{self, Write};

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::format::format_hex;

use super::WireEnum;

/// Rendering settings for decoded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Maximum number of bytes shown for byte fields.
    pub hex_limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            hex_limit: 32,
        }
    }
}

/// Value of an enum-typed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Name of the enum type (e.g. "ChatChannel").
    pub type_name: &'static str,
    /// Symbolic name of the variant, `None` if the raw value is not a known variant.
    pub name: Option<&'static str>,
    /// Raw value read from the wire.
    pub raw: u64,
}

/// Value of a bit-flag field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagsValue {
    /// Names of the known flags that are set, in declaration order.
    pub names: SmallVec<[&'static str; 4]>,
    /// Raw value read from the wire.
    pub raw: u64,
    /// Bits set in `raw` that have no name.
    pub unknown: u64,
}

/// Possible field value types.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Unsigned 8-bit integer
    UInt8(u8),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// Signed 8-bit integer
    Int8(i8),
    /// Signed 16-bit integer
    Int16(i16),
    /// Signed 32-bit integer
    Int32(i32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Floating point value (f32 fields are widened)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Text. Uses CompactString for small-string optimization.
    String(CompactString),
    /// Raw bytes, rendered as hex
    Bytes(Vec<u8>),
    /// Enum rendered by symbolic name
    Enum(EnumValue),
    /// Bit flags rendered as `A | B`
    Flags(FlagsValue),
    /// Nested record, boxed since a record holds its fields inline
    Record(Box<Record>),
    /// List of values (all elements should be of the same type)
    List(Vec<FieldValue>),
    /// Null/missing value
    Null,
}

impl FieldValue {
    /// Build an enum value from a raw wire value.
    pub fn enumeration<E: WireEnum>(raw: u64) -> Self {
        FieldValue::Enum(EnumValue {
            type_name: E::TYPE_NAME,
            name: E::from_raw(raw).map(E::name),
            raw,
        })
    }

    /// Build a flags value from a bitflags set.
    pub fn flags<F>(value: F) -> Self
    where
        F: bitflags::Flags,
        F::Bits: Into<u64>,
    {
        let raw: u64 = value.bits().into();
        let known: u64 = F::all().bits().into();
        FieldValue::Flags(FlagsValue {
            names: value.iter_names().map(|(name, _)| name).collect(),
            raw,
            unknown: raw & !known,
        })
    }

    /// Build a nested record value.
    pub fn record(record: Record) -> Self {
        FieldValue::Record(Box::new(record))
    }

    /// Build a string value.
    pub fn string(text: &str) -> Self {
        FieldValue::String(CompactString::new(text))
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt8(v) => Some(*v as u64),
            FieldValue::UInt16(v) => Some(*v as u64),
            FieldValue::UInt32(v) => Some(*v as u64),
            FieldValue::UInt64(v) => Some(*v),
            FieldValue::Enum(e) => Some(e.raw),
            FieldValue::Flags(f) => Some(f.raw),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(v) => Some(*v),
            FieldValue::Int32(v) => Some(*v as i64),
            FieldValue::Int16(v) => Some(*v as i64),
            FieldValue::Int8(v) => Some(*v as i64),
            FieldValue::UInt8(v) => Some(*v as i64),
            FieldValue::UInt16(v) => Some(*v as i64),
            FieldValue::UInt32(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Try to get as str reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Symbolic name of an enum value.
    pub fn enum_name(&self) -> Option<&'static str> {
        match self {
            FieldValue::Enum(e) => e.name,
            _ => None,
        }
    }

    /// Try to get as a nested record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(r) => Some(r.as_ref()),
            _ => None,
        }
    }

    /// Try to get as list reference.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    fn write_scalar(&self, out: &mut String, options: &RenderOptions) {
        match self {
            FieldValue::Bytes(b) => out.push_str(&format_hex(b, options.hex_limit)),
            other => {
                let _ = write!(out, "{other}");
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::UInt8(v) => write!(f, "{v}"),
            FieldValue::UInt16(v) => write!(f, "{v}"),
            FieldValue::UInt32(v) => write!(f, "{v}"),
            FieldValue::UInt64(v) => write!(f, "{v}"),
            FieldValue::Int8(v) => write!(f, "{v}"),
            FieldValue::Int16(v) => write!(f, "{v}"),
            FieldValue::Int32(v) => write!(f, "{v}"),
            FieldValue::Int64(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::String(s) => write!(f, "{:?}", s.as_str()),
            FieldValue::Bytes(b) => f.write_str(&format_hex(b, usize::MAX)),
            FieldValue::Enum(e) => match e.name {
                Some(name) => f.write_str(name),
                None => write!(f, "Unknown({})", e.raw),
            },
            FieldValue::Flags(flags) => {
                if flags.names.is_empty() && flags.unknown == 0 {
                    return f.write_str("(none)");
                }
                let mut first = true;
                for name in &flags.names {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    f.write_str(name)?;
                    first = false;
                }
                if flags.unknown != 0 {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{:#x}", flags.unknown)?;
                }
                Ok(())
            }
            FieldValue::Record(r) => write!(f, "{} {{{} fields}}", r.name, r.fields.len()),
            FieldValue::List(items) => write!(f, "[{} items]", items.len()),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

/// Field entry of a record: (field_name, value).
pub type FieldEntry = (&'static str, FieldValue);

/// A decoded message: a name plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: &'static str,
    /// Most messages have fewer than 8 fields, so these fit inline. Nested
    /// records are boxed by [`FieldValue::Record`].
    pub fields: SmallVec<[FieldEntry; 8]>,
}

impl Record {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: SmallVec::new(),
        }
    }

    /// Append a field (builder style).
    pub fn with(mut self, key: &'static str, value: FieldValue) -> Self {
        self.fields.push((key, value));
        self
    }

    /// Append a field.
    pub fn push(&mut self, key: &'static str, value: FieldValue) {
        self.fields.push((key, value));
    }

    /// Get a field value by name (first match).
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Render the record as indented text, one field per line.
    pub fn render(&self, options: &RenderOptions) -> String {
        let mut out = String::new();
        self.render_into(&mut out, options);
        out
    }

    /// Append the rendered record to `out`.
    pub fn render_into(&self, out: &mut String, options: &RenderOptions) {
        out.push_str(self.name);
        out.push('\n');
        render_fields(out, &self.fields, 1, options);
    }
}

fn indent(out: &mut String, depth: usize, options: &RenderOptions) {
    for _ in 0..depth * options.indent_width {
        out.push(' ');
    }
}

fn render_fields(out: &mut String, fields: &[FieldEntry], depth: usize, options: &RenderOptions) {
    for (key, value) in fields {
        render_value(out, key, value, depth, options);
    }
}

fn render_value(
    out: &mut String,
    label: &str,
    value: &FieldValue,
    depth: usize,
    options: &RenderOptions,
) {
    indent(out, depth, options);
    out.push_str(label);

    match value {
        FieldValue::Record(record) => {
            let _ = writeln!(out, ": {}", record.name);
            render_fields(out, &record.fields, depth + 1, options);
        }
        FieldValue::List(items) => {
            let _ = writeln!(out, ": {} items", items.len());
            for (i, item) in items.iter().enumerate() {
                render_value(out, &format!("[{i}]"), item, depth + 1, options);
            }
        }
        scalar => {
            out.push_str(" = ");
            scalar.write_scalar(out, options);
            out.push('\n');
        }
    }
}
