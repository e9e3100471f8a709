//! Single-packet parser with cached, at-most-once decoding.
//!
//! A [`Parser`] is created by the protocol for one [`ViewerItem`] and decodes
//! that item's packet the first time its output is needed. The decode step
//! runs exactly once even when several threads ask at the same time; every
//! caller then sees the same text, records and error flag.
//!
//! Decode failures never reach the caller. A [`DecodeError`] (or a panic in a
//! decoder) is written into the parsed text as a diagnostic block and sets
//! [`Parser::parsing_error`].
//!
//! ```text
//! Unparsed ──parse()──▶ Parsing (exclusive) ──▶ Parsed
//! ```

use std::any::Any;
use std::fmt::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::item::ViewerItem;
use crate::packet::Packet;
use crate::protocol::{
    decode_payload, OpcodeRegistry, PayloadDecoder, Record, RenderOptions, OPCODE_HEADER_SIZE,
};

/// Type name reported for packets no decoder claims.
pub const UNDEFINED_DECODER: &str = "UndefinedDecoder";

/// How a packet is decoded. Chosen by the protocol when the parser is created.
#[derive(Clone)]
pub enum Dissector {
    /// No decoder applies. Reads nothing and never reports an error.
    Undefined,
    /// Opcode-routed: skip the 2-byte header, then decode the payload.
    Opcode {
        opcode: u16,
        decoder: Arc<dyn PayloadDecoder>,
    },
    /// Whole packet decoded by one decoder, without a header.
    Fixed(Arc<dyn PayloadDecoder>),
}

impl Dissector {
    /// Route a packet through an opcode registry.
    ///
    /// Packets shorter than the header, and unregistered opcodes, are
    /// [`Dissector::Undefined`].
    pub fn route(registry: &OpcodeRegistry, data: &[u8]) -> Self {
        match registry.lookup(data) {
            Some((opcode, decoder)) => {
                tracing::trace!(
                    protocol = registry.protocol(),
                    opcode,
                    decoder = decoder.type_name(),
                    "opcode routed"
                );
                Dissector::Opcode { opcode, decoder }
            }
            None => Dissector::Undefined,
        }
    }

    /// True for the no-op decoder.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Dissector::Undefined)
    }

    /// Opcode of an opcode-routed packet.
    pub fn opcode(&self) -> Option<u16> {
        match self {
            Dissector::Opcode { opcode, .. } => Some(*opcode),
            _ => None,
        }
    }

    /// Type name of the concrete decoder.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dissector::Undefined => UNDEFINED_DECODER,
            Dissector::Opcode { decoder, .. } | Dissector::Fixed(decoder) => decoder.type_name(),
        }
    }

    /// Number of bytes the decoder is given from a packet of `packet_len` bytes.
    fn window_len(&self, packet_len: usize) -> usize {
        match self {
            Dissector::Undefined => 0,
            Dissector::Opcode { .. } => packet_len.saturating_sub(OPCODE_HEADER_SIZE),
            Dissector::Fixed(_) => packet_len,
        }
    }

    /// Protocol-specific decode step over the whole packet.
    fn run(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Option<Record>> {
        match self {
            Dissector::Undefined => Ok(None),
            Dissector::Opcode { decoder, .. } => {
                cursor.advance(OPCODE_HEADER_SIZE)?;
                let (result, consumed) = decode_payload(decoder.as_ref(), cursor.unread());
                cursor.advance(consumed)?;
                result.map(Some)
            }
            Dissector::Fixed(decoder) => decoder.decode(cursor).map(Some),
        }
    }
}

impl std::fmt::Debug for Dissector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dissector::Undefined => f.write_str("Undefined"),
            Dissector::Opcode { opcode, decoder } => f
                .debug_struct("Opcode")
                .field("opcode", opcode)
                .field("decoder", &decoder.type_name())
                .finish(),
            Dissector::Fixed(decoder) => {
                f.debug_tuple("Fixed").field(&decoder.type_name()).finish()
            }
        }
    }
}

/// Lifecycle of a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ParseState {
    Unparsed = 0,
    Parsing = 1,
    Parsed = 2,
}

impl ParseState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ParseState::Unparsed,
            1 => ParseState::Parsing,
            _ => ParseState::Parsed,
        }
    }
}

/// Frozen result of one decode.
#[derive(Debug, Clone, Default)]
struct ParseOutput {
    text: String,
    data: Vec<Record>,
    error: bool,
}

/// Decoder for one captured packet.
pub struct Parser {
    item: Weak<ViewerItem>,
    packet: Arc<Packet>,
    dissector: Dissector,
    options: RenderOptions,
    state: AtomicU8,
    lock: Mutex<()>,
    output: OnceLock<ParseOutput>,
}

impl Parser {
    /// Create a parser bound to `item`.
    pub fn new(item: &Arc<ViewerItem>, dissector: Dissector, options: RenderOptions) -> Self {
        Self {
            item: Arc::downgrade(item),
            packet: Arc::clone(item.packet()),
            dissector,
            options,
            state: AtomicU8::new(ParseState::Unparsed as u8),
            lock: Mutex::new(()),
            output: OnceLock::new(),
        }
    }

    /// Decode the packet if that has not happened yet.
    ///
    /// Never fails and never panics because of packet contents. Concurrent
    /// callers block until the single decode finishes.
    pub fn parse(&self) {
        self.output();
    }

    /// Rendered text, including diagnostics. Parses on first access.
    pub fn parsed_text(&self) -> &str {
        &self.output().text
    }

    /// Decoded records, in decode order. Parses on first access.
    pub fn contained_data(&self) -> &[Record] {
        &self.output().data
    }

    /// True if decoding failed or left bytes unread. Parses on first access.
    pub fn parsing_error(&self) -> bool {
        self.output().error
    }

    /// True once the decode has completed. Does not trigger parsing.
    pub fn is_parsed(&self) -> bool {
        self.state() == ParseState::Parsed
    }

    pub fn state(&self) -> ParseState {
        ParseState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn dissector(&self) -> &Dissector {
        &self.dissector
    }

    /// Type name of the decoder this parser uses.
    pub fn decoder_name(&self) -> &'static str {
        self.dissector.type_name()
    }

    /// The item this parser belongs to, while it is alive.
    pub fn item(&self) -> Option<Arc<ViewerItem>> {
        self.item.upgrade()
    }

    pub fn packet(&self) -> &Arc<Packet> {
        &self.packet
    }

    fn output(&self) -> &ParseOutput {
        if let Some(output) = self.output.get() {
            return output;
        }

        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have finished while we waited for the lock.
        if let Some(output) = self.output.get() {
            return output;
        }

        self.state.store(ParseState::Parsing as u8, Ordering::Release);
        let decoded = self.decode();
        let output = self.output.get_or_init(|| decoded);
        self.state.store(ParseState::Parsed as u8, Ordering::Release);
        drop(guard);

        tracing::debug!(
            decoder = self.decoder_name(),
            bytes = self.packet.len(),
            error = output.error,
            "packet parsed"
        );
        self.notify_done();
        output
    }

    fn decode(&self) -> ParseOutput {
        let mut output = ParseOutput::default();
        let mut cursor = Cursor::new(self.packet.data());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dissector.run(&mut cursor)))
            .unwrap_or_else(|payload| {
                Err(DecodeError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        match outcome {
            // A record without fields is no output.
            Ok(Some(record)) if record.fields.is_empty() => {}
            Ok(Some(record)) => {
                record.render_into(&mut output.text, &self.options);
                output.data.push(record);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    decoder = self.decoder_name(),
                    offset = cursor.position(),
                    error = %err,
                    "packet decode failed"
                );
                write_diagnostic(&mut output.text, &err, self.decoder_name(), &cursor);
                output.error = true;
            }
        }

        if !self.dissector.is_undefined() {
            if output.text.is_empty() {
                let window = self.dissector.window_len(self.packet.len());
                output.text.push_str(if window == 0 {
                    "(packet is empty)\n"
                } else {
                    "(error: packet should be empty)\n"
                });
            }

            let _ = writeln!(output.text, "\nDecoder: {}", self.decoder_name());
            if !cursor.is_fully_read() {
                let _ = writeln!(
                    output.text,
                    "Warning: bytes read {} of {}",
                    cursor.position(),
                    cursor.len()
                );
                output.error = true;
            }
        }

        output
    }

    fn notify_done(&self) {
        if let Some(item) = self.item.upgrade() {
            if let Some(viewer) = item.viewer() {
                viewer.on_parsing_done(&item);
            }
        }
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("dissector", &self.dissector)
            .field("state", &self.state())
            .finish()
    }
}

fn write_diagnostic(out: &mut String, err: &DecodeError, decoder: &str, cursor: &Cursor<'_>) {
    let _ = writeln!(out, "Parse error: {err}");
    let _ = writeln!(
        out,
        "  in {decoder} at offset {} of {}",
        cursor.position(),
        cursor.len()
    );
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let _ = writeln!(out, "  caused by: {cause}");
        source = cause.source();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
