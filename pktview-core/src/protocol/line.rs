//! Line protocol decoder.
//!
//! A text control channel without opcodes. Clients send commands
//! (`VERB argument\r\n`); the server answers with numbered replies
//! (`250 text\r\n`). The decoder is chosen by packet direction.
//!
//! Only complete lines are consumed. A packet that ends mid-line leaves the
//! partial line unread, which the parser reports.

use std::sync::Arc;

use super::{FieldValue, PayloadDecoder, Protocol, Record};
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::packet::{Direction, Packet};
use crate::parser::Dissector;

crate::wire_enum! {
    /// Class of a reply, taken from the first digit of its code.
    pub enum ReplyClass: u8 {
        Preliminary = 1,
        Completion = 2,
        Intermediate = 3,
        TransientFailure = 4,
        PermanentFailure = 5,
    }
}

/// Split the unread bytes into complete lines, consuming them.
///
/// Lines end in `\n`; a preceding `\r` is dropped.
fn read_lines<'a>(cursor: &mut Cursor<'a>) -> DecodeResult<Vec<&'a str>> {
    let mut lines = Vec::new();
    while let Some(end) = cursor.unread().iter().position(|&b| b == b'\n') {
        let raw = cursor.read_bytes(end + 1)?;
        let raw = &raw[..end];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line =
            std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8 { field: "line" })?;
        lines.push(line);
    }
    Ok(lines)
}

/// Client-to-server commands.
#[derive(Debug, Clone, Copy)]
pub struct CommandDecoder;

impl PayloadDecoder for CommandDecoder {
    fn type_name(&self) -> &'static str {
        "CommandDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        let mut record = Record::new("Commands");
        let lines = read_lines(cursor)?;
        if lines.is_empty() {
            return Ok(record);
        }

        let commands = lines
            .into_iter()
            .map(|line| {
                let (verb, argument) = line.split_once(' ').unwrap_or((line, ""));
                let mut command = Record::new("Command")
                    .with("verb", FieldValue::string(&verb.to_ascii_uppercase()));
                if !argument.is_empty() {
                    command.push("argument", FieldValue::string(argument));
                }
                FieldValue::record(command)
            })
            .collect();
        record.push("commands", FieldValue::List(commands));
        Ok(record)
    }
}

/// Server-to-client numbered replies.
#[derive(Debug, Clone, Copy)]
pub struct ReplyDecoder;

impl ReplyDecoder {
    fn parse_reply(line: &str) -> DecodeResult<Record> {
        let digits = line.get(..3).filter(|d| d.bytes().all(|b| b.is_ascii_digit()));
        let Some(digits) = digits else {
            return Err(DecodeError::invalid(
                "code",
                format!("expected 3-digit reply code in {line:?}"),
            ));
        };
        let code: u16 = digits
            .parse()
            .map_err(|_| DecodeError::invalid("code", digits.to_string()))?;

        // "250-text" marks a continuation line of a multi-line reply.
        let rest = &line[3..];
        let (more, text) = match rest.as_bytes().first() {
            Some(b'-') => (true, &rest[1..]),
            Some(b' ') => (false, &rest[1..]),
            None => (false, ""),
            Some(_) => {
                return Err(DecodeError::invalid(
                    "code",
                    format!("unexpected separator after {digits}"),
                ))
            }
        };

        Ok(Record::new("Reply")
            .with("code", FieldValue::UInt16(code))
            .with("class", FieldValue::enumeration::<ReplyClass>((code / 100) as u64))
            .with("continued", FieldValue::Bool(more))
            .with("text", FieldValue::string(text)))
    }
}

impl PayloadDecoder for ReplyDecoder {
    fn type_name(&self) -> &'static str {
        "ReplyDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        let mut record = Record::new("Replies");
        let lines = read_lines(cursor)?;
        if lines.is_empty() {
            return Ok(record);
        }

        let replies = lines
            .into_iter()
            .map(|line| Self::parse_reply(line).map(FieldValue::record))
            .collect::<DecodeResult<Vec<_>>>()?;
        record.push("replies", FieldValue::List(replies));
        Ok(record)
    }
}

/// The line protocol.
#[derive(Clone)]
pub struct LineProtocol {
    commands: Arc<dyn PayloadDecoder>,
    replies: Arc<dyn PayloadDecoder>,
}

impl LineProtocol {
    pub fn new() -> Self {
        Self {
            commands: Arc::new(CommandDecoder),
            replies: Arc::new(ReplyDecoder),
        }
    }
}

impl Default for LineProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LineProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineProtocol").finish_non_exhaustive()
    }
}

impl Protocol for LineProtocol {
    fn name(&self) -> &'static str {
        "line"
    }

    fn display_name(&self) -> &'static str {
        "Line (text control)"
    }

    fn select_dissector(&self, packet: &Packet) -> Dissector {
        match packet.direction() {
            Direction::ToServer => Dissector::Fixed(Arc::clone(&self.commands)),
            Direction::ToClient => Dissector::Fixed(Arc::clone(&self.replies)),
        }
    }
}
