//! Test utilities for packet decoding.
//!
//! Provides payload builders, decoders with scripted behaviour, and a viewer
//! that records parse notifications.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::cursor::{ByteOrder, Cursor};
use crate::error::{DecodeError, DecodeResult};
use crate::item::{NetworkLog, Viewer, ViewerItem};
use crate::packet::{Direction, Packet, PacketFlags};
use crate::session::MemoryLog;

use super::{FieldValue, PayloadDecoder, Protocol, Record};

/// Builder for opcode-prefixed payloads.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    order: ByteOrder,
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    /// Start a payload with the given opcode header.
    pub fn new(order: ByteOrder, opcode: u16) -> Self {
        Self::raw(order).u16(opcode)
    }

    /// Start a payload without a header.
    pub fn raw(order: ByteOrder) -> Self {
        Self {
            order,
            bytes: Vec::new(),
        }
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.bytes.push(value);
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        match self.order {
            ByteOrder::LittleEndian => self.bytes.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        match self.order {
            ByteOrder::LittleEndian => self.bytes.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
        self
    }

    pub fn f32(self, value: f32) -> Self {
        self.u32(value.to_bits())
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(data);
        self
    }

    /// NUL-terminated string.
    pub fn cstring(mut self, text: &str) -> Self {
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        self
    }

    /// String with a one-byte length prefix.
    pub fn str8(self, text: &str) -> Self {
        self.u8(text.len() as u8).bytes(text.as_bytes())
    }

    /// String with a two-byte length prefix.
    pub fn str16(self, text: &str) -> Self {
        self.u16(text.len() as u16).bytes(text.as_bytes())
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads exactly `size` bytes into a `data` field.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeDecoder {
    size: usize,
}

impl FixedSizeDecoder {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl PayloadDecoder for FixedSizeDecoder {
    fn type_name(&self) -> &'static str {
        "FixedSizeDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        let mut record = Record::new("Fixed");
        if self.size > 0 {
            let data = cursor.read_bytes(self.size)?;
            record.push("data", FieldValue::Bytes(data.to_vec()));
        }
        Ok(record)
    }
}

/// Reads one byte, then fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingDecoder;

impl PayloadDecoder for FailingDecoder {
    fn type_name(&self) -> &'static str {
        "FailingDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        cursor.read_u8()?;
        Err(DecodeError::invalid("magic", "always fails"))
    }
}

/// Consumes the whole payload and returns a record without fields.
#[derive(Debug, Clone, Copy)]
pub struct SilentDecoder;

impl PayloadDecoder for SilentDecoder {
    fn type_name(&self) -> &'static str {
        "SilentDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        cursor.read_to_end();
        Ok(Record::new("Silent"))
    }
}

/// Panics on every packet.
#[derive(Debug, Clone, Copy)]
pub struct PanickingDecoder;

impl PayloadDecoder for PanickingDecoder {
    fn type_name(&self) -> &'static str {
        "PanickingDecoder"
    }

    fn decode(&self, _cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        panic!("decoder bug")
    }
}

/// Counts invocations and reads `size` bytes.
#[derive(Debug, Clone)]
pub struct CountingDecoder {
    calls: Arc<AtomicUsize>,
    inner: FixedSizeDecoder,
}

impl CountingDecoder {
    pub fn new(calls: Arc<AtomicUsize>, size: usize) -> Self {
        Self {
            calls,
            inner: FixedSizeDecoder::new(size),
        }
    }
}

impl PayloadDecoder for CountingDecoder {
    fn type_name(&self) -> &'static str {
        "CountingDecoder"
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> DecodeResult<Record> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window for racing callers.
        std::thread::sleep(std::time::Duration::from_millis(5));
        self.inner.decode(cursor)
    }
}

/// Viewer that records parse notifications.
#[derive(Default)]
pub struct TestViewer {
    protocol: Option<Arc<dyn Protocol>>,
    notifications: AtomicUsize,
    last_index: Mutex<Option<usize>>,
}

impl TestViewer {
    pub fn with_protocol(protocol: Arc<dyn Protocol>) -> Self {
        Self {
            protocol: Some(protocol),
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn last_index(&self) -> Option<usize> {
        *self.last_index.lock().unwrap()
    }
}

impl Viewer for TestViewer {
    fn protocol(&self) -> Option<Arc<dyn Protocol>> {
        self.protocol.clone()
    }

    fn on_parsing_done(&self, item: &ViewerItem) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        *self.last_index.lock().unwrap() = Some(item.index());
    }
}

/// Build a one-packet log and an item for it, owned by a [`TestViewer`].
pub fn item_with(data: Vec<u8>, direction: Direction) -> (Arc<TestViewer>, Arc<ViewerItem>) {
    viewer_item(Arc::new(TestViewer::default()), data, direction)
}

/// Like [`item_with`], with an explicit viewer.
pub fn viewer_item(
    viewer: Arc<TestViewer>,
    data: Vec<u8>,
    direction: Direction,
) -> (Arc<TestViewer>, Arc<ViewerItem>) {
    let log = Arc::new(MemoryLog::new("test"));
    let packet = Arc::new(Packet::new(data, direction, PacketFlags::NONE));
    let index = log.push(Arc::clone(&packet));
    let weak: Weak<dyn Viewer> = Arc::downgrade(&viewer) as Weak<dyn Viewer>;
    let log: Arc<dyn NetworkLog> = log;
    let item = ViewerItem::new(weak, log, packet, index).unwrap();
    (viewer, item)
}
