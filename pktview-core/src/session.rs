//! In-memory log and viewer session.
//!
//! [`MemoryLog`] is a growable [`NetworkLog`]. [`ViewerSession`] is the
//! stock [`Viewer`]: it wraps every packet of a log in a [`ViewerItem`],
//! supplies the selected protocol, and counts completed parses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::error::DomainError;
use crate::item::{NetworkLog, Viewer, ViewerItem};
use crate::packet::Packet;
use crate::protocol::Protocol;

/// Packet log held in memory.
pub struct MemoryLog {
    name: String,
    packets: RwLock<Vec<Arc<Packet>>>,
}

impl MemoryLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packets: RwLock::new(Vec::new()),
        }
    }

    /// Append a packet and return its index.
    pub fn push(&self, packet: Arc<Packet>) -> usize {
        let mut packets = self.packets.write().unwrap();
        packets.push(packet);
        packets.len() - 1
    }
}

impl NetworkLog for MemoryLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.packets.read().unwrap().len()
    }

    fn packet(&self, index: usize) -> Option<Arc<Packet>> {
        self.packets.read().unwrap().get(index).cloned()
    }
}

impl std::fmt::Debug for MemoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLog")
            .field("name", &self.name)
            .field("packets", &self.len())
            .finish()
    }
}

/// Callback run after each item is parsed.
pub type ParseObserver = Box<dyn Fn(&ViewerItem) + Send + Sync>;

/// A viewer over one log with one protocol.
pub struct ViewerSession {
    log: Arc<dyn NetworkLog>,
    protocol: Option<Arc<dyn Protocol>>,
    items: RwLock<Vec<Arc<ViewerItem>>>,
    parsed: AtomicUsize,
    observer: Option<ParseObserver>,
}

impl ViewerSession {
    pub fn new(log: Arc<dyn NetworkLog>, protocol: Option<Arc<dyn Protocol>>) -> Arc<Self> {
        Arc::new(Self {
            log,
            protocol,
            items: RwLock::new(Vec::new()),
            parsed: AtomicUsize::new(0),
            observer: None,
        })
    }

    /// Create a session that calls `observer` after every parse.
    pub fn with_observer(
        log: Arc<dyn NetworkLog>,
        protocol: Option<Arc<dyn Protocol>>,
        observer: ParseObserver,
    ) -> Arc<Self> {
        Arc::new(Self {
            log,
            protocol,
            items: RwLock::new(Vec::new()),
            parsed: AtomicUsize::new(0),
            observer: Some(observer),
        })
    }

    pub fn log(&self) -> &Arc<dyn NetworkLog> {
        &self.log
    }

    /// Wrap packets added to the log since the last call.
    ///
    /// Returns the number of new items.
    pub fn sync_items(self: &Arc<Self>) -> Result<usize, DomainError> {
        let viewer: Weak<dyn Viewer> = Arc::downgrade(self) as Weak<dyn Viewer>;
        let mut items = self.items.write().unwrap();
        let start = items.len();

        for index in start..self.log.len() {
            let packet = self.log.packet(index).ok_or_else(|| DomainError::InvalidArgument {
                argument: "index",
                reason: format!("log {:?} has no packet {index}", self.log.name()),
            })?;
            items.push(ViewerItem::new(
                viewer.clone(),
                Arc::clone(&self.log),
                packet,
                index,
            )?);
        }

        let added = items.len() - start;
        if added > 0 {
            tracing::debug!(log = self.log.name(), added, total = items.len(), "items synced");
        }
        Ok(added)
    }

    pub fn item(&self, index: usize) -> Option<Arc<ViewerItem>> {
        self.items.read().unwrap().get(index).cloned()
    }

    /// Snapshot of all items.
    pub fn items(&self) -> Vec<Arc<ViewerItem>> {
        self.items.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of parse notifications received.
    pub fn parsed_count(&self) -> usize {
        self.parsed.load(Ordering::Acquire)
    }

    /// Parse every item. Items without a parser are skipped.
    pub fn parse_all(&self) {
        for item in self.items() {
            item.parse();
        }
    }
}

impl Viewer for ViewerSession {
    fn protocol(&self) -> Option<Arc<dyn Protocol>> {
        self.protocol.clone()
    }

    fn on_parsing_done(&self, item: &ViewerItem) {
        self.parsed.fetch_add(1, Ordering::AcqRel);
        if let Some(observer) = &self.observer {
            observer(item);
        }
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("log", &self.log.name())
            .field("protocol", &self.protocol.as_ref().map(|p| p.name()))
            .field("items", &self.len())
            .field("parsed", &self.parsed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Direction, PacketFlags};
    use crate::protocol::LobbyProtocol;

    fn lobby_log(packets: &[&[u8]]) -> Arc<MemoryLog> {
        let log = Arc::new(MemoryLog::new("lobby"));
        for data in packets {
            log.push(Arc::new(Packet::new(
                data.to_vec(),
                Direction::ToServer,
                PacketFlags::NONE,
            )));
        }
        log
    }

    #[test]
    fn test_memory_log() {
        let log = lobby_log(&[&[1], &[2, 3]]);
        assert_eq!(log.len(), 2);
        assert_eq!(log.packet(1).unwrap().data(), &[2, 3]);
        assert!(log.packet(2).is_none());
        assert_eq!(log.name(), "lobby");
    }

    #[test]
    fn test_sync_is_incremental() {
        let log = lobby_log(&[&[0x00, 0x02, 0, 0, 0, 1]]);
        let session = ViewerSession::new(log.clone(), None);

        assert_eq!(session.sync_items().unwrap(), 1);
        assert_eq!(session.sync_items().unwrap(), 0);

        log.push(Arc::new(Packet::new(vec![9], Direction::ToClient, PacketFlags::NONE)));
        assert_eq!(session.sync_items().unwrap(), 1);
        assert_eq!(session.len(), 2);
        assert_eq!(session.item(1).unwrap().index(), 1);
    }

    #[test]
    fn test_parse_all_counts_and_observes() {
        let log = lobby_log(&[&[0x00, 0x02, 0, 0, 0, 1], &[0x00, 0x02, 0, 0, 0, 2], &[0x7F]]);
        let protocol: Arc<dyn Protocol> = Arc::new(LobbyProtocol::new().unwrap());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_observer = Arc::clone(&seen);
        let session = ViewerSession::with_observer(
            log,
            Some(protocol),
            Box::new(move |_item| {
                seen_by_observer.fetch_add(1, Ordering::SeqCst);
            }),
        );
        session.sync_items().unwrap();

        session.parse_all();
        session.parse_all();

        assert_eq!(session.parsed_count(), 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        let first = session.item(0).unwrap();
        let parser = first.existing_parser().unwrap();
        assert!(parser.parsed_text().contains("tick = 1"));
    }

    #[test]
    fn test_without_protocol_nothing_parses() {
        let session = ViewerSession::new(lobby_log(&[&[0, 1]]), None);
        session.sync_items().unwrap();
        session.parse_all();
        assert_eq!(session.parsed_count(), 0);
    }
}
