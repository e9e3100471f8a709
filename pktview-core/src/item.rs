//! Viewer items: one captured packet as shown by a viewer.
//!
//! A [`ViewerItem`] binds a packet to its log and position, and lazily owns
//! the [`Parser`] for it. The parser is created on first request by the
//! protocol the viewer currently uses, and never replaced afterwards.

use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

use compact_str::CompactString;

use crate::error::DomainError;
use crate::packet::Packet;
use crate::parser::Parser;
use crate::protocol::Protocol;

/// A source of captured packets.
pub trait NetworkLog: Send + Sync {
    /// Display name of the log.
    fn name(&self) -> &str;

    /// Number of packets in the log.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packet at `index`, if present.
    fn packet(&self, index: usize) -> Option<Arc<Packet>>;
}

/// The display side that owns items.
pub trait Viewer: Send + Sync {
    /// Protocol used to create parsers, if one is selected.
    fn protocol(&self) -> Option<Arc<dyn Protocol>>;

    /// Called once per parser, right after its decode completes.
    ///
    /// Runs on the thread that performed the decode, outside the parser's lock.
    fn on_parsing_done(&self, _item: &ViewerItem) {}
}

/// One packet inside a viewer.
pub struct ViewerItem {
    viewer: Weak<dyn Viewer>,
    log: Arc<dyn NetworkLog>,
    packet: Arc<Packet>,
    index: usize,
    parser: OnceLock<Arc<Parser>>,
    cache: OnceLock<Box<dyn Any + Send + Sync>>,
    display_cache: OnceLock<CompactString>,
}

impl ViewerItem {
    /// Create an item for the packet at `index` of `log`.
    ///
    /// Fails if the viewer is gone or `index` is outside the log.
    pub fn new(
        viewer: Weak<dyn Viewer>,
        log: Arc<dyn NetworkLog>,
        packet: Arc<Packet>,
        index: usize,
    ) -> Result<Arc<Self>, DomainError> {
        if viewer.strong_count() == 0 {
            return Err(DomainError::InvalidArgument {
                argument: "viewer",
                reason: "viewer has been dropped".to_string(),
            });
        }
        if index >= log.len() {
            return Err(DomainError::InvalidArgument {
                argument: "index",
                reason: format!("{index} is outside log {:?} of {} packets", log.name(), log.len()),
            });
        }

        Ok(Arc::new(Self {
            viewer,
            log,
            packet,
            index,
            parser: OnceLock::new(),
            cache: OnceLock::new(),
            display_cache: OnceLock::new(),
        }))
    }

    /// The owning viewer, while it is alive.
    pub fn viewer(&self) -> Option<Arc<dyn Viewer>> {
        self.viewer.upgrade()
    }

    pub fn log(&self) -> &Arc<dyn NetworkLog> {
        &self.log
    }

    pub fn packet(&self) -> &Arc<Packet> {
        &self.packet
    }

    /// Position of the packet in its log.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The item's parser, created on first call.
    ///
    /// Returns `None` while the viewer has no protocol. Once created, the
    /// same parser is returned even if the viewer later switches protocol.
    pub fn parser(self: &Arc<Self>) -> Option<&Arc<Parser>> {
        if let Some(parser) = self.parser.get() {
            return Some(parser);
        }
        let protocol = self.viewer()?.protocol()?;
        Some(
            self.parser
                .get_or_init(|| Arc::new(protocol.create_parser(self))),
        )
    }

    /// The parser, if one has been created. Never creates one.
    pub fn existing_parser(&self) -> Option<&Arc<Parser>> {
        self.parser.get()
    }

    /// Create the parser if needed and decode the packet.
    pub fn parse(self: &Arc<Self>) -> Option<&Arc<Parser>> {
        let parser = self.parser()?;
        parser.parse();
        Some(parser)
    }

    /// Viewer-defined cached value, computed on first access.
    ///
    /// The slot holds one value; asking for a different type than the one
    /// stored returns `None`.
    pub fn cached<T, F>(&self, init: F) -> Option<&T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.cache
            .get_or_init(|| Box::new(init()))
            .downcast_ref::<T>()
    }

    /// Cached display string, computed on first access.
    pub fn display_or_init<F>(&self, init: F) -> &str
    where
        F: FnOnce(&ViewerItem) -> CompactString,
    {
        self.display_cache.get_or_init(|| init(self)).as_str()
    }
}

impl std::fmt::Debug for ViewerItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerItem")
            .field("log", &self.log.name())
            .field("index", &self.index)
            .field("len", &self.packet.len())
            .field("direction", &self.packet.direction())
            .field("parsed", &self.parser.get().map(|p| p.is_parsed()))
            .finish()
    }
}
