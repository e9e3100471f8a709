//! pktview - Dissect captured protocol packets into structured text.
//!
//! This library holds the command-line layer on top of [`pktview_core`].
//! The dissection engine itself lives in that crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pktview::dissect_hex;
//! use pktview_core::{find_protocol, Direction, PacketFlags, Protocol};
//!
//! let protocol: Arc<dyn Protocol> = find_protocol("lobby").unwrap().unwrap().into();
//! let payloads = ["00 02 00 00 00 2a"];
//! let session = dissect_hex(protocol, &payloads, Direction::ToClient, PacketFlags::NONE)?;
//! let item = session.item(0).unwrap();
//! assert!(item.existing_parser().unwrap().parsed_text().contains("tick = 42"));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};

use pktview_core::{
    parse_hex, Direction, MemoryLog, NetworkLog, Packet, PacketFlags, Protocol, ViewerSession,
};

/// Build a session from hex payloads and parse every packet.
pub fn dissect_hex<S: AsRef<str>>(
    protocol: Arc<dyn Protocol>,
    payloads: &[S],
    direction: Direction,
    flags: PacketFlags,
) -> Result<Arc<ViewerSession>> {
    let log = Arc::new(MemoryLog::new("command line"));
    for (i, payload) in payloads.iter().enumerate() {
        let data = parse_hex(payload.as_ref())
            .with_context(|| format!("Invalid hex in payload {}", i + 1))?;
        log.push(Arc::new(Packet::new(data, direction, flags)));
    }
    tracing::debug!(packets = log.len(), protocol = protocol.name(), "log built");

    let session = ViewerSession::new(log, Some(protocol));
    session
        .sync_items()
        .context("Failed to create viewer items")?;
    session.parse_all();
    Ok(session)
}
