//! Fuzz target for the full item pipeline.
//!
//! Builds a one-packet session per built-in protocol and parses it. The first
//! input byte picks the direction. Tests:
//! - Error containment: parsing never panics and never returns an error
//! - Idempotence: a second read returns the same text and flag
//! - Undefined packets are never flagged

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use pktview_core::{
    create_protocols, Direction, MemoryLog, Packet, PacketFlags, Protocol, ViewerSession,
};

fuzz_target!(|data: &[u8]| {
    let Some((&first, payload)) = data.split_first() else {
        return;
    };
    let direction = if first & 1 == 0 {
        Direction::ToServer
    } else {
        Direction::ToClient
    };

    let Ok(protocols) = create_protocols() else {
        return;
    };
    for protocol in protocols {
        let protocol: Arc<dyn Protocol> = Arc::from(protocol);
        let log = Arc::new(MemoryLog::new("fuzz"));
        log.push(Arc::new(Packet::new(payload.to_vec(), direction, PacketFlags::NONE)));

        let session = ViewerSession::new(log, Some(protocol));
        if session.sync_items().is_err() {
            return;
        }
        let Some(item) = session.item(0) else {
            return;
        };
        let Some(parser) = item.parse() else {
            return;
        };

        let text = parser.parsed_text().to_string();
        let error = parser.parsing_error();
        parser.parse();
        assert_eq!(parser.parsed_text(), text);
        assert_eq!(parser.parsing_error(), error);

        if parser.dissector().is_undefined() {
            assert!(text.is_empty());
            assert!(!error);
        }
        assert_eq!(session.parsed_count(), 1);
    }
});
