//! Fuzz target for the lobby protocol layouts.
//!
//! Lobby opcodes are big-endian and every message is layout-driven, so this
//! mostly exercises the layout walker: count-prefixed room lists, u8-prefixed
//! strings and NUL-terminated strings.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktview_core::protocol::LobbyProtocol;
use pktview_core::{Protocol, RenderOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(lobby) = LobbyProtocol::new() else {
        return;
    };
    let Some(registry) = lobby.registry() else {
        return;
    };

    for opcode in registry.opcodes() {
        if let Some((Ok(record), consumed)) = registry.decode(opcode, data) {
            assert!(consumed <= data.len());
            // Rendering must not panic on anything the decoder accepted.
            let _ = record.render(&RenderOptions::default());
        }
    }
});
