//! Fuzz target for the realm protocol decoders.
//!
//! Realm opcodes are little-endian. Exercises:
//! - ChatMessage length prefixes and the whisper-only target string
//! - MoveUpdate optional fall time behind the JUMPING flag
//! - Consumption audit on every registered opcode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktview_core::protocol::RealmProtocol;
use pktview_core::Protocol;

fuzz_target!(|data: &[u8]| {
    let Ok(realm) = RealmProtocol::new() else {
        return;
    };
    let Some(registry) = realm.registry() else {
        return;
    };

    // Route on the fuzzed header, then force every opcode over the same payload.
    if let Some(opcode) = registry.read_opcode(data) {
        if let Some((_, consumed)) = registry.decode(opcode, &data[2..]) {
            assert!(consumed <= data.len() - 2);
        }
    }
    for opcode in registry.opcodes() {
        if let Some((_, consumed)) = registry.decode(opcode, data) {
            assert!(consumed <= data.len());
        }
    }
});
