//! Fuzz target for the line protocol.
//!
//! Commands and replies are split on newlines, so arbitrary bytes hit the
//! UTF-8 checks and the reply code parser.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktview_core::protocol::{decode_payload, CommandDecoder, ReplyDecoder};

fuzz_target!(|data: &[u8]| {
    let (_, consumed) = decode_payload(&CommandDecoder, data);
    assert!(consumed <= data.len());

    let (_, consumed) = decode_payload(&ReplyDecoder, data);
    assert!(consumed <= data.len());
});
