//! Hex formatting and parsing.

use crate::error::DomainError;

/// Format bytes as space-separated lowercase hex.
///
/// At most `limit` bytes are shown; the rest are summarised as a count.
///
/// # Example
///
/// ```
/// use pktview_core::format::format_hex;
///
/// assert_eq!(format_hex(&[0xde, 0xad, 0xbe, 0xef], 16), "de ad be ef");
/// assert_eq!(format_hex(&[1, 2, 3, 4], 2), "01 02 ... (+2 bytes)");
/// assert_eq!(format_hex(&[], 16), "(none)");
/// ```
pub fn format_hex(bytes: &[u8], limit: usize) -> String {
    if bytes.is_empty() {
        return "(none)".to_string();
    }

    let shown = bytes.len().min(limit);
    let mut out = String::with_capacity(shown * 3 + 16);
    for (i, byte) in bytes[..shown].iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    if bytes.len() > shown {
        if shown > 0 {
            out.push(' ');
        }
        out.push_str(&format!("... (+{} bytes)", bytes.len() - shown));
    }
    out
}

/// Parse a hex string into bytes.
///
/// Whitespace, `:` and `-` separators are ignored, as is a leading `0x`.
///
/// # Example
///
/// ```
/// use pktview_core::format::parse_hex;
///
/// assert_eq!(parse_hex("01 00 ff").unwrap(), vec![0x01, 0x00, 0xff]);
/// assert_eq!(parse_hex("0x0100ff").unwrap(), vec![0x01, 0x00, 0xff]);
/// assert!(parse_hex("abc").is_err());
/// ```
pub fn parse_hex(input: &str) -> Result<Vec<u8>, DomainError> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let digits: Vec<u8> = body
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':' && *b != b'-')
        .collect();

    ::hex::decode(digits).map_err(|err| DomainError::InvalidArgument {
        argument: "hex",
        reason: err.to_string(),
    })
}
