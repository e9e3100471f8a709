//! Output formatting for parsed packets.

use std::io::Write;

use clap::ValueEnum;

use pktview_core::{format_hex, ViewerItem};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full parsed text per packet (default)
    Text,
    /// One summary line per packet
    Brief,
}

/// Writes parsed items.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write one parsed item.
    ///
    /// Items without a parser are written as raw hex.
    pub fn write<W: Write>(&self, item: &ViewerItem, writer: &mut W) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(item, writer),
            OutputFormat::Brief => self.write_brief(item, writer),
        }
    }

    fn header(item: &ViewerItem) -> &str {
        item.display_or_init(|item| {
            let packet = item.packet();
            let mut header = format!(
                "#{} {} {} bytes",
                item.index(),
                packet.direction().as_str(),
                packet.len()
            );
            if !packet.flags().is_empty() {
                header.push_str(&format!(" [{:?}]", packet.flags()));
            }
            header.into()
        })
    }

    fn write_text<W: Write>(&self, item: &ViewerItem, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", Self::header(item))?;
        match item.existing_parser() {
            Some(parser) => {
                let text = parser.parsed_text();
                if text.is_empty() {
                    writeln!(writer, "(no decoder) {}", format_hex(item.packet().data(), 32))?;
                } else {
                    writer.write_all(text.as_bytes())?;
                }
            }
            None => writeln!(writer, "{}", format_hex(item.packet().data(), 32))?,
        }
        writeln!(writer)
    }

    fn write_brief<W: Write>(&self, item: &ViewerItem, writer: &mut W) -> std::io::Result<()> {
        let (decoder, status) = match item.existing_parser() {
            Some(parser) => {
                let status = if parser.parsing_error() { "ERROR" } else { "ok" };
                let name = parser
                    .contained_data()
                    .first()
                    .map(|record| record.name)
                    .unwrap_or(parser.decoder_name());
                (name, status)
            }
            None => ("-", "-"),
        };
        writeln!(writer, "{:<40} {:<24} {}", Self::header(item), decoder, status)
    }
}
