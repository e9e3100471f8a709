//! Command-line argument definitions.

use clap::{Parser, ValueEnum};

use pktview_core::{Direction, PacketFlags};

use super::OutputFormat;

/// Packet direction as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Client to server
    ToServer,
    /// Server to client
    ToClient,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::ToServer => Direction::ToServer,
            DirectionArg::ToClient => Direction::ToClient,
        }
    }
}

/// Capture flag as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlagArg {
    Custom,
    Freezed,
    Trailing,
    Fragmented,
}

impl FlagArg {
    /// Combine flags into a set.
    pub fn collect(flags: &[FlagArg]) -> PacketFlags {
        flags.iter().fold(PacketFlags::NONE, |set, flag| {
            set | match flag {
                FlagArg::Custom => PacketFlags::CUSTOM,
                FlagArg::Freezed => PacketFlags::FREEZED,
                FlagArg::Trailing => PacketFlags::TRAILING,
                FlagArg::Fragmented => PacketFlags::FRAGMENTED,
            }
        })
    }
}

/// Dissect captured protocol packets given as hex.
#[derive(Parser, Debug)]
#[command(name = "pktview")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Packet payloads in hex, one per argument (e.g. "01 00 2a 00 00 00")
    #[arg(value_name = "HEX")]
    pub payloads: Vec<String>,

    /// Protocol used to decode the payloads
    #[arg(short = 'p', long = "protocol", default_value = "realm")]
    pub protocol: String,

    /// Direction of every payload
    #[arg(short = 'd', long = "direction", value_enum, default_value = "to-server")]
    pub direction: DirectionArg,

    /// Capture flags attached to every payload
    #[arg(long = "flags", value_enum, value_delimiter = ',')]
    pub flags: Vec<FlagArg>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Spaces per nesting level in parsed text
    #[arg(long = "indent", value_name = "N")]
    pub indent: Option<usize>,

    /// Maximum bytes shown for byte fields
    #[arg(long = "hex-limit", value_name = "N")]
    pub hex_limit: Option<usize>,

    /// List available protocols
    #[arg(long = "list-protocols")]
    pub list_protocols: bool,

    /// List the opcodes of the selected protocol
    #[arg(long = "opcodes")]
    pub opcodes: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Check if any rendering option was overridden.
    pub fn overrides_rendering(&self) -> bool {
        self.indent.is_some() || self.hex_limit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pktview", "01 00"]).unwrap();
        assert_eq!(args.protocol, "realm");
        assert_eq!(args.direction, DirectionArg::ToServer);
        assert_eq!(args.payloads, vec!["01 00".to_string()]);
        assert!(!args.overrides_rendering());
    }

    #[test]
    fn test_flags_and_direction() {
        let args = Args::try_parse_from([
            "pktview",
            "-p",
            "line",
            "-d",
            "to-client",
            "--flags",
            "custom,trailing",
            "--hex-limit",
            "8",
            "-vv",
        ])
        .unwrap();
        assert_eq!(Direction::from(args.direction), Direction::ToClient);
        assert_eq!(
            FlagArg::collect(&args.flags),
            PacketFlags::CUSTOM | PacketFlags::TRAILING
        );
        assert_eq!(args.verbose, 2);
        assert!(args.overrides_rendering());
    }
}
