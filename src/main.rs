//! pktview CLI entry point.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pktview::cli::{Args, FlagArg, OutputFormatter, WithRenderOptions};
use pktview::dissect_hex;
use pktview_core::{create_protocols, find_protocol, protocol_types, Protocol};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    // Handle info-only commands
    if args.list_protocols {
        return list_protocols();
    }

    let protocol = find_protocol(&args.protocol)
        .context("Failed to initialize protocols")?
        .with_context(|| {
            format!(
                "Unknown protocol: {}. Use --list-protocols to see available protocols.",
                args.protocol
            )
        })?;

    if args.opcodes {
        list_opcodes(protocol.as_ref());
        return Ok(());
    }

    if args.payloads.is_empty() {
        bail!("No payloads given. Use --help for usage.");
    }

    let protocol: Arc<dyn Protocol> = if args.overrides_rendering() {
        Arc::new(WithRenderOptions::new(protocol, args.indent, args.hex_limit))
    } else {
        Arc::from(protocol)
    };

    let session = dissect_hex(
        protocol,
        &args.payloads,
        args.direction.into(),
        FlagArg::collect(&args.flags),
    )?;

    let formatter = OutputFormatter::new(args.format);
    let mut stdout = io::stdout().lock();
    for item in session.items() {
        formatter.write(&item, &mut stdout)?;
    }
    stdout.flush()?;

    let failed = session
        .items()
        .iter()
        .filter(|item| item.existing_parser().is_some_and(|p| p.parsing_error()))
        .count();
    if failed > 0 {
        eprintln!("{failed} of {} packets had parsing errors", session.len());
    }
    Ok(())
}

fn list_protocols() -> Result<()> {
    println!("Available Protocols:");
    println!("{:-<50}", "");

    let protocols = create_protocols().context("Failed to initialize protocols")?;
    for (ty, protocol) in protocol_types().iter().zip(&protocols) {
        println!("  {} ({})", protocol.display_name(), protocol.name());
        match protocol.registry() {
            Some(registry) => println!(
                "    {} opcodes, {} header",
                registry.len(),
                registry.byte_order().as_str()
            ),
            None => println!("    no opcodes"),
        }
        tracing::debug!(type_name = ty.type_name(), "listed protocol");
    }
    Ok(())
}

fn list_opcodes(protocol: &dyn Protocol) {
    let Some(opcodes) = protocol.opcode_type() else {
        println!("{} has no opcodes", protocol.display_name());
        return;
    };

    println!("{} opcodes ({}):", protocol.display_name(), opcodes.name());
    println!("{:-<50}", "");
    for (raw, name) in opcodes.entries() {
        let decoder = protocol
            .registry()
            .and_then(|r| r.get(raw as u16))
            .map(|d| d.type_name())
            .unwrap_or("(no decoder)");
        println!("  {raw:#06x}  {name:<20} {decoder}");
    }
}
