//! Decode MAVLink v2 frames given as hex on the command line.
//!
//! Run with `cargo run --example decode_hex -- fd0900...7950 [more frames]`.
//! Schema location comes from `MAVLENS_DEFINITIONS` / `MAVLENS_DIALECT`;
//! set `RUST_LOG=mavlens=trace` to watch the parser.

use std::env;
use std::sync::Arc;

use mavlens::{Definitions, DefinitionsConfig, Parser};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = DefinitionsConfig::from_env();
    let definitions = Arc::new(Definitions::from_config(&config));
    let catalog = definitions.init()?;
    println!(
        "{} messages, {} enums from {}",
        catalog.message_count(),
        catalog.enum_count(),
        config.root.join(&config.dialect).display()
    );

    let mut parser = Parser::with_definitions(Arc::clone(&definitions));
    for arg in env::args().skip(1) {
        let bytes = hex::decode(arg.trim())?;
        for packet in parser.feed(&bytes) {
            println!(
                "\n{} seq={} route={}{}",
                packet.message_name(&definitions),
                packet.sequence(),
                packet.route(),
                if packet.is_signed() { " (signed)" } else { "" }
            );
            for (name, value) in packet.fields() {
                println!("  {name:<40} {value}");
            }
        }
    }

    let stats = parser.stats();
    println!(
        "\nframes={} noise_bytes={} unknown={} in_flight={}",
        stats.frames_completed,
        stats.noise_bytes,
        stats.unknown_messages,
        stats.in_flight()
    );
    Ok(())
}
