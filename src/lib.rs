//! mavlens - schema-driven MAVLink v2 stream decoder
//!
//! Decodes a raw telemetry byte stream into MAVLink v2 packets whose fields
//! are named, typed and resolved against the XML message definitions the
//! sender was built from.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mavlens::{Definitions, DefinitionsConfig, Parser};
//!
//! let definitions = Arc::new(Definitions::from_config(&DefinitionsConfig::from_env()));
//! definitions.init()?;
//!
//! let mut parser = Parser::with_definitions(definitions);
//! let frame = [
//!     0xFD, 0x09, 0x00, 0x00, 0xCF, 0x01, 0x01, 0x00, 0x00, 0x00, 0x04, 0x00,
//!     0x00, 0x00, 0x0A, 0x03, 0x01, 0x05, 0x03, 0x79, 0x50,
//! ];
//! for packet in parser.feed(&frame) {
//!     println!("{} {:?}", packet.route(), packet.fields());
//! }
//! # Ok::<(), mavlens::DefinitionError>(())
//! ```
//!
//! # Layers
//!
//! - **Definitions** - include-aware XML loader feeding a lazily built,
//!   shareable catalog of messages and enums
//! - **Parser** - byte-at-a-time framing that resynchronizes on noise
//! - **Field decoding** - wire-order unpacking with enum labels and bitmask
//!   flag lists
//!
//! Checksums and signatures are captured but not verified.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[cfg(feature = "serde")]
pub mod analyzer;
pub mod config;
pub mod definitions;
pub mod protocol;

#[cfg(feature = "serde")]
pub use analyzer::{Analyzer, AnalyzerFrame};
pub use config::DefinitionsConfig;
pub use definitions::{
    Catalog, DefinitionError, Definitions, DirectorySource, DocumentSource, MemorySource,
    Result,
};
pub use protocol::{
    FRAME_MARKER, Fields, Packet, ParseEvent, Parser, ParserState, ParserStats, Value,
};

/// MAVLink wire protocol version handled by this crate
pub const MAVLINK_VERSION: u8 = 2;
