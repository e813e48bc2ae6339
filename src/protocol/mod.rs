//! MAVLink v2 framing and payload decoding
//!
//! [`Parser`] turns a byte stream into [`Packet`]s; [`decode_fields`] maps a
//! payload onto its message definition.

mod field;
mod header;
mod packet;
mod parser;
mod stats;
mod types;
mod value;

pub use field::{decode_fields, wire_order};
pub use header::FrameHeader;
pub use packet::Packet;
pub use parser::{ParseEvent, Parser, ParserState};
pub use stats::ParserStats;
pub use types::{CompatFlags, IncompatFlags};
pub use value::{Fields, Value};

/// MAVLink v2 start-of-frame marker
pub const FRAME_MARKER: u8 = 0xFD;

/// Header size in bytes, marker included
pub const HEADER_LEN: usize = 10;

/// Checksum size in bytes
pub const CHECKSUM_LEN: usize = 2;

/// Signature size in bytes, present when [`IncompatFlags::SIGNED`] is set
pub const SIGNATURE_LEN: usize = 13;

/// Largest possible frame: full payload plus signature
pub const MAX_FRAME_LEN: usize = HEADER_LEN + u8::MAX as usize + CHECKSUM_LEN + SIGNATURE_LEN;
