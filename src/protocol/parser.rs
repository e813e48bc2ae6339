//! Byte-fed MAVLink v2 frame parser
//!
//! The parser is pushed one byte at a time and never blocks or fails. Bytes
//! outside a frame are dropped until the next marker, so the stream
//! resynchronizes on its own after corruption. Each byte yields a
//! [`ParseEvent`]: the marker byte reports [`ParseEvent::FrameStarted`], the
//! last checksum or signature byte reports the finished [`Packet`], and all
//! other bytes report [`ParseEvent::Pending`].

use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use tracing::{debug, trace, warn};

use super::field::decode_fields;
use super::{
    CompatFlags, FRAME_MARKER, FrameHeader, IncompatFlags, Packet, ParserStats, SIGNATURE_LEN,
};
use crate::definitions::Definitions;

/// What the parser expects next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserState {
    /// Scanning for `0xFD`
    #[default]
    AwaitingMarker,
    /// Payload length byte
    AwaitingLength,
    /// Incompatibility flags byte
    AwaitingIncompatFlags,
    /// Compatibility flags byte
    AwaitingCompatFlags,
    /// Sequence number byte
    AwaitingSequence,
    /// Sending system id
    AwaitingSystemId,
    /// Sending component id
    AwaitingComponentId,
    /// 24-bit little-endian message id
    AwaitingMessageId {
        /// Id bytes already consumed (0..=2)
        received: u8,
    },
    /// Payload bytes
    AwaitingPayload,
    /// 16-bit little-endian checksum
    AwaitingChecksum {
        /// Checksum bytes already consumed (0..=1)
        received: u8,
    },
    /// 13-byte signature of a signed frame
    AwaitingSignature,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// Nothing externally visible happened
    Pending,
    /// This byte was the marker of a new frame
    FrameStarted,
    /// This byte completed a frame
    Packet(Packet),
}

impl ParseEvent {
    /// Check if nothing happened
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if a frame began on this byte
    #[must_use]
    pub const fn is_frame_started(&self) -> bool {
        matches!(self, Self::FrameStarted)
    }

    /// Borrow the completed packet, if any
    #[must_use]
    pub const fn packet(&self) -> Option<&Packet> {
        match self {
            Self::Packet(packet) => Some(packet),
            _ => None,
        }
    }

    /// Take the completed packet, if any
    #[must_use]
    pub fn into_packet(self) -> Option<Packet> {
        match self {
            Self::Packet(packet) => Some(packet),
            _ => None,
        }
    }
}

/// Bytes of the frame in flight
#[derive(Debug, Default)]
struct Accumulator {
    header: FrameHeader,
    raw: BytesMut,
    payload: BytesMut,
    checksum: u16,
    signature: BytesMut,
}

impl Accumulator {
    fn clear(&mut self) {
        self.header = FrameHeader::default();
        self.raw.clear();
        self.payload.clear();
        self.checksum = 0;
        self.signature.clear();
    }
}

/// Frame parser for one byte stream.
///
/// Built with [`Parser::with_definitions`], completed packets carry decoded
/// fields; built with [`Parser::new`], they carry header and payload only.
#[derive(Debug, Default)]
pub struct Parser {
    definitions: Option<Arc<Definitions>>,
    state: ParserState,
    frame: Accumulator,
    stats: ParserStats,
    noise: u64,
    catalog_failed: bool,
}

impl Parser {
    /// Create a parser that does not decode fields
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that decodes fields through `definitions`.
    ///
    /// The catalog is loaded on the first completed frame if nobody has
    /// initialized it yet.
    #[must_use]
    pub fn with_definitions(definitions: Arc<Definitions>) -> Self {
        Self {
            definitions: Some(definitions),
            ..Self::default()
        }
    }

    /// Get the definitions used for field decoding
    #[must_use]
    pub fn definitions(&self) -> Option<&Arc<Definitions>> {
        self.definitions.as_ref()
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> ParserState {
        self.state
    }

    /// Get counters
    #[must_use]
    pub const fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Zero all counters
    pub fn reset_stats(&mut self) {
        self.stats = ParserStats::default();
    }

    /// Drop any partial frame and go back to scanning for a marker.
    pub fn reset(&mut self) {
        if self.state != ParserState::AwaitingMarker {
            self.stats.frames_abandoned += 1;
            debug!(
                state = ?self.state,
                buffered = self.frame.raw.len(),
                "abandoning partial frame"
            );
        }
        self.state = ParserState::AwaitingMarker;
        self.frame.clear();
        self.noise = 0;
    }

    /// Feed every byte of `data`, returning the packets completed on the way.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Packet> {
        data.iter()
            .filter_map(|&byte| self.parse_byte(byte).into_packet())
            .collect()
    }

    /// Consume one byte.
    pub fn parse_byte(&mut self, byte: u8) -> ParseEvent {
        self.stats.bytes_fed += 1;

        if self.state == ParserState::AwaitingMarker {
            return self.scan(byte);
        }

        self.frame.raw.put_u8(byte);
        let header = &mut self.frame.header;
        self.state = match self.state {
            ParserState::AwaitingMarker => ParserState::AwaitingMarker,
            ParserState::AwaitingLength => {
                header.payload_len = byte;
                ParserState::AwaitingIncompatFlags
            }
            ParserState::AwaitingIncompatFlags => {
                header.incompat = IncompatFlags::from_bits(byte);
                ParserState::AwaitingCompatFlags
            }
            ParserState::AwaitingCompatFlags => {
                header.compat = CompatFlags::from_bits(byte);
                ParserState::AwaitingSequence
            }
            ParserState::AwaitingSequence => {
                header.sequence = byte;
                ParserState::AwaitingSystemId
            }
            ParserState::AwaitingSystemId => {
                header.system_id = byte;
                ParserState::AwaitingComponentId
            }
            ParserState::AwaitingComponentId => {
                header.component_id = byte;
                ParserState::AwaitingMessageId { received: 0 }
            }
            ParserState::AwaitingMessageId { received } => {
                header.message_id |= u32::from(byte) << (8 * u32::from(received));
                match received {
                    0 | 1 => ParserState::AwaitingMessageId {
                        received: received + 1,
                    },
                    _ if header.payload_len == 0 => {
                        ParserState::AwaitingChecksum { received: 0 }
                    }
                    _ => ParserState::AwaitingPayload,
                }
            }
            ParserState::AwaitingPayload => {
                self.frame.payload.put_u8(byte);
                if self.frame.payload.len() >= usize::from(header.payload_len) {
                    ParserState::AwaitingChecksum { received: 0 }
                } else {
                    ParserState::AwaitingPayload
                }
            }
            ParserState::AwaitingChecksum { received: 0 } => {
                self.frame.checksum = u16::from(byte);
                ParserState::AwaitingChecksum { received: 1 }
            }
            ParserState::AwaitingChecksum { .. } => {
                self.frame.checksum |= u16::from(byte) << 8;
                if header.incompat.is_signed() {
                    ParserState::AwaitingSignature
                } else {
                    return self.complete();
                }
            }
            ParserState::AwaitingSignature => {
                self.frame.signature.put_u8(byte);
                if self.frame.signature.len() >= SIGNATURE_LEN {
                    return self.complete();
                }
                ParserState::AwaitingSignature
            }
        };
        ParseEvent::Pending
    }

    fn scan(&mut self, byte: u8) -> ParseEvent {
        if byte != FRAME_MARKER {
            self.stats.noise_bytes += 1;
            self.noise += 1;
            return ParseEvent::Pending;
        }

        if self.noise > 0 {
            trace!(discarded = self.noise, "resynchronized on frame marker");
            self.noise = 0;
        }
        self.frame.clear();
        self.frame.raw.put_u8(byte);
        self.stats.frames_started += 1;
        self.state = ParserState::AwaitingLength;
        trace!("frame started");
        ParseEvent::FrameStarted
    }

    fn complete(&mut self) -> ParseEvent {
        self.state = ParserState::AwaitingMarker;
        let frame = &mut self.frame;
        let mut packet = Packet::from_parts(
            std::mem::take(&mut frame.header),
            frame.raw.split().freeze(),
            frame.payload.split().freeze(),
            std::mem::take(&mut frame.checksum),
            frame.signature.split().freeze(),
        );

        self.stats.frames_completed += 1;
        if packet.is_signed() {
            self.stats.signed_frames += 1;
        }

        if let Some(definitions) = &self.definitions {
            match definitions.init() {
                Ok(catalog) => match catalog.message(packet.message_id()) {
                    Some(message) => {
                        let fields = decode_fields(message, packet.payload(), catalog);
                        packet.set_fields(fields);
                    }
                    None => self.stats.unknown_messages += 1,
                },
                Err(err) if !self.catalog_failed => {
                    self.catalog_failed = true;
                    warn!(
                        error = %err,
                        message_id = packet.message_id(),
                        "definitions unavailable, leaving fields empty"
                    );
                }
                Err(_) => {}
            }
        }

        trace!(
            message_id = packet.message_id(),
            sequence = packet.sequence(),
            len = packet.raw().len(),
            signed = packet.is_signed(),
            "frame complete"
        );
        ParseEvent::Packet(packet)
    }
}
