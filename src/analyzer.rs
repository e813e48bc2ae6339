//! Timeline adapter
//!
//! Wraps a [`Parser`] for hosts that deliver captured bytes in chunks, each
//! tagged with caller-defined start and end positions (timestamps, sample
//! indices). Every completed packet becomes one [`AnalyzerFrame`] spanning
//! from the chunk that held its marker byte to the chunk that finished it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::definitions::Definitions;
use crate::protocol::{ParseEvent, Packet, Parser};

/// Frame type reported for every decoded packet
pub const FRAME_TYPE: &str = "MAVLink";

/// Display template a host can use for [`FRAME_TYPE`] frames
pub const FRAME_FORMAT: &str = "{{data.message}}";

/// One decoded packet placed on the caller's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerFrame<T> {
    /// Always [`FRAME_TYPE`]
    pub kind: &'static str,
    /// Start of the chunk containing the marker byte
    pub start: T,
    /// End of the chunk containing the last byte
    pub end: T,
    /// `message`, `route`, `system_id`, `component_id` and `payload` (JSON)
    pub data: BTreeMap<&'static str, String>,
}

/// Chunk-fed packet decoder producing timeline frames.
#[derive(Debug)]
pub struct Analyzer<T> {
    definitions: Arc<Definitions>,
    parser: Parser,
    packet_start: Option<T>,
}

impl<T: Clone> Analyzer<T> {
    /// Create an analyzer decoding through `definitions`
    #[must_use]
    pub fn new(definitions: Arc<Definitions>) -> Self {
        Self {
            parser: Parser::with_definitions(Arc::clone(&definitions)),
            definitions,
            packet_start: None,
        }
    }

    /// Get the underlying parser
    #[must_use]
    pub const fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Feed one chunk spanning `start..end`.
    pub fn decode(&mut self, data: &[u8], start: T, end: T) -> Vec<AnalyzerFrame<T>> {
        let mut frames = Vec::new();
        for &byte in data {
            match self.parser.parse_byte(byte) {
                ParseEvent::Pending => {}
                ParseEvent::FrameStarted => self.packet_start = Some(start.clone()),
                ParseEvent::Packet(packet) => {
                    let frame_start = self.packet_start.take().unwrap_or_else(|| start.clone());
                    frames.push(AnalyzerFrame {
                        kind: FRAME_TYPE,
                        start: frame_start,
                        end: end.clone(),
                        data: self.describe(&packet),
                    });
                }
            }
        }
        frames
    }

    fn describe(&self, packet: &Packet) -> BTreeMap<&'static str, String> {
        let payload = serde_json::to_string(packet.fields()).unwrap_or_else(|err| {
            warn!(error = %err, message_id = packet.message_id(), "fields not serializable");
            String::from("{}")
        });

        BTreeMap::from([
            ("message", packet.message_name(&self.definitions)),
            ("route", packet.route()),
            ("system_id", packet.system_id().to_string()),
            ("component_id", packet.component_id().to_string()),
            ("payload", payload),
        ])
    }
}
