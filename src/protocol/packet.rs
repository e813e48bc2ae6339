//! Completed MAVLink v2 packets

use bytes::Bytes;

use super::{CompatFlags, Fields, FrameHeader, IncompatFlags, Value};
use crate::definitions::Definitions;

/// One complete frame as seen on the wire, plus its decoded fields.
///
/// Checksum and signature are captured verbatim and never validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    header: FrameHeader,
    raw: Bytes,
    payload: Bytes,
    checksum: u16,
    signature: Bytes,
    fields: Fields,
}

impl Packet {
    pub(crate) fn from_parts(
        header: FrameHeader,
        raw: Bytes,
        payload: Bytes,
        checksum: u16,
        signature: Bytes,
    ) -> Self {
        Self {
            header,
            raw,
            payload,
            checksum,
            signature,
            fields: Fields::new(),
        }
    }

    pub(crate) fn set_fields(&mut self, fields: Fields) {
        self.fields = fields;
    }

    /// Get header
    #[must_use]
    pub const fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Full frame, marker through signature
    #[must_use]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Get payload length
    #[must_use]
    pub const fn payload_length(&self) -> u8 {
        self.header.payload_len
    }

    /// Get incompatibility flags
    #[must_use]
    pub const fn incompat_flags(&self) -> IncompatFlags {
        self.header.incompat
    }

    /// Get compatibility flags
    #[must_use]
    pub const fn compat_flags(&self) -> CompatFlags {
        self.header.compat
    }

    /// Get sequence number
    #[must_use]
    pub const fn sequence(&self) -> u8 {
        self.header.sequence
    }

    /// Get sending system id
    #[must_use]
    pub const fn system_id(&self) -> u8 {
        self.header.system_id
    }

    /// Get sending component id
    #[must_use]
    pub const fn component_id(&self) -> u8 {
        self.header.component_id
    }

    /// Get 24-bit message id
    #[must_use]
    pub const fn message_id(&self) -> u32 {
        self.header.message_id
    }

    /// Get payload
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get checksum as received
    #[must_use]
    pub const fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Get signature: 13 bytes for signed frames, empty otherwise
    #[must_use]
    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    /// Check if the frame carried a signature
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.header.incompat.is_signed()
    }

    /// Decoded fields; empty when the message id is not in the catalog
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Look up one decoded field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Consume the packet and return its fields
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Message name from the catalog, or `id(N)` when it is unknown or the
    /// catalog cannot be loaded.
    #[must_use]
    pub fn message_name(&self, definitions: &Definitions) -> String {
        match definitions.get_message(self.message_id()) {
            Ok(Some(message)) => message.name.clone(),
            _ => format!("id({})", self.message_id()),
        }
    }

    /// `sys:comp`, extended with ` -> tsys:tcomp` when the message
    /// addresses a target.
    #[must_use]
    pub fn route(&self) -> String {
        let source = format!("{}:{}", self.system_id(), self.component_id());
        match (self.field("target_system"), self.field("target_component")) {
            (Some(system), Some(component)) => format!("{source} -> {system}:{component}"),
            _ => source,
        }
    }
}
