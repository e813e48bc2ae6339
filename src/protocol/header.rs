//! MAVLink v2 frame header

use super::{CompatFlags, IncompatFlags};

/// The fixed 10-byte MAVLink v2 header.
///
/// # Wire Format
///
/// ```text
/// 0        1        2        3        4        5        6        7  8  9
/// +--------+--------+--------+--------+--------+--------+--------+--------+
/// | marker | length | incomp |  comp  |  seq   | sysid  | compid | msgid  |
/// |  0xFD  |        | flags  | flags  |        |        |        | (3 LE) |
/// +--------+--------+--------+--------+--------+--------+--------+--------+
/// [PAYLOAD (length)] [CHECKSUM (2, LE)] [SIGNATURE (13, if incomp bit 0)]
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameHeader {
    pub(crate) payload_len: u8,
    pub(crate) incompat: IncompatFlags,
    pub(crate) compat: CompatFlags,
    pub(crate) sequence: u8,
    pub(crate) system_id: u8,
    pub(crate) component_id: u8,
    pub(crate) message_id: u32,
}

impl FrameHeader {
    /// Get payload length
    #[must_use]
    pub const fn payload_len(&self) -> u8 {
        self.payload_len
    }

    /// Get incompatibility flags
    #[must_use]
    pub const fn incompat_flags(&self) -> IncompatFlags {
        self.incompat
    }

    /// Get compatibility flags
    #[must_use]
    pub const fn compat_flags(&self) -> CompatFlags {
        self.compat
    }

    /// Get sequence number
    #[must_use]
    pub const fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Get sending system id
    #[must_use]
    pub const fn system_id(&self) -> u8 {
        self.system_id
    }

    /// Get sending component id
    #[must_use]
    pub const fn component_id(&self) -> u8 {
        self.component_id
    }

    /// Get 24-bit message id
    #[must_use]
    pub const fn message_id(&self) -> u32 {
        self.message_id
    }
}
