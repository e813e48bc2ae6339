//! Header flag bytes

use std::fmt;

/// Incompatibility flags: bits a receiver must understand to parse the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IncompatFlags(u8);

impl IncompatFlags {
    /// Frame carries a 13-byte signature after the checksum
    pub const SIGNED: u8 = 1 << 0;

    /// Create from byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Convert to byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Check if a signature follows the checksum
    #[must_use]
    pub const fn is_signed(self) -> bool {
        self.has(Self::SIGNED)
    }
}

impl fmt::Display for IncompatFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unknown = self.0 & !Self::SIGNED;
        match (self.is_signed(), unknown) {
            (false, 0) => write!(f, "NONE"),
            (true, 0) => write!(f, "SIGNED"),
            (false, bits) => write!(f, "{bits:#04x}"),
            (true, bits) => write!(f, "SIGNED | {bits:#04x}"),
        }
    }
}

/// Compatibility flags: bits a receiver may ignore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompatFlags(u8);

impl CompatFlags {
    /// Create from byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Convert to byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }
}
