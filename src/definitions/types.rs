//! Message, field and enum schema records

use std::collections::BTreeMap;
use std::fmt;

/// Primitive wire types a field token can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `uint8_t`
    U8,
    /// `int8_t`
    I8,
    /// `uint16_t`
    U16,
    /// `int16_t`
    I16,
    /// `uint32_t`
    U32,
    /// `int32_t`
    I32,
    /// `uint64_t`
    U64,
    /// `int64_t`
    I64,
    /// `float`
    F32,
    /// `double`
    F64,
    /// `char`
    Char,
    /// `uint8_t_mavlink_version`, laid out as a plain `uint8_t`
    MavlinkVersion,
}

impl Primitive {
    /// Resolve a bare type name
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "uint8_t" => Some(Self::U8),
            "int8_t" => Some(Self::I8),
            "uint16_t" => Some(Self::U16),
            "int16_t" => Some(Self::I16),
            "uint32_t" => Some(Self::U32),
            "int32_t" => Some(Self::I32),
            "uint64_t" => Some(Self::U64),
            "int64_t" => Some(Self::I64),
            "float" => Some(Self::F32),
            "double" => Some(Self::F64),
            "char" => Some(Self::Char),
            "uint8_t_mavlink_version" => Some(Self::MavlinkVersion),
            _ => None,
        }
    }

    /// Type name as written in schema documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::U8 => "uint8_t",
            Self::I8 => "int8_t",
            Self::U16 => "uint16_t",
            Self::I16 => "int16_t",
            Self::U32 => "uint32_t",
            Self::I32 => "int32_t",
            Self::U64 => "uint64_t",
            Self::I64 => "int64_t",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Char => "char",
            Self::MavlinkVersion => "uint8_t_mavlink_version",
        }
    }

    /// Encoded width in bytes
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Char | Self::MavlinkVersion => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Check if this is an integer type
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64 | Self::Char)
    }

    /// Check if this is a signed integer type
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved field layout: a primitive, optionally repeated `N` times.
///
/// `char[N]` is a fixed-length string; any other `type[N]` is an array
/// of `N` scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    primitive: Primitive,
    len: Option<usize>,
}

impl FieldType {
    /// Scalar field of the given primitive
    #[must_use]
    pub const fn scalar(primitive: Primitive) -> Self {
        Self {
            primitive,
            len: None,
        }
    }

    /// Fixed-length array (or string, for `char`)
    #[must_use]
    pub const fn array(primitive: Primitive, len: usize) -> Self {
        Self {
            primitive,
            len: Some(len),
        }
    }

    /// Parse a type token such as `uint16_t` or `char[50]`
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(primitive) = Primitive::from_token(token) {
            return Some(Self::scalar(primitive));
        }

        let (base, rest) = token.split_once('[')?;
        let digits = rest.strip_suffix(']')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let len = digits.parse().ok()?;
        Primitive::from_token(base).map(|primitive| Self::array(primitive, len))
    }

    /// Element primitive
    #[must_use]
    pub const fn primitive(self) -> Primitive {
        self.primitive
    }

    /// Array length, `None` for scalars
    #[must_use]
    pub const fn array_len(self) -> Option<usize> {
        self.len
    }

    /// Check if this is a `char[N]` string
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self.primitive, Primitive::Char) && self.len.is_some()
    }

    /// Total bytes occupied on the wire
    #[must_use]
    pub const fn wire_size(self) -> usize {
        match self.len {
            Some(len) => self.primitive.size() * len,
            None => self.primitive.size(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len {
            Some(len) => write!(f, "{}[{len}]", self.primitive),
            None => write!(f, "{}", self.primitive),
        }
    }
}

/// One field of a message, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Resolved wire layout
    pub kind: FieldType,
    /// Name of the enum giving this field's values meaning
    pub enum_name: Option<String>,
    /// Declared after the `<extensions/>` marker
    pub extension: bool,
    /// Unit annotation, if any
    pub units: Option<String>,
}

impl FieldSchema {
    /// Create a base (non-extension) field
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            enum_name: None,
            extension: false,
            units: None,
        }
    }

    /// Attach an enum reference
    #[must_use]
    pub fn with_enum(mut self, enum_name: impl Into<String>) -> Self {
        self.enum_name = Some(enum_name.into());
        self
    }

    /// Mark as an extension field
    #[must_use]
    pub fn extension(mut self) -> Self {
        self.extension = true;
        self
    }
}

/// A message definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    /// 24-bit message id
    pub id: u32,
    /// Message name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldSchema>,
    /// Marked `<deprecated>` or `<superseded>`
    pub deprecated: bool,
}

impl MessageSchema {
    /// Create an empty message definition
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields: Vec::new(),
            deprecated: false,
        }
    }

    /// Look up a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Bytes needed to hold every field, extensions included
    #[must_use]
    pub fn wire_size(&self) -> usize {
        self.fields.iter().map(|field| field.kind.wire_size()).sum()
    }
}

/// An enum or bitmask definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumSchema {
    /// Enum name
    pub name: String,
    /// Values are independent bit flags
    pub bitmask: bool,
    /// Value to entry label; a repeated value keeps the last label parsed
    pub entries: BTreeMap<i64, String>,
    /// Marked `<deprecated>` or `<superseded>`
    pub deprecated: bool,
}

impl EnumSchema {
    /// Create an empty enum
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Label for an exact value
    #[must_use]
    pub fn label(&self, value: i64) -> Option<&str> {
        self.entries.get(&value).map(String::as_str)
    }
}

/// Message lookup key: numeric id or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey<'a> {
    /// Lookup by id
    Id(u32),
    /// Lookup by name
    Name(&'a str),
}

impl From<u32> for MessageKey<'_> {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for MessageKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for MessageKey<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}
