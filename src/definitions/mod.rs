//! Definition catalog
//!
//! Parses a root schema document and everything it includes into message
//! and enum tables, then serves lookups by message id, message name and
//! enum name.

mod catalog;
mod error;
mod loader;
mod source;
mod types;

pub use catalog::{Catalog, Definitions};
pub use error::{DefinitionError, Result};
pub use source::{DirectorySource, DocumentSource, MemorySource};
pub use types::{EnumSchema, FieldSchema, FieldType, MessageKey, MessageSchema, Primitive};
