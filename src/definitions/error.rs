//! Schema loading errors

use std::sync::Arc;

use thiserror::Error;

/// Errors raised while building the definition catalog.
///
/// Any of these aborts the whole load.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// Document could not be read from its source
    #[error("cannot read schema document {document:?}: {source}")]
    Io {
        /// Document name as requested
        document: String,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Document is not well-formed XML
    #[error("malformed schema document {document:?}: {source}")]
    Xml {
        /// Document name
        document: String,
        /// Parser failure
        #[source]
        source: quick_xml::Error,
    },

    /// Document ended with an element still open
    #[error("schema document {document:?} ends inside <{tag}>")]
    UnclosedTag {
        /// Document name
        document: String,
        /// Innermost open element
        tag: String,
    },

    /// Document root is not `<mavlink>`
    #[error("schema document {document:?} has root <{found}>, expected <mavlink>")]
    UnexpectedRoot {
        /// Document name
        document: String,
        /// Root tag that was found
        found: String,
    },

    /// Element not allowed at this position
    #[error("unknown tag <{tag}> inside <{parent}> in {document:?}")]
    UnknownTag {
        /// Document name
        document: String,
        /// Enclosing element
        parent: String,
        /// Offending tag
        tag: String,
    },

    /// Required attribute is absent
    #[error("<{element}> in {document:?} is missing attribute {attribute:?}")]
    MissingAttribute {
        /// Document name
        document: String,
        /// Element tag
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
    },

    /// Attribute that must be numeric is not
    #[error("<{element}> in {document:?} has non-numeric value {value:?}")]
    InvalidNumber {
        /// Document name
        document: String,
        /// Element tag
        element: &'static str,
        /// Raw attribute text
        value: String,
    },

    /// `<include>` without a target document
    #[error("include without a filename in {document:?}")]
    EmptyInclude {
        /// Document name
        document: String,
    },

    /// Field type token that has no wire layout
    #[error("field {message}.{field} has unsupported type {token:?}")]
    InvalidFieldType {
        /// Owning message name
        message: String,
        /// Field name
        field: String,
        /// Type token as written
        token: String,
    },

    /// Catalog load failed; every later lookup reports the same cause
    #[error("definitions rooted at {document:?} are unavailable: {source}")]
    Unavailable {
        /// Root document of the catalog
        document: String,
        /// First failure, shared by every caller
        #[source]
        source: Arc<DefinitionError>,
    },
}

impl DefinitionError {
    /// Error that caused the catalog load to fail.
    ///
    /// Unwraps [`DefinitionError::Unavailable`]; any other variant is its
    /// own cause.
    #[must_use]
    pub fn cause(&self) -> &Self {
        match self {
            Self::Unavailable { source, .. } => source,
            other => other,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DefinitionError>;
