//! Lazily built, shared message/enum lookup tables

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, instrument};

use super::loader::Loader;
use super::{
    DefinitionError, DirectorySource, DocumentSource, EnumSchema, MessageKey, MessageSchema,
    Result,
};
use crate::config::DefinitionsConfig;

/// Immutable tables built from one include graph.
#[derive(Debug, Default)]
pub struct Catalog {
    messages: Vec<MessageSchema>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    enums: HashMap<String, EnumSchema>,
    documents: Vec<String>,
    version: Option<u32>,
    dialect: Option<u32>,
}

impl Catalog {
    /// Build tables from already-parsed records, later entries replacing
    /// earlier ones with the same id or name.
    #[must_use]
    pub fn from_parts(
        messages: impl IntoIterator<Item = MessageSchema>,
        enums: impl IntoIterator<Item = EnumSchema>,
    ) -> Self {
        let messages: Vec<MessageSchema> = messages.into_iter().collect();
        let mut by_id = HashMap::with_capacity(messages.len());
        let mut by_name = HashMap::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            by_id.insert(message.id, index);
            by_name.insert(message.name.clone(), index);
        }

        let enums = enums
            .into_iter()
            .map(|schema| (schema.name.clone(), schema))
            .collect();

        Self {
            messages,
            by_id,
            by_name,
            enums,
            ..Self::default()
        }
    }

    /// Look up a message by id or name
    pub fn message<'k>(&self, key: impl Into<MessageKey<'k>>) -> Option<&MessageSchema> {
        let index = match key.into() {
            MessageKey::Id(id) => self.by_id.get(&id),
            MessageKey::Name(name) => self.by_name.get(name),
        }?;
        self.messages.get(*index)
    }

    /// Look up an enum by name
    #[must_use]
    pub fn enumeration(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.get(name)
    }

    /// Distinct message ids known to the catalog
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.by_id.len()
    }

    /// Distinct enum names known to the catalog
    #[must_use]
    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Documents parsed, in the order they were first visited
    #[must_use]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// `<version>` of the last document declaring one
    #[must_use]
    pub const fn version(&self) -> Option<u32> {
        self.version
    }

    /// `<dialect>` number of the last document declaring one
    #[must_use]
    pub const fn dialect(&self) -> Option<u32> {
        self.dialect
    }
}

/// Definition catalog rooted at one schema document.
///
/// Nothing is read until the first lookup (or an explicit [`init`]).
/// Concurrent first use blocks on a single load; afterwards lookups are
/// lock-free reads of immutable tables. A failed load is final for the
/// instance: later calls return [`DefinitionError::Unavailable`] wrapping
/// the first error and read nothing.
///
/// [`init`]: Definitions::init
pub struct Definitions {
    source: Box<dyn DocumentSource>,
    root: String,
    catalog: OnceCell<std::result::Result<Catalog, Arc<DefinitionError>>>,
}

impl Definitions {
    /// Catalog rooted at `root`, resolving includes through `source`
    pub fn new(source: impl DocumentSource + 'static, root: impl Into<String>) -> Self {
        Self {
            source: Box::new(source),
            root: root.into(),
            catalog: OnceCell::new(),
        }
    }

    /// Directory-backed catalog described by `config`
    #[must_use]
    pub fn from_config(config: &DefinitionsConfig) -> Self {
        Self::new(DirectorySource::new(&config.root), config.dialect.clone())
    }

    /// Catalog over tables that are already built
    #[must_use]
    pub fn preloaded(catalog: Catalog) -> Self {
        Self {
            source: Box::new(super::MemorySource::new()),
            root: String::new(),
            catalog: OnceCell::with_value(Ok(catalog)),
        }
    }

    /// Root document name
    #[must_use]
    pub fn root_document(&self) -> &str {
        &self.root
    }

    /// Check whether the tables have been built
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self.catalog.get(), Some(Ok(_)))
    }

    /// Check whether a load was attempted and failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.catalog.get(), Some(Err(_)))
    }

    /// Build the tables if needed; a no-op once attempted.
    pub fn init(&self) -> Result<&Catalog> {
        match self.catalog.get_or_init(|| self.build().map_err(Arc::new)) {
            Ok(catalog) => Ok(catalog),
            Err(cause) => Err(DefinitionError::Unavailable {
                document: self.root.clone(),
                source: Arc::clone(cause),
            }),
        }
    }

    /// Look up a message by id or name, loading on first use
    pub fn get_message<'k>(
        &self,
        key: impl Into<MessageKey<'k>>,
    ) -> Result<Option<&MessageSchema>> {
        Ok(self.init()?.message(key))
    }

    /// Look up an enum by name, loading on first use
    pub fn get_enum(&self, name: &str) -> Result<Option<&EnumSchema>> {
        Ok(self.init()?.enumeration(name))
    }

    #[instrument(level = "debug", skip(self), fields(root = %self.root))]
    fn build(&self) -> Result<Catalog> {
        let parsed = Loader::new(self.source.as_ref()).load(&self.root)?;

        let mut catalog = Catalog::from_parts(parsed.messages, parsed.enums);
        catalog.documents = parsed.documents;
        catalog.version = parsed.version;
        catalog.dialect = parsed.dialect;

        debug!(
            documents = catalog.documents.len(),
            messages = catalog.message_count(),
            enums = catalog.enum_count(),
            "definition catalog ready"
        );
        Ok(catalog)
    }
}

impl fmt::Debug for Definitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definitions")
            .field("root", &self.root)
            .field("initialized", &self.is_initialized())
            .field("failed", &self.is_failed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::definitions::{FieldSchema, FieldType, MemorySource, Primitive};

    struct CountingSource {
        inner: MemorySource,
        reads: Arc<AtomicUsize>,
    }

    impl DocumentSource for CountingSource {
        fn read(&self, name: &str) -> Result<String> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            self.inner.read(name)
        }
    }

    // root -> {left, right} -> base, with left cycling back to root
    fn diamond() -> MemorySource {
        MemorySource::new()
            .with_document(
                "root.xml",
                "<mavlink><include>left.xml</include><include>right.xml</include></mavlink>",
            )
            .with_document(
                "left.xml",
                r#"<mavlink><include>base.xml</include><include>root.xml</include>
                   <messages><message id="1" name="LEFT"/></messages></mavlink>"#,
            )
            .with_document(
                "right.xml",
                r#"<mavlink><include>base.xml</include>
                   <messages><message id="2" name="RIGHT"/></messages></mavlink>"#,
            )
            .with_document(
                "base.xml",
                r#"<mavlink><version>3</version><dialect>0</dialect>
                   <enums><enum name="BASE_ENUM"><entry value="0" name="ZERO"/></enum></enums>
                   <messages><message id="0" name="BASE"/></messages></mavlink>"#,
            )
    }

    #[test]
    fn test_lookup_by_id_and_name_share_record() {
        let definitions = Definitions::new(diamond(), "root.xml");
        assert!(!definitions.is_initialized());

        let by_id = definitions.get_message(2_u32).unwrap().unwrap();
        let by_name = definitions.get_message("RIGHT").unwrap().unwrap();
        assert!(std::ptr::eq(by_id, by_name));
        assert!(definitions.get_message(99_u32).unwrap().is_none());
        assert!(definitions.get_enum("BASE_ENUM").unwrap().is_some());
        assert!(definitions.get_enum("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_diamond_and_cycle_parse_each_document_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            inner: diamond(),
            reads: Arc::clone(&reads),
        };
        let definitions = Definitions::new(source, "root.xml");

        let catalog = definitions.init().unwrap();
        assert_eq!(catalog.documents(), ["root.xml", "left.xml", "base.xml", "right.xml"]);
        assert_eq!(catalog.message_count(), 3);
        assert_eq!(catalog.version(), Some(3));
        assert_eq!(catalog.dialect(), Some(0));
        assert_eq!(reads.load(Ordering::Relaxed), 4);

        definitions.init().unwrap();
        definitions.get_message(0_u32).unwrap();
        assert_eq!(reads.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_failed_load_is_reported_to_every_caller() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            inner: MemorySource::new()
                .with_document("root.xml", "<mavlink><include>gone.xml</include></mavlink>"),
            reads: Arc::clone(&reads),
        };
        let definitions = Definitions::new(source, "root.xml");

        let first = definitions.init().unwrap_err();
        assert!(matches!(
            first.cause(),
            DefinitionError::Io { document, .. } if document == "gone.xml"
        ));
        assert_eq!(reads.load(Ordering::Relaxed), 2);

        let again = definitions.get_message(0_u32).unwrap_err();
        assert!(matches!(
            again,
            DefinitionError::Unavailable { ref document, .. } if document == "root.xml"
        ));
        assert!(definitions.get_enum("ANY").is_err());
        assert!(definitions.init().is_err());
        assert_eq!(reads.load(Ordering::Relaxed), 2);

        assert!(!definitions.is_initialized());
        assert!(definitions.is_failed());
    }

    #[test]
    fn test_later_definitions_win() {
        let mut first = MessageSchema::new(5, "OLD");
        first.fields.push(FieldSchema::new("a", FieldType::scalar(Primitive::U8)));
        let second = MessageSchema::new(5, "NEW");

        let catalog = Catalog::from_parts([first, second], []);
        assert_eq!(catalog.message(5_u32).unwrap().name, "NEW");
        // the superseded name still resolves to its own record
        assert_eq!(catalog.message("OLD").unwrap().fields.len(), 1);
        assert_eq!(catalog.message_count(), 1);
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            inner: diamond(),
            reads: Arc::clone(&reads),
        };
        let definitions = Arc::new(Definitions::new(source, "root.xml"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let definitions = Arc::clone(&definitions);
                std::thread::spawn(move || definitions.get_message("BASE").unwrap().is_some())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(reads.load(Ordering::Relaxed), 4);
    }
}
