//! Catalog configuration

use std::env;
use std::path::PathBuf;

/// Environment variable overriding [`DefinitionsConfig::root`]
pub const ROOT_ENV: &str = "MAVLENS_DEFINITIONS";

/// Environment variable overriding [`DefinitionsConfig::dialect`]
pub const DIALECT_ENV: &str = "MAVLENS_DIALECT";

/// Where schema documents live and which one to start from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefinitionsConfig {
    /// Directory include targets are resolved against.
    pub root: PathBuf,
    /// Root document, e.g. `common.xml` or `ardupilotmega.xml`.
    pub dialect: String,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("message_definitions/v1.0"),
            dialect: String::from("common.xml"),
        }
    }
}

impl DefinitionsConfig {
    /// Defaults, overridden by `MAVLENS_DEFINITIONS` / `MAVLENS_DIALECT` when set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = env::var_os(ROOT_ENV) {
            config.root = PathBuf::from(root);
        }
        if let Ok(dialect) = env::var(DIALECT_ENV) {
            if !dialect.is_empty() {
                config.dialect = dialect;
            }
        }
        config
    }

    /// Set the schema root directory
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the root document
    #[must_use]
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }
}
