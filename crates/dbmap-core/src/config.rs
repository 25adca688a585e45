//! Import and class generation configuration.

/// Default name of an imported map.
pub const DEFAULT_MAP_NAME: &str = "datamap";

/// Default table name pattern (SQL `LIKE` syntax): every table.
pub const DEFAULT_TABLE_PATTERN: &str = "%";

/// Default table types to import.
pub const DEFAULT_TABLE_TYPES: &[&str] = &["TABLE"];

/// Default prefix of a generated superclass.
pub const DEFAULT_SUPERCLASS_PREFIX: &str = "_";

/// Reverse-engineering configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Name of the produced map.
    pub map_name: String,

    /// Catalog to read from. `None` reads from the connection's default.
    pub catalog: Option<String>,

    /// Schema pattern. `None` does not filter on schema.
    pub schema_pattern: Option<String>,

    /// Table name pattern.
    pub table_pattern: String,

    /// Table types to import (e.g. `TABLE`, `VIEW`).
    pub table_types: Vec<String>,

    /// Package prefixed to generated class names.
    pub class_package: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            map_name: DEFAULT_MAP_NAME.to_string(),
            catalog: None,
            schema_pattern: None,
            table_pattern: DEFAULT_TABLE_PATTERN.to_string(),
            table_types: DEFAULT_TABLE_TYPES.iter().map(|t| t.to_string()).collect(),
            class_package: None,
        }
    }
}

impl ImportConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the map name.
    pub fn with_map_name(mut self, name: impl Into<String>) -> Self {
        self.map_name = name.into();
        self
    }

    /// Set the catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Set the schema pattern.
    pub fn with_schema_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.schema_pattern = Some(pattern.into());
        self
    }

    /// Set the table name pattern.
    pub fn with_table_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.table_pattern = pattern.into();
        self
    }

    /// Replace the table types.
    pub fn with_table_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the class package.
    pub fn with_class_package(mut self, package: impl Into<String>) -> Self {
        self.class_package = Some(package.into());
        self
    }
}

/// How classes are laid out per object entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// One class per entity.
    #[default]
    SingleClass,
    /// A generated superclass and an editable subclass per entity.
    Pair,
}

/// Class generation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Generation mode.
    pub mode: GenerationMode,

    /// Prefix of superclass names in pair mode.
    pub superclass_prefix: String,

    /// Package for superclasses. `None` keeps them in the entity's package.
    pub super_package: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            superclass_prefix: DEFAULT_SUPERCLASS_PREFIX.to_string(),
            super_package: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generation mode.
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the superclass prefix.
    pub fn with_superclass_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.superclass_prefix = prefix.into();
        self
    }

    /// Set the superclass package.
    pub fn with_super_package(mut self, package: impl Into<String>) -> Self {
        self.super_package = Some(package.into());
        self
    }
}
