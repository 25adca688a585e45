//! The catalog inspection interface consumed by the importer.

use crate::error::IntrospectionError;

/// Result of an introspection call.
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;

/// A table-like object of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    /// Catalog-specific type, e.g. `TABLE` or `VIEW`.
    pub table_type: String,
    pub schema: Option<String>,
    pub catalog: Option<String>,
}

impl TableInfo {
    /// A plain table outside any schema or catalog.
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: "TABLE".to_string(),
            schema: None,
            catalog: None,
        }
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// SQL type code (see [`crate::map::types`]).
    pub sql_type: i32,
    /// Declared size: maximum length for character data, precision for
    /// numbers.
    pub size: Option<u32>,
    /// Digits right of the decimal point.
    pub decimal_digits: Option<u32>,
    pub nullable: bool,
}

/// One row of an exported (foreign) key.
///
/// Rows of the same key are consecutive; `key_seq` counts from 1 within a
/// key, so a row with `key_seq == 1` starts a new key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedKey {
    /// Table holding the foreign key.
    pub fk_table: String,
    /// Referenced column of the exporting table.
    pub pk_column: String,
    /// Referencing column of `fk_table`.
    pub fk_column: String,
    pub key_seq: u32,
}

/// Read access to a database catalog.
///
/// Implementations own their connection; every call is synchronous and any
/// failure is returned to the importer, which aborts.
pub trait CatalogIntrospector {
    /// Catalog names.
    fn list_catalogs(&self) -> IntrospectionResult<Vec<String>>;

    /// Schema names.
    fn list_schemas(&self) -> IntrospectionResult<Vec<String>>;

    /// Tables matching the given catalog, patterns (SQL `LIKE` syntax) and
    /// table types. An empty `types` slice does not filter on type.
    fn list_tables(
        &self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
        name_pattern: &str,
        types: &[String],
    ) -> IntrospectionResult<Vec<TableInfo>>;

    /// Columns of a table, in declaration order.
    fn list_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> IntrospectionResult<Vec<ColumnInfo>>;

    /// Primary-key column names of a table.
    fn list_primary_keys(&self, schema: Option<&str>, table: &str) -> IntrospectionResult<Vec<String>>;

    /// Foreign keys in other tables referencing this table.
    fn list_exported_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> IntrospectionResult<Vec<ExportedKey>>;
}
