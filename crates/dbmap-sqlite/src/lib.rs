//! SQLite catalog introspection for the dbmap importer.
//!
//! SQLite has no catalogs. Attached databases are reported as schemas;
//! tables of `main` are reported without a schema, and a missing schema
//! argument means `main`.
//!
//! # Example
//!
//! ```
//! use dbmap_core::Importer;
//! use dbmap_sqlite::SqliteIntrospector;
//!
//! let catalog = SqliteIntrospector::open_in_memory().unwrap();
//! catalog
//!     .connection()
//!     .execute_batch("CREATE TABLE artist (id INTEGER PRIMARY KEY, name VARCHAR(200) NOT NULL);")
//!     .unwrap();
//!
//! let map = Importer::new(&catalog).import().unwrap();
//! assert!(map.db_entity("artist").is_some());
//! ```

mod declared_type;

use std::path::Path;

use dbmap_core::import::IntrospectionResult;
use dbmap_core::{CatalogIntrospector, ColumnInfo, ExportedKey, TableInfo};
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, warn};

pub use declared_type::{parse_declared_type, DeclaredType};

/// The database every connection starts with.
pub const MAIN_SCHEMA: &str = "main";

/// A [`CatalogIntrospector`] over a SQLite connection.
pub struct SqliteIntrospector {
    conn: Connection,
}

impl SqliteIntrospector {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open a database file read-only.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::new(conn))
    }

    /// Open an empty in-memory database.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }

    fn databases(&self, pattern: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_database_list WHERE name LIKE ?1 ORDER BY seq")?;
        let names = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// `(name, type)` of the tables and views of one database.
    fn objects(&self, schema: &str, pattern: &str) -> rusqlite::Result<Vec<(String, String)>> {
        let sql = format!(
            "SELECT name, type FROM {}.sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name LIKE ?1 \
             ORDER BY name",
            quote(schema)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let objects = stmt
            .query_map(params![pattern], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(objects)
    }

    fn primary_key_columns(&self, schema: &str, table: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1, ?2) WHERE pk > 0 ORDER BY pk")?;
        let columns = stmt
            .query_map(params![table, schema], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(columns)
    }
}

impl CatalogIntrospector for SqliteIntrospector {
    fn list_catalogs(&self) -> IntrospectionResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_schemas(&self) -> IntrospectionResult<Vec<String>> {
        Ok(self.databases("%")?)
    }

    fn list_tables(
        &self,
        _catalog: Option<&str>,
        schema_pattern: Option<&str>,
        name_pattern: &str,
        types: &[String],
    ) -> IntrospectionResult<Vec<TableInfo>> {
        let schemas = match schema_pattern {
            Some(pattern) => self.databases(pattern)?,
            None => vec![MAIN_SCHEMA.to_string()],
        };

        let mut tables = Vec::new();
        for schema in schemas {
            for (name, kind) in self.objects(&schema, name_pattern)? {
                let table_type = kind.to_ascii_uppercase();
                if !types.is_empty() && !types.iter().any(|t| t.eq_ignore_ascii_case(&table_type)) {
                    continue;
                }
                tables.push(TableInfo {
                    name,
                    table_type,
                    schema: (schema != MAIN_SCHEMA).then(|| schema.clone()),
                    catalog: None,
                });
            }
        }

        debug!(tables = tables.len(), pattern = %name_pattern, "listed sqlite tables");
        Ok(tables)
    }

    fn list_columns(
        &self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> IntrospectionResult<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1, ?2) ORDER BY cid")?;
        let rows = stmt
            .query_map(params![table, schema.unwrap_or(MAIN_SCHEMA)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?, row.get::<_, bool>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|(name, declared, not_null)| {
                let parsed = parse_declared_type(declared.as_deref().unwrap_or_default());
                ColumnInfo {
                    name,
                    sql_type: parsed.sql_type,
                    size: parsed.size,
                    decimal_digits: parsed.decimal_digits,
                    nullable: !not_null,
                }
            })
            .collect())
    }

    fn list_primary_keys(&self, schema: Option<&str>, table: &str) -> IntrospectionResult<Vec<String>> {
        Ok(self.primary_key_columns(schema.unwrap_or(MAIN_SCHEMA), table)?)
    }

    /// SQLite only records foreign keys on the referencing side, so every
    /// table of the schema is scanned for keys pointing at `table`.
    fn list_exported_keys(
        &self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> IntrospectionResult<Vec<ExportedKey>> {
        let schema = schema.unwrap_or(MAIN_SCHEMA);
        let mut stmt = self.conn.prepare(
            "SELECT seq, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1, ?2) ORDER BY id, seq",
        )?;

        let mut keys = Vec::new();
        let mut primary_key: Option<Vec<String>> = None;
        for (fk_table, kind) in self.objects(schema, "%")? {
            if kind != "table" {
                continue;
            }
            let rows = stmt
                .query_map(params![fk_table, schema], |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for (seq, referenced, fk_column, pk_column) in rows {
                if !referenced.eq_ignore_ascii_case(table) {
                    continue;
                }
                // A key without target columns refers to the primary key.
                let pk_column = match pk_column {
                    Some(column) => column,
                    None => {
                        if primary_key.is_none() {
                            primary_key = Some(self.primary_key_columns(schema, table)?);
                        }
                        match primary_key.as_ref().and_then(|pk| pk.get(seq as usize)) {
                            Some(column) => column.clone(),
                            None => {
                                warn!(
                                    table = %fk_table,
                                    referenced = %table,
                                    column = %fk_column,
                                    "foreign key has no matching primary key column"
                                );
                                continue;
                            }
                        }
                    }
                };
                keys.push(ExportedKey {
                    fk_table: fk_table.clone(),
                    pk_column,
                    fk_column,
                    key_seq: seq + 1,
                });
            }
        }

        debug!(table = %table, keys = keys.len(), "listed exported keys");
        Ok(keys)
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
