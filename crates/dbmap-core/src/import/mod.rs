//! Reverse engineering from a live database catalog.
//!
//! The [`Importer`] reads tables, columns, primary keys and foreign keys
//! through a [`CatalogIntrospector`] and builds a complete
//! [`DataMap`](crate::DataMap): database entities and relationship pairs
//! first, then the object layer projected from them.

mod importer;
mod introspect;

pub use importer::Importer;
pub use introspect::{CatalogIntrospector, ColumnInfo, ExportedKey, IntrospectionResult, TableInfo};
