//! dbmap Core - schema model, relationship resolution, reverse engineering
//! and validation.
//!
//! A [`DataMap`] describes database tables ([`DbEntity`]) and the object
//! classes projected from them ([`ObjEntity`]). Maps are built by the
//! [`Importer`] from a live catalog, by a persistence codec, or directly
//! through the API.

pub mod codegen;
pub mod config;
pub mod error;
pub mod import;
pub mod map;
pub mod naming;
pub mod resolve;
pub mod validate;

pub use codegen::{ClassGenerator, ClassRole, ClassTarget, ClassWriterFactory, GenerationReport};
pub use config::{GenerationMode, GeneratorConfig, ImportConfig};
pub use error::{Error, IntegrityError, IntrospectionError};
pub use import::{CatalogIntrospector, ColumnInfo, ExportedKey, Importer, TableInfo};
pub use map::{
    types, CascadeResult, DataMap, DbAttribute, DbEntity, DbEntityKind, DbJoin, DbRelationship,
    DbRelationshipKey, DerivedSpec, Entity, ObjAttribute, ObjEntity, ObjRelationship,
    TableIdentity,
};
pub use resolve::Snapshot;
pub use validate::{validate, Diagnostic, Severity, Validator};
