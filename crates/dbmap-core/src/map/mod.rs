//! Schema model: the entity-relationship metadata of a mapping.
//!
//! A [`DataMap`] owns database entities (tables and derived views) and
//! object entities (their class projections). Cross references between
//! them are held as names and resolved through the map, never as pointers.

mod cascade;
mod data_map;
mod db_attribute;
mod db_entity;
mod db_relationship;
mod entity;
mod obj_entity;
pub mod types;

pub use cascade::CascadeResult;
pub use data_map::DataMap;
pub use db_attribute::{DbAttribute, DerivedSpec};
pub use db_entity::{DbEntity, DbEntityKind, TableIdentity};
pub use db_relationship::{DbJoin, DbRelationship, DbRelationshipKey};
pub use entity::Entity;
pub use obj_entity::{ObjAttribute, ObjEntity, ObjRelationship};
