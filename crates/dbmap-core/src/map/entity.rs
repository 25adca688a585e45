//! Uniform view over both kinds of entity.

use super::{DbEntity, ObjEntity};

/// Either side of the mapping, for code that treats entities generically.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    /// A database entity.
    Db(&'a DbEntity),
    /// An object entity.
    Obj(&'a ObjEntity),
}

impl<'a> Entity<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Entity::Db(e) => e.name(),
            Entity::Obj(e) => e.name(),
        }
    }

    /// Short label of the entity kind, as used in diagnostics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Entity::Db(_) => "db-entity",
            Entity::Obj(_) => "obj-entity",
        }
    }

    pub fn attribute_names(&self) -> Vec<&'a str> {
        match self {
            Entity::Db(e) => e.attributes().map(|a| a.name()).collect(),
            Entity::Obj(e) => e.attributes().map(|a| a.name()).collect(),
        }
    }

    pub fn relationship_names(&self) -> Vec<&'a str> {
        match self {
            Entity::Db(e) => e.relationships().map(|r| r.name()).collect(),
            Entity::Obj(e) => e.relationships().map(|r| r.name()).collect(),
        }
    }

    pub fn attribute_count(&self) -> usize {
        match self {
            Entity::Db(e) => e.attribute_count(),
            Entity::Obj(e) => e.attribute_count(),
        }
    }

    pub fn relationship_count(&self) -> usize {
        match self {
            Entity::Db(e) => e.relationship_count(),
            Entity::Obj(e) => e.relationship_count(),
        }
    }

    /// Target entity names of all relationships.
    pub fn relationship_targets(&self) -> Vec<&'a str> {
        match self {
            Entity::Db(e) => e.relationships().map(|r| r.target()).collect(),
            Entity::Obj(e) => e.relationships().map(|r| r.target()).collect(),
        }
    }
}

impl<'a> From<&'a DbEntity> for Entity<'a> {
    fn from(entity: &'a DbEntity) -> Self {
        Entity::Db(entity)
    }
}

impl<'a> From<&'a ObjEntity> for Entity<'a> {
    fn from(entity: &'a ObjEntity) -> Self {
        Entity::Obj(entity)
    }
}
