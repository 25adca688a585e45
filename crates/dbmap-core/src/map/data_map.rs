//! The container of database and object entities.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::db_entity::{DbEntity, DbEntityKind, TableIdentity};
use super::db_relationship::{DbRelationship, DbRelationshipKey};
use super::entity::Entity;
use super::obj_entity::{ObjEntity, ObjRelationship};
use crate::error::IntegrityError;

/// A named set of database and object entities.
///
/// Entities are keyed by name and iterated in name order. Maps listed as
/// dependencies are searched (read-only) after this map's own entities.
#[derive(Debug, Clone, Default)]
pub struct DataMap {
    name: String,
    db_entities: BTreeMap<String, DbEntity>,
    obj_entities: BTreeMap<String, ObjEntity>,
    dependencies: Vec<Arc<DataMap>>,
}

impl DataMap {
    /// Create an empty map.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a database entity.
    pub fn with_db_entity(mut self, entity: DbEntity) -> Self {
        self.add_db_entity(entity);
        self
    }

    /// Add an object entity.
    pub fn with_obj_entity(mut self, entity: ObjEntity) -> Self {
        self.add_obj_entity(entity);
        self
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, map: Arc<DataMap>) -> Self {
        self.dependencies.push(map);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // Dependencies

    pub fn add_dependency(&mut self, map: Arc<DataMap>) {
        self.dependencies.push(map);
    }

    pub fn dependencies(&self) -> &[Arc<DataMap>] {
        &self.dependencies
    }

    /// Remove a dependency by map name.
    pub fn remove_dependency(&mut self, name: &str) -> Option<Arc<DataMap>> {
        let pos = self.dependencies.iter().position(|m| m.name() == name)?;
        Some(self.dependencies.remove(pos))
    }

    // Database entities

    /// Add a database entity.
    ///
    /// If an entity of the same name already exists this is a no-op and the
    /// existing entity is kept. Returns whether the entity was inserted.
    pub fn add_db_entity(&mut self, entity: DbEntity) -> bool {
        if self.db_entities.contains_key(entity.name()) {
            debug!(map = %self.name, entity = entity.name(), "db entity already present, add ignored");
            return false;
        }
        self.db_entities.insert(entity.name().to_string(), entity);
        true
    }

    /// Get an entity of this map (dependencies are not searched).
    pub fn db_entity(&self, name: &str) -> Option<&DbEntity> {
        self.db_entities.get(name)
    }

    pub fn db_entity_mut(&mut self, name: &str) -> Option<&mut DbEntity> {
        self.db_entities.get_mut(name)
    }

    /// Remove an entity without touching anything that refers to it.
    ///
    /// See [`delete_db_entity`](Self::delete_db_entity) for the cascading form.
    pub fn remove_db_entity(&mut self, name: &str) -> Option<DbEntity> {
        self.db_entities.remove(name)
    }

    /// Database entities of this map in name order.
    pub fn db_entities(&self) -> impl Iterator<Item = &DbEntity> {
        self.db_entities.values()
    }

    pub(crate) fn db_entities_mut(&mut self) -> impl Iterator<Item = &mut DbEntity> {
        self.db_entities.values_mut()
    }

    pub fn db_entity_names(&self) -> Vec<&str> {
        self.db_entities.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains_db_entity(&self, name: &str) -> bool {
        self.db_entities.contains_key(name)
    }

    /// Find a database entity here or, failing that, in a dependency.
    pub fn resolve_db_entity(&self, name: &str) -> Option<&DbEntity> {
        self.db_entities.get(name).or_else(|| {
            self.dependencies
                .iter()
                .find_map(|dep| dep.resolve_db_entity(name))
        })
    }

    /// Find a database relationship by key, searching dependencies too.
    pub fn resolve_db_relationship(&self, key: &DbRelationshipKey) -> Option<&DbRelationship> {
        self.resolve_db_entity(&key.source)
            .and_then(|e| e.relationship(&key.name))
            .filter(|r| r.target() == key.target)
    }

    /// Table identity of an entity, following derived entities to their
    /// physical ancestor.
    pub fn physical_table(&self, name: &str) -> Result<&TableIdentity, IntegrityError> {
        let mut visited = HashSet::new();
        let mut current = self
            .resolve_db_entity(name)
            .ok_or_else(|| IntegrityError::UnknownDbEntity(name.to_string()))?;

        loop {
            match current.kind() {
                DbEntityKind::Physical(table) => return Ok(table),
                DbEntityKind::Derived { parent } => {
                    if !visited.insert(current.name()) {
                        return Err(IntegrityError::CyclicParent {
                            entity: name.to_string(),
                        });
                    }
                    current = self.resolve_db_entity(parent).ok_or_else(|| {
                        IntegrityError::UnknownParent {
                            entity: current.name().to_string(),
                            parent: parent.clone(),
                        }
                    })?;
                }
            }
        }
    }

    /// Replace the columns of a derived entity with copies of its parent's.
    pub fn reset_derived_entity(&mut self, name: &str) -> Result<(), IntegrityError> {
        let entity = self
            .db_entities
            .get(name)
            .ok_or_else(|| IntegrityError::UnknownDbEntity(name.to_string()))?;
        let parent_name = entity.parent_name().ok_or_else(|| IntegrityError::NotDerived {
            entity: name.to_string(),
        })?;
        let parent = self
            .resolve_db_entity(parent_name)
            .cloned()
            .ok_or_else(|| IntegrityError::UnknownParent {
                entity: name.to_string(),
                parent: parent_name.to_string(),
            })?;

        match self.db_entities.get_mut(name) {
            Some(entity) => entity.reset_to_parent_view(&parent),
            None => Err(IntegrityError::UnknownDbEntity(name.to_string())),
        }
    }

    // Object entities

    /// Add an object entity.
    ///
    /// If an entity of the same name already exists this is a no-op and the
    /// existing entity is kept. Returns whether the entity was inserted.
    pub fn add_obj_entity(&mut self, entity: ObjEntity) -> bool {
        if self.obj_entities.contains_key(entity.name()) {
            debug!(map = %self.name, entity = entity.name(), "obj entity already present, add ignored");
            return false;
        }
        self.obj_entities.insert(entity.name().to_string(), entity);
        true
    }

    /// Get an entity of this map (dependencies are not searched).
    pub fn obj_entity(&self, name: &str) -> Option<&ObjEntity> {
        self.obj_entities.get(name)
    }

    pub fn obj_entity_mut(&mut self, name: &str) -> Option<&mut ObjEntity> {
        self.obj_entities.get_mut(name)
    }

    /// Remove an entity without touching anything that refers to it.
    ///
    /// See [`delete_obj_entity`](Self::delete_obj_entity) for the cascading form.
    pub fn remove_obj_entity(&mut self, name: &str) -> Option<ObjEntity> {
        self.obj_entities.remove(name)
    }

    /// Object entities of this map in name order.
    pub fn obj_entities(&self) -> impl Iterator<Item = &ObjEntity> {
        self.obj_entities.values()
    }

    pub(crate) fn obj_entities_mut(&mut self) -> impl Iterator<Item = &mut ObjEntity> {
        self.obj_entities.values_mut()
    }

    pub fn obj_entity_names(&self) -> Vec<&str> {
        self.obj_entities.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains_obj_entity(&self, name: &str) -> bool {
        self.obj_entities.contains_key(name)
    }

    /// Find an object entity here or, failing that, in a dependency.
    pub fn resolve_obj_entity(&self, name: &str) -> Option<&ObjEntity> {
        self.obj_entities.get(name).or_else(|| {
            self.dependencies
                .iter()
                .find_map(|dep| dep.resolve_obj_entity(name))
        })
    }

    /// Object entities of this map mapped to the given database entity.
    pub fn obj_entities_for_db_entity<'a>(
        &'a self,
        db_entity: &'a str,
    ) -> impl Iterator<Item = &'a ObjEntity> + 'a {
        self.obj_entities
            .values()
            .filter(move |e| e.db_entity() == Some(db_entity))
    }

    /// All object relationships of this map, in entity then name order.
    pub fn obj_relationships(&self) -> impl Iterator<Item = &ObjRelationship> {
        self.obj_entities.values().flat_map(|e| e.relationships())
    }

    /// All database relationships of this map, in entity then name order.
    pub fn db_relationships(&self) -> impl Iterator<Item = &DbRelationship> {
        self.db_entities.values().flat_map(|e| e.relationships())
    }

    /// Every entity of this map, database entities first.
    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        self.db_entities
            .values()
            .map(Entity::Db)
            .chain(self.obj_entities.values().map(Entity::Obj))
    }

    /// Check whether the map has no entities of its own.
    pub fn is_empty(&self) -> bool {
        self.db_entities.is_empty() && self.obj_entities.is_empty()
    }
}
