//! Cascading removal and renaming.
//!
//! The plain `remove_*` methods on [`DataMap`] and the entities only drop
//! the named object. The `delete_*` methods here also repair everything
//! that referred to it. Each runs in two phases: dependents are collected
//! from an immutable view first, then the map is modified.

use std::collections::HashSet;

use tracing::debug;

use super::data_map::DataMap;
use super::db_relationship::DbRelationshipKey;
use crate::error::IntegrityError;

/// What a cascading delete touched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CascadeResult {
    /// Database relationships that were removed.
    pub removed_db_relationships: Vec<DbRelationshipKey>,
    /// Object relationships that were removed, as `(entity, relationship)`.
    pub removed_obj_relationships: Vec<(String, String)>,
    /// Object entities whose database mapping was cleared.
    pub unmapped_obj_entities: Vec<String>,
    /// Object relationships whose database path was cleared.
    pub cleared_obj_relationships: Vec<(String, String)>,
    /// Object attributes whose column mapping was cleared.
    pub cleared_obj_attributes: Vec<(String, String)>,
}

impl CascadeResult {
    /// Create an empty cascade result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of dependents touched.
    pub fn affected_count(&self) -> usize {
        self.removed_db_relationships.len()
            + self.removed_obj_relationships.len()
            + self.unmapped_obj_entities.len()
            + self.cleared_obj_relationships.len()
            + self.cleared_obj_attributes.len()
    }
}

impl DataMap {
    /// Delete a database entity and repair what referred to it.
    ///
    /// - relationships of other entities targeting it are removed;
    /// - object entities mapped to it lose their database mapping;
    /// - object relationships passing through any removed relationship
    ///   (including the entity's own) lose their path.
    ///
    /// Returns `None` if the map has no such entity.
    pub fn delete_db_entity(&mut self, name: &str) -> Option<CascadeResult> {
        let entity = self.db_entity(name)?;
        let mut result = CascadeResult::new();

        // Collect
        let mut dropped: Vec<DbRelationshipKey> = entity.relationships().map(|r| r.key()).collect();
        let inbound: Vec<DbRelationshipKey> = self
            .db_entities()
            .filter(|e| e.name() != name)
            .flat_map(|e| e.relationships())
            .filter(|r| r.target() == name)
            .map(|r| r.key())
            .collect();
        dropped.extend(inbound.iter().cloned());
        let dropped_set: HashSet<&DbRelationshipKey> = dropped.iter().collect();

        result.unmapped_obj_entities = self
            .obj_entities_for_db_entity(name)
            .map(|e| e.name().to_string())
            .collect();
        for obj_entity in self.obj_entities() {
            for attribute in obj_entity.attributes() {
                if obj_entity.db_entity() == Some(name) && attribute.db_attribute().is_some() {
                    result
                        .cleared_obj_attributes
                        .push((obj_entity.name().to_string(), attribute.name().to_string()));
                }
            }
        }
        result.cleared_obj_relationships = self
            .obj_relationships()
            .filter(|r| r.db_relationships().iter().any(|k| dropped_set.contains(k)))
            .map(|r| (r.source().to_string(), r.name().to_string()))
            .collect();

        // Remove
        self.remove_db_entity(name);
        for key in &inbound {
            if let Some(source) = self.db_entity_mut(&key.source) {
                source.remove_relationship(&key.name);
            }
        }
        self.apply_obj_repairs(&result);
        result.removed_db_relationships = dropped;

        debug!(
            entity = name,
            relationships = result.removed_db_relationships.len(),
            unmapped = result.unmapped_obj_entities.len(),
            cleared = result.cleared_obj_relationships.len(),
            "deleted db entity"
        );
        Some(result)
    }

    /// Delete an object entity and every object relationship elsewhere in
    /// the map whose source or target is that entity.
    ///
    /// Returns `None` if the map has no such entity.
    pub fn delete_obj_entity(&mut self, name: &str) -> Option<CascadeResult> {
        if !self.contains_obj_entity(name) {
            return None;
        }
        let mut result = CascadeResult::new();

        result.removed_obj_relationships = self
            .obj_entities()
            .filter(|e| e.name() != name)
            .flat_map(|e| e.relationships())
            .filter(|r| r.target() == name || r.source() == name)
            .map(|r| (r.source().to_string(), r.name().to_string()))
            .collect();

        self.remove_obj_entity(name);
        for (entity, relationship) in &result.removed_obj_relationships {
            if let Some(entity) = self.obj_entity_mut(entity) {
                entity.remove_relationship(relationship);
            }
        }

        debug!(
            entity = name,
            relationships = result.removed_obj_relationships.len(),
            "deleted obj entity"
        );
        Some(result)
    }

    /// Delete a database relationship and clear the path of every object
    /// relationship passing through it.
    ///
    /// Returns `None` if the source entity has no such relationship.
    pub fn delete_db_relationship(&mut self, source: &str, name: &str) -> Option<CascadeResult> {
        let key = self.db_entity(source)?.relationship(name)?.key();
        let mut result = CascadeResult::new();

        result.cleared_obj_relationships = self
            .obj_relationships()
            .filter(|r| r.uses_db_relationship(&key))
            .map(|r| (r.source().to_string(), r.name().to_string()))
            .collect();

        if let Some(entity) = self.db_entity_mut(source) {
            entity.remove_relationship(name);
        }
        self.apply_obj_repairs(&result);
        result.removed_db_relationships.push(key);
        Some(result)
    }

    /// Delete a column, every relationship joining on it (from either side)
    /// and the column mapping of object attributes pointing at it.
    ///
    /// Returns `None` if the entity has no such column.
    pub fn delete_db_attribute(&mut self, entity: &str, column: &str) -> Option<CascadeResult> {
        self.db_entity(entity)?.attribute(column)?;
        let mut result = CascadeResult::new();

        // Collect
        let affected: Vec<DbRelationshipKey> = self
            .db_relationships()
            .filter(|r| {
                (r.source() == entity && r.uses_source_column(column))
                    || (r.target() == entity && r.uses_target_column(column))
            })
            .map(|r| r.key())
            .collect();
        let affected_set: HashSet<&DbRelationshipKey> = affected.iter().collect();

        for obj_entity in self.obj_entities_for_db_entity(entity) {
            for attribute in obj_entity.attributes() {
                if attribute.db_attribute() == Some(column) {
                    result
                        .cleared_obj_attributes
                        .push((obj_entity.name().to_string(), attribute.name().to_string()));
                }
            }
        }
        result.cleared_obj_relationships = self
            .obj_relationships()
            .filter(|r| r.db_relationships().iter().any(|k| affected_set.contains(k)))
            .map(|r| (r.source().to_string(), r.name().to_string()))
            .collect();

        // Remove
        if let Some(owner) = self.db_entity_mut(entity) {
            owner.remove_attribute(column);
        }
        for key in &affected {
            if let Some(source) = self.db_entity_mut(&key.source) {
                source.remove_relationship(&key.name);
            }
        }
        self.apply_obj_repairs(&result);
        result.removed_db_relationships = affected;
        Some(result)
    }

    /// Rename a database relationship, updating every object relationship
    /// path that refers to it.
    pub fn rename_db_relationship(
        &mut self,
        source: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<DbRelationshipKey, IntegrityError> {
        let entity = self
            .db_entity(source)
            .ok_or_else(|| IntegrityError::UnknownDbEntity(source.to_string()))?;
        let old_key = entity
            .relationship(old_name)
            .map(|r| r.key())
            .ok_or_else(|| IntegrityError::UnknownDbRelationship(format!("{source}.{old_name}")))?;
        if old_name == new_name {
            return Ok(old_key);
        }
        if entity.has_relationship(new_name) {
            return Err(IntegrityError::DuplicateName {
                entity: source.to_string(),
                name: new_name.to_string(),
            });
        }

        let new_key = DbRelationshipKey::new(&old_key.source, &old_key.target, new_name);
        if let Some(entity) = self.db_entity_mut(source) {
            if let Some(mut relationship) = entity.remove_relationship(old_name) {
                relationship.name = new_name.to_string();
                entity.add_relationship(relationship);
            }
        }
        for obj_entity in self.obj_entities_mut() {
            for relationship in obj_entity.relationships_mut() {
                for key in relationship.db_relationships.iter_mut() {
                    if *key == old_key {
                        *key = new_key.clone();
                    }
                }
            }
        }
        Ok(new_key)
    }

    fn apply_obj_repairs(&mut self, result: &CascadeResult) {
        for name in &result.unmapped_obj_entities {
            if let Some(entity) = self.obj_entity_mut(name) {
                entity.clear_db_mapping();
            }
        }
        for (entity, attribute) in &result.cleared_obj_attributes {
            if let Some(attribute) = self
                .obj_entity_mut(entity)
                .and_then(|e| e.attribute_mut(attribute))
            {
                attribute.set_db_attribute(None);
            }
        }
        for (entity, relationship) in &result.cleared_obj_relationships {
            if let Some(relationship) = self
                .obj_entity_mut(entity)
                .and_then(|e| e.relationship_mut(relationship))
            {
                relationship.clear_db_relationships();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::types::{INTEGER, VARCHAR};
    use crate::map::{DbAttribute, DbEntity, DbRelationship, ObjAttribute, ObjEntity, ObjRelationship};

    fn gallery() -> DataMap {
        let artist = DbEntity::new("artist")
            .with_attribute(DbAttribute::new("id", INTEGER).with_primary_key())
            .with_attribute(DbAttribute::new("name", VARCHAR))
            .with_relationship(
                DbRelationship::new("paintingArray", "painting")
                    .with_join("id", "artist_id")
                    .with_to_many(true),
            );
        let painting = DbEntity::new("painting")
            .with_attribute(DbAttribute::new("id", INTEGER).with_primary_key())
            .with_attribute(DbAttribute::new("artist_id", INTEGER))
            .with_attribute(DbAttribute::new("title", VARCHAR))
            .with_relationship(DbRelationship::new("toArtist", "artist").with_join("artist_id", "id"));
        let exhibit = DbEntity::new("exhibit")
            .with_attribute(DbAttribute::new("id", INTEGER).with_primary_key())
            .with_attribute(DbAttribute::new("artist_id", INTEGER))
            .with_relationship(DbRelationship::new("toArtist", "artist").with_join("artist_id", "id"));

        let to_paintings = DbRelationshipKey::new("artist", "painting", "paintingArray");
        let to_artist = DbRelationshipKey::new("painting", "artist", "toArtist");

        DataMap::new("gallery")
            .with_db_entity(artist)
            .with_db_entity(painting)
            .with_db_entity(exhibit)
            .with_obj_entity(
                ObjEntity::new("Artist")
                    .with_db_entity("artist")
                    .with_attribute(ObjAttribute::new("name", "String").with_db_attribute("name"))
                    .with_relationship(
                        ObjRelationship::new("paintings", "Painting")
                            .with_to_many(true)
                            .with_db_relationship(to_paintings),
                    ),
            )
            .with_obj_entity(
                ObjEntity::new("Painting")
                    .with_db_entity("painting")
                    .with_attribute(ObjAttribute::new("title", "String").with_db_attribute("title"))
                    .with_relationship(
                        ObjRelationship::new("artist", "Artist").with_db_relationship(to_artist),
                    ),
            )
    }

    #[test]
    fn test_dirty_remove_leaves_references() {
        let mut map = gallery();
        map.remove_db_entity("artist");

        assert!(map.db_entity("painting").unwrap().has_relationship("toArtist"));
        assert_eq!(map.obj_entity("Artist").unwrap().db_entity(), Some("artist"));
    }

    #[test]
    fn test_delete_db_entity_cascades() {
        let mut map = gallery();
        let result = map.delete_db_entity("artist").unwrap();

        assert!(map.db_entity("artist").is_none());
        assert!(!map.db_entity("painting").unwrap().has_relationship("toArtist"));
        assert!(!map.db_entity("exhibit").unwrap().has_relationship("toArtist"));

        let artist = map.obj_entity("Artist").unwrap();
        assert!(artist.db_entity().is_none());
        assert!(artist.attribute("name").unwrap().db_attribute().is_none());
        assert!(!artist.relationship("paintings").unwrap().is_mapped());
        assert!(!map
            .obj_entity("Painting")
            .unwrap()
            .relationship("artist")
            .unwrap()
            .is_mapped());

        assert_eq!(result.removed_db_relationships.len(), 3);
        assert_eq!(result.unmapped_obj_entities, vec!["Artist".to_string()]);
        assert_eq!(result.cleared_obj_relationships.len(), 2);
    }

    #[test]
    fn test_delete_missing_entity() {
        let mut map = gallery();
        assert!(map.delete_db_entity("nothing").is_none());
        assert!(map.delete_obj_entity("Nothing").is_none());
    }

    #[test]
    fn test_delete_obj_entity_cascades() {
        let mut map = gallery();
        let result = map.delete_obj_entity("Artist").unwrap();

        assert!(map.obj_entity("Artist").is_none());
        assert!(map.obj_entity("Painting").unwrap().relationship("artist").is_none());
        assert_eq!(
            result.removed_obj_relationships,
            vec![("Painting".to_string(), "artist".to_string())]
        );
        // Database side is untouched.
        assert!(map.db_entity("artist").is_some());
    }

    #[test]
    fn test_delete_db_relationship() {
        let mut map = gallery();
        let result = map.delete_db_relationship("painting", "toArtist").unwrap();

        assert_eq!(result.cleared_obj_relationships.len(), 1);
        assert!(!map
            .obj_entity("Painting")
            .unwrap()
            .relationship("artist")
            .unwrap()
            .is_mapped());
        assert!(map.obj_entity("Artist").unwrap().relationship("paintings").unwrap().is_mapped());
    }

    #[test]
    fn test_delete_db_attribute() {
        let mut map = gallery();
        let result = map.delete_db_attribute("painting", "artist_id").unwrap();

        assert!(map.db_entity("painting").unwrap().attribute("artist_id").is_none());
        assert!(!map.db_entity("painting").unwrap().has_relationship("toArtist"));
        assert!(!map.db_entity("artist").unwrap().has_relationship("paintingArray"));
        assert_eq!(result.removed_db_relationships.len(), 2);
        assert_eq!(result.cleared_obj_relationships.len(), 2);

        let result = map.delete_db_attribute("painting", "title").unwrap();
        assert_eq!(
            result.cleared_obj_attributes,
            vec![("Painting".to_string(), "title".to_string())]
        );
    }

    #[test]
    fn test_rename_db_relationship() {
        let mut map = gallery();
        let key = map
            .rename_db_relationship("painting", "toArtist", "author")
            .unwrap();

        assert_eq!(key, DbRelationshipKey::new("painting", "artist", "author"));
        assert!(map.db_entity("painting").unwrap().has_relationship("author"));
        let rel = map.obj_entity("Painting").unwrap().relationship("artist").unwrap();
        assert_eq!(rel.db_relationships(), &[key]);

        assert!(matches!(
            map.rename_db_relationship("artist", "paintingArray", "paintingArray"),
            Ok(_)
        ));
        assert!(matches!(
            map.rename_db_relationship("painting", "missing", "x"),
            Err(IntegrityError::UnknownDbRelationship(_))
        ));
    }
}
