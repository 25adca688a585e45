//! Object-side entities, attributes and relationships.

use std::collections::BTreeMap;

use super::db_relationship::DbRelationshipKey;

/// A property of an [`ObjEntity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjAttribute {
    name: String,
    entity: String,
    type_name: String,
    db_attribute: Option<String>,
}

impl ObjAttribute {
    /// Create an unmapped attribute.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: String::new(),
            type_name: type_name.into(),
            db_attribute: None,
        }
    }

    /// Map to a column of the owning entity's `DbEntity`.
    pub fn with_db_attribute(mut self, column: impl Into<String>) -> Self {
        self.db_attribute = Some(column.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning entity. Empty until added to one.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    /// Column this attribute is mapped to.
    pub fn db_attribute(&self) -> Option<&str> {
        self.db_attribute.as_deref()
    }

    pub fn set_db_attribute(&mut self, column: Option<String>) {
        self.db_attribute = column;
    }
}

/// A relationship between two [`ObjEntity`]s, backed by a path of
/// database relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjRelationship {
    pub(crate) name: String,
    pub(crate) source: String,
    pub(crate) target: String,
    pub(crate) to_many: bool,
    pub(crate) db_relationships: Vec<DbRelationshipKey>,
}

impl ObjRelationship {
    /// Create an unmapped to-one relationship.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: String::new(),
            target: target.into(),
            to_many: false,
            db_relationships: Vec::new(),
        }
    }

    /// Set the to-many flag.
    pub fn with_to_many(mut self, to_many: bool) -> Self {
        self.to_many = to_many;
        self
    }

    /// Append a database relationship to the path.
    pub fn with_db_relationship(mut self, key: DbRelationshipKey) -> Self {
        self.db_relationships.push(key);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source entity name. Empty until added to an entity.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    pub fn is_to_many(&self) -> bool {
        self.to_many
    }

    pub fn set_to_many(&mut self, to_many: bool) {
        self.to_many = to_many;
    }

    /// The database relationship path, first hop first.
    pub fn db_relationships(&self) -> &[DbRelationshipKey] {
        &self.db_relationships
    }

    pub fn add_db_relationship(&mut self, key: DbRelationshipKey) {
        self.db_relationships.push(key);
    }

    pub fn clear_db_relationships(&mut self) {
        self.db_relationships.clear();
    }

    /// Check whether the path passes through `key`.
    pub fn uses_db_relationship(&self, key: &DbRelationshipKey) -> bool {
        self.db_relationships.contains(key)
    }

    /// Check whether the relationship has a database path.
    pub fn is_mapped(&self) -> bool {
        !self.db_relationships.is_empty()
    }
}

/// An object-side projection of a [`DbEntity`](super::DbEntity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjEntity {
    name: String,
    class_name: String,
    super_class_name: Option<String>,
    db_entity: Option<String>,
    attributes: BTreeMap<String, ObjAttribute>,
    relationships: BTreeMap<String, ObjRelationship>,
}

impl ObjEntity {
    /// Create an unmapped entity with no class name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: String::new(),
            super_class_name: None,
            db_entity: None,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Set the class name.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Set the superclass name.
    pub fn with_super_class_name(mut self, name: impl Into<String>) -> Self {
        self.super_class_name = Some(name.into());
        self
    }

    /// Map to a database entity.
    pub fn with_db_entity(mut self, db_entity: impl Into<String>) -> Self {
        self.db_entity = Some(db_entity.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: ObjAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: ObjRelationship) -> Self {
        self.add_relationship(relationship);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class name, possibly package-qualified. May be empty.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        self.class_name = class_name.into();
    }

    pub fn super_class_name(&self) -> Option<&str> {
        self.super_class_name.as_deref()
    }

    pub fn set_super_class_name(&mut self, name: Option<String>) {
        self.super_class_name = name;
    }

    /// Name of the mapped database entity.
    pub fn db_entity(&self) -> Option<&str> {
        self.db_entity.as_deref()
    }

    pub fn set_db_entity(&mut self, db_entity: Option<String>) {
        self.db_entity = db_entity;
    }

    /// Drop the database mapping of the entity and of all its attributes.
    pub fn clear_db_mapping(&mut self) {
        self.db_entity = None;
        for attribute in self.attributes.values_mut() {
            attribute.set_db_attribute(None);
        }
    }

    // Attributes

    /// Add an attribute, replacing any attribute of the same name.
    pub fn add_attribute(&mut self, mut attribute: ObjAttribute) -> Option<ObjAttribute> {
        if attribute.entity != self.name {
            attribute.entity = self.name.clone();
        }
        self.attributes.insert(attribute.name.clone(), attribute)
    }

    pub fn attribute(&self, name: &str) -> Option<&ObjAttribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut ObjAttribute> {
        self.attributes.get_mut(name)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<ObjAttribute> {
        self.attributes.remove(name)
    }

    /// Attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = &ObjAttribute> {
        self.attributes.values()
    }

    pub(crate) fn attributes_mut(&mut self) -> impl Iterator<Item = &mut ObjAttribute> {
        self.attributes.values_mut()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Find the attribute mapped to a column.
    pub fn attribute_for_column(&self, column: &str) -> Option<&ObjAttribute> {
        self.attributes
            .values()
            .find(|a| a.db_attribute() == Some(column))
    }

    // Relationships

    /// Add a relationship, replacing any relationship of the same name. The
    /// relationship's source is set to this entity.
    pub fn add_relationship(&mut self, mut relationship: ObjRelationship) -> Option<ObjRelationship> {
        if relationship.source != self.name {
            relationship.source = self.name.clone();
        }
        self.relationships
            .insert(relationship.name.clone(), relationship)
    }

    pub fn relationship(&self, name: &str) -> Option<&ObjRelationship> {
        self.relationships.get(name)
    }

    pub fn relationship_mut(&mut self, name: &str) -> Option<&mut ObjRelationship> {
        self.relationships.get_mut(name)
    }

    pub fn remove_relationship(&mut self, name: &str) -> Option<ObjRelationship> {
        self.relationships.remove(name)
    }

    /// Relationships in name order.
    pub fn relationships(&self) -> impl Iterator<Item = &ObjRelationship> {
        self.relationships.values()
    }

    pub(crate) fn relationships_mut(&mut self) -> impl Iterator<Item = &mut ObjRelationship> {
        self.relationships.values_mut()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_builder() {
        let entity = ObjEntity::new("Artist")
            .with_class_name("org.example.Artist")
            .with_db_entity("artist")
            .with_attribute(ObjAttribute::new("name", "String").with_db_attribute("name"))
            .with_relationship(
                ObjRelationship::new("paintings", "Painting")
                    .with_to_many(true)
                    .with_db_relationship(DbRelationshipKey::new(
                        "artist",
                        "painting",
                        "paintingArray",
                    )),
            );

        assert_eq!(entity.attribute("name").unwrap().entity(), "Artist");
        let rel = entity.relationship("paintings").unwrap();
        assert_eq!(rel.source(), "Artist");
        assert!(rel.is_mapped());
        assert_eq!(entity.attribute_for_column("name").unwrap().name(), "name");
    }

    #[test]
    fn test_clear_db_mapping() {
        let mut entity = ObjEntity::new("Artist")
            .with_db_entity("artist")
            .with_attribute(ObjAttribute::new("name", "String").with_db_attribute("name"));

        entity.clear_db_mapping();

        assert!(entity.db_entity().is_none());
        assert!(entity.attribute("name").unwrap().db_attribute().is_none());
    }
}
