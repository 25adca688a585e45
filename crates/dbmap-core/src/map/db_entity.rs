//! Database entity definitions (tables and derived views).

use std::collections::BTreeMap;

use super::db_attribute::DbAttribute;
use super::db_relationship::DbRelationship;
use crate::error::IntegrityError;

/// Physical location of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableIdentity {
    /// Catalog the table lives in.
    pub catalog: Option<String>,
    /// Schema the table lives in.
    pub schema: Option<String>,
}

/// What an entity stands for in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbEntityKind {
    /// A real table or view.
    Physical(TableIdentity),
    /// A grouped/aggregated view over a parent entity.
    Derived {
        /// Name of the parent entity.
        parent: String,
    },
}

/// A table (or derived view) with its columns and outgoing relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct DbEntity {
    name: String,
    kind: DbEntityKind,
    attributes: BTreeMap<String, DbAttribute>,
    relationships: BTreeMap<String, DbRelationship>,
}

impl DbEntity {
    /// Create a physical entity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DbEntityKind::Physical(TableIdentity::default()),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Create a derived entity over `parent`.
    pub fn derived(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DbEntityKind::Derived {
                parent: parent.into(),
            },
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Set the catalog on a physical entity. Ignored on a derived entity;
    /// [`set_catalog`](Self::set_catalog) reports that case instead.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        if let DbEntityKind::Physical(table) = &mut self.kind {
            table.catalog = Some(catalog.into());
        }
        self
    }

    /// Set the schema on a physical entity. Ignored on a derived entity.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        if let DbEntityKind::Physical(table) = &mut self.kind {
            table.schema = Some(schema.into());
        }
        self
    }

    /// Add a column.
    pub fn with_attribute(mut self, attribute: DbAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: DbRelationship) -> Self {
        self.add_relationship(relationship);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DbEntityKind {
        &self.kind
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, DbEntityKind::Derived { .. })
    }

    /// Parent entity name of a derived entity.
    pub fn parent_name(&self) -> Option<&str> {
        match &self.kind {
            DbEntityKind::Derived { parent } => Some(parent),
            DbEntityKind::Physical(_) => None,
        }
    }

    /// Table identity of a physical entity.
    ///
    /// Derived entities take theirs from the parent; see
    /// [`DataMap::physical_table`](super::DataMap::physical_table).
    pub fn table(&self) -> Option<&TableIdentity> {
        match &self.kind {
            DbEntityKind::Physical(table) => Some(table),
            DbEntityKind::Derived { .. } => None,
        }
    }

    pub fn catalog(&self) -> Option<&str> {
        self.table().and_then(|t| t.catalog.as_deref())
    }

    pub fn schema(&self) -> Option<&str> {
        self.table().and_then(|t| t.schema.as_deref())
    }

    /// Set the catalog of a physical entity.
    pub fn set_catalog(&mut self, catalog: Option<String>) -> Result<(), IntegrityError> {
        self.table_mut()?.catalog = catalog;
        Ok(())
    }

    /// Set the schema of a physical entity.
    pub fn set_schema(&mut self, schema: Option<String>) -> Result<(), IntegrityError> {
        self.table_mut()?.schema = schema;
        Ok(())
    }

    fn table_mut(&mut self) -> Result<&mut TableIdentity, IntegrityError> {
        match &mut self.kind {
            DbEntityKind::Physical(table) => Ok(table),
            DbEntityKind::Derived { .. } => Err(IntegrityError::DerivedTableIdentity {
                entity: self.name.clone(),
            }),
        }
    }

    /// Point a derived entity at another parent.
    pub fn set_parent(&mut self, parent: impl Into<String>) -> Result<(), IntegrityError> {
        match &mut self.kind {
            DbEntityKind::Derived { parent: current } => {
                *current = parent.into();
                Ok(())
            }
            DbEntityKind::Physical(_) => Err(IntegrityError::NotDerived {
                entity: self.name.clone(),
            }),
        }
    }

    // Attributes

    /// Add a column, replacing any column of the same name. The column's
    /// owner link is set to this entity.
    pub fn add_attribute(&mut self, mut attribute: DbAttribute) -> Option<DbAttribute> {
        attribute.set_entity(&self.name);
        self.attributes
            .insert(attribute.name().to_string(), attribute)
    }

    pub fn attribute(&self, name: &str) -> Option<&DbAttribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut DbAttribute> {
        self.attributes.get_mut(name)
    }

    /// Remove a column without touching relationships that join on it.
    pub fn remove_attribute(&mut self, name: &str) -> Option<DbAttribute> {
        self.attributes.remove(name)
    }

    /// Columns in name order.
    pub fn attributes(&self) -> impl Iterator<Item = &DbAttribute> {
        self.attributes.values()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn clear_attributes(&mut self) {
        self.attributes.clear();
    }

    /// Primary-key columns in name order.
    pub fn primary_key_attributes(&self) -> impl Iterator<Item = &DbAttribute> {
        self.attributes.values().filter(|a| a.is_primary_key())
    }

    /// GROUP BY columns of a derived entity. Always empty for a physical one.
    pub fn group_by_attributes(&self) -> Vec<&DbAttribute> {
        if !self.is_derived() {
            return Vec::new();
        }
        self.attributes.values().filter(|a| a.is_group_by()).collect()
    }

    /// Replace the columns of a derived entity with copies of the parent's.
    ///
    /// The copies are value-equal to the parent columns and owned by this
    /// entity; the GROUP BY list ends up empty.
    pub fn reset_to_parent_view(&mut self, parent: &DbEntity) -> Result<(), IntegrityError> {
        match &self.kind {
            DbEntityKind::Derived { parent: expected } if expected == parent.name() => {}
            DbEntityKind::Derived { parent: expected } => {
                return Err(IntegrityError::ParentMismatch {
                    entity: self.name.clone(),
                    expected: expected.clone(),
                    found: parent.name().to_string(),
                });
            }
            DbEntityKind::Physical(_) => {
                return Err(IntegrityError::NotDerived {
                    entity: self.name.clone(),
                });
            }
        }

        self.attributes.clear();
        for attribute in parent.attributes() {
            let mut copy = attribute.clone();
            copy.set_group_by(false);
            self.add_attribute(copy);
        }
        Ok(())
    }

    // Relationships

    /// Add a relationship, replacing any relationship of the same name. The
    /// relationship's source is set to this entity.
    pub fn add_relationship(&mut self, mut relationship: DbRelationship) -> Option<DbRelationship> {
        relationship.set_source(&self.name);
        self.relationships
            .insert(relationship.name().to_string(), relationship)
    }

    pub fn relationship(&self, name: &str) -> Option<&DbRelationship> {
        self.relationships.get(name)
    }

    pub fn relationship_mut(&mut self, name: &str) -> Option<&mut DbRelationship> {
        self.relationships.get_mut(name)
    }

    pub fn remove_relationship(&mut self, name: &str) -> Option<DbRelationship> {
        self.relationships.remove(name)
    }

    /// Relationships in name order.
    pub fn relationships(&self) -> impl Iterator<Item = &DbRelationship> {
        self.relationships.values()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn has_relationship(&self, name: &str) -> bool {
        self.relationships.contains_key(name)
    }
}
