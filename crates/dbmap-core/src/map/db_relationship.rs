//! Relationships between database entities.

use std::collections::HashSet;
use std::fmt;

/// One column-to-column correspondence of a [`DbRelationship`].
///
/// `source` names a column of the relationship's source entity, `target` a
/// column of its target entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbJoin {
    /// Source column name.
    pub source: String,
    /// Target column name.
    pub target: String,
}

impl DbJoin {
    /// Create a join.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The same join seen from the other side.
    pub fn flipped(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

/// Identity of a [`DbRelationship`]: `(source entity, target entity, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbRelationshipKey {
    /// Source entity name.
    pub source: String,
    /// Target entity name.
    pub target: String,
    /// Relationship name (unique within the source entity).
    pub name: String,
}

impl DbRelationshipKey {
    /// Create a key.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DbRelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", self.source, self.name, self.target)
    }
}

/// A directed relationship between two [`DbEntity`](super::DbEntity)s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbRelationship {
    pub(crate) name: String,
    pub(crate) source: String,
    pub(crate) target: String,
    pub(crate) joins: Vec<DbJoin>,
    pub(crate) to_many: bool,
    pub(crate) to_dependent_pk: bool,
}

impl DbRelationship {
    /// Create a to-one relationship with no joins.
    ///
    /// The source entity is set when the relationship is added to an entity.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: String::new(),
            target: target.into(),
            joins: Vec::new(),
            to_many: false,
            to_dependent_pk: false,
        }
    }

    /// Add a join.
    pub fn with_join(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.joins.push(DbJoin::new(source, target));
        self
    }

    /// Set the to-many flag.
    pub fn with_to_many(mut self, to_many: bool) -> Self {
        self.to_many = to_many;
        self
    }

    /// Set the to-dependent-PK flag.
    pub fn with_to_dependent_pk(mut self, to_dependent_pk: bool) -> Self {
        self.to_dependent_pk = to_dependent_pk;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source entity name. Empty until added to an entity.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn set_source(&mut self, source: &str) {
        if self.source != source {
            self.source = source.to_string();
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    pub fn joins(&self) -> &[DbJoin] {
        &self.joins
    }

    pub fn add_join(&mut self, join: DbJoin) {
        self.joins.push(join);
    }

    /// Remove a join, returning whether it was present.
    pub fn remove_join(&mut self, join: &DbJoin) -> bool {
        let before = self.joins.len();
        self.joins.retain(|j| j != join);
        self.joins.len() != before
    }

    pub fn clear_joins(&mut self) {
        self.joins.clear();
    }

    /// The joins as a set; order carries no meaning.
    pub fn join_set(&self) -> HashSet<&DbJoin> {
        self.joins.iter().collect()
    }

    pub fn is_to_many(&self) -> bool {
        self.to_many
    }

    pub fn set_to_many(&mut self, to_many: bool) {
        self.to_many = to_many;
    }

    pub fn is_to_dependent_pk(&self) -> bool {
        self.to_dependent_pk
    }

    pub fn set_to_dependent_pk(&mut self, to_dependent_pk: bool) {
        self.to_dependent_pk = to_dependent_pk;
    }

    /// The identity of this relationship.
    pub fn key(&self) -> DbRelationshipKey {
        DbRelationshipKey::new(&self.source, &self.target, &self.name)
    }

    /// Check whether this relationship is identified by `key`.
    pub fn matches(&self, key: &DbRelationshipKey) -> bool {
        self.name == key.name && self.source == key.source && self.target == key.target
    }

    /// Check whether any join uses the given source column.
    pub fn uses_source_column(&self, column: &str) -> bool {
        self.joins.iter().any(|j| j.source == column)
    }

    /// Check whether any join uses the given target column.
    pub fn uses_target_column(&self, column: &str) -> bool {
        self.joins.iter().any(|j| j.target == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_flip() {
        let join = DbJoin::new("id", "artist_id");
        let flipped = join.flipped();
        assert_eq!(flipped, DbJoin::new("artist_id", "id"));
        assert_eq!(flipped.flipped(), join);
    }

    #[test]
    fn test_join_set_ignores_order() {
        let a = DbRelationship::new("r", "t")
            .with_join("a", "x")
            .with_join("b", "y");
        let b = DbRelationship::new("r", "t")
            .with_join("b", "y")
            .with_join("a", "x");
        assert_ne!(a.joins(), b.joins());
        assert_eq!(a.join_set(), b.join_set());
    }

    #[test]
    fn test_remove_join() {
        let mut rel = DbRelationship::new("r", "t").with_join("a", "x");
        assert!(rel.remove_join(&DbJoin::new("a", "x")));
        assert!(!rel.remove_join(&DbJoin::new("a", "x")));
        assert!(rel.joins().is_empty());
    }

    #[test]
    fn test_key_display() {
        let key = DbRelationshipKey::new("artist", "painting", "paintingArray");
        assert_eq!(key.to_string(), "artist.paintingArray -> painting");
    }
}
