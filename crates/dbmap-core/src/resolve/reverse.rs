//! Reverse relationship inference.

use std::collections::HashSet;

use crate::error::IntegrityError;
use crate::map::{DataMap, DbJoin, DbRelationship, DbRelationshipKey, ObjRelationship};
use crate::naming;

impl DbRelationship {
    /// Find the relationship going the other way.
    ///
    /// The reverse is the first relationship of the target entity that
    /// points back at the source and whose joins, as a set, are exactly this
    /// relationship's joins flipped. A relationship without joins has no
    /// reverse.
    pub fn reverse_relationship<'m>(&self, map: &'m DataMap) -> Option<&'m DbRelationship> {
        if self.joins().is_empty() {
            return None;
        }
        let target = map.resolve_db_entity(self.target())?;
        let flipped: HashSet<DbJoin> = self.joins().iter().map(DbJoin::flipped).collect();

        target.relationships().find(|candidate| {
            candidate.target() == self.source()
                && candidate.joins().len() == self.joins().len()
                && candidate.joins().iter().cloned().collect::<HashSet<DbJoin>>() == flipped
        })
    }

    /// Check whether every join lands on a primary-key column of the target.
    pub fn is_to_pk(&self, map: &DataMap) -> bool {
        let Some(target) = map.resolve_db_entity(self.target()) else {
            return false;
        };
        !self.joins().is_empty()
            && self.joins().iter().all(|j| {
                target
                    .attribute(&j.target)
                    .is_some_and(|a| a.is_primary_key())
            })
    }

    /// Check whether this is the master side of a dependent-PK pair: a
    /// to-one relationship onto the target's key whose reverse is flagged
    /// as pointing to a dependent primary key.
    pub fn is_to_master_pk(&self, map: &DataMap) -> bool {
        if self.is_to_many() || self.is_to_dependent_pk() || !self.is_to_pk(map) {
            return false;
        }
        self.reverse_relationship(map)
            .is_some_and(|r| r.is_to_dependent_pk())
    }
}

impl ObjRelationship {
    /// Find the object relationship going the other way.
    ///
    /// Every database relationship of the path is replaced by its reverse
    /// and the path order is inverted; the target entity is then searched
    /// for a relationship with exactly that path. Any hop without a reverse
    /// means there is no reverse.
    pub fn reverse_relationship<'m>(&self, map: &'m DataMap) -> Option<&'m ObjRelationship> {
        if !self.is_mapped() {
            return None;
        }

        let mut reversed = Vec::with_capacity(self.db_relationships().len());
        for key in self.db_relationships().iter().rev() {
            let hop = map.resolve_db_relationship(key)?;
            reversed.push(hop.reverse_relationship(map)?.key());
        }

        let target = map.resolve_obj_entity(self.target())?;
        target
            .relationships()
            .find(|candidate| candidate.target() == self.source() && candidate.db_relationships() == reversed)
    }

    /// Check whether the target is a dependent entity.
    ///
    /// Only the first hop of the path is consulted.
    pub fn is_to_dependent_entity(&self, map: &DataMap) -> bool {
        self.db_relationships()
            .first()
            .and_then(|key| map.resolve_db_relationship(key))
            .is_some_and(|r| r.is_to_dependent_pk())
    }
}

impl DataMap {
    /// Create (or find) the reverse of a database relationship.
    ///
    /// An existing reverse is returned as is. Otherwise a relationship with
    /// flipped joins is added to the target entity, named after the source
    /// entity and made unique there. It is to-one when its joins land on
    /// the source's primary key, to-many otherwise.
    pub fn create_reverse_db_relationship(
        &mut self,
        source: &str,
        name: &str,
    ) -> Result<DbRelationshipKey, IntegrityError> {
        let relationship = self
            .db_entity(source)
            .ok_or_else(|| IntegrityError::UnknownDbEntity(source.to_string()))?
            .relationship(name)
            .ok_or_else(|| IntegrityError::UnknownDbRelationship(format!("{source}.{name}")))?;

        if let Some(existing) = relationship.reverse_relationship(self) {
            return Ok(existing.key());
        }

        let target_name = relationship.target().to_string();
        let target = self
            .db_entity(&target_name)
            .ok_or_else(|| IntegrityError::UnknownDbEntity(target_name.clone()))?;

        let mut reverse = DbRelationship::new(String::new(), source);
        for join in relationship.joins() {
            reverse.add_join(join.flipped());
        }
        let to_one = reverse.is_to_pk(self);
        let base = if to_one {
            naming::to_one_name(source)
        } else {
            naming::to_many_name(source)
        };
        reverse.name = naming::unique_name(&base, |n| target.has_relationship(n));
        reverse.set_to_many(!to_one);

        let key = DbRelationshipKey::new(&target_name, source, reverse.name());
        if let Some(target) = self.db_entity_mut(&target_name) {
            target.add_relationship(reverse);
        }
        Ok(key)
    }
}
