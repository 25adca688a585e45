//! Read-only consistency checks over a [`DataMap`].

use crate::map::{
    types, DataMap, DbAttribute, DbEntity, DbEntityKind, DbRelationship, ObjAttribute, ObjEntity,
    ObjRelationship,
};

use super::diagnostic::Diagnostic;

const DB_ENTITY: &str = "db-entity";
const DB_ATTRIBUTE: &str = "db-attribute";
const DB_RELATIONSHIP: &str = "db-relationship";
const OBJ_ENTITY: &str = "obj-entity";
const OBJ_ATTRIBUTE: &str = "obj-attribute";
const OBJ_RELATIONSHIP: &str = "obj-relationship";

fn path(entity: &str, member: &str) -> String {
    format!("{entity}.{member}")
}

/// Collects every finding over a map.
///
/// All checks run regardless of earlier findings; the map is never
/// modified.
pub struct Validator<'a> {
    map: &'a DataMap,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    pub fn new(map: &'a DataMap) -> Self {
        Self {
            map,
            diagnostics: Vec::new(),
        }
    }

    /// Run all checks.
    pub fn validate(mut self) -> Vec<Diagnostic> {
        let map = self.map;
        for entity in map.db_entities() {
            self.check_db_entity(entity);
        }
        for entity in map.obj_entities() {
            self.check_obj_entity(entity);
        }
        self.diagnostics
    }

    fn check_db_entity(&mut self, entity: &DbEntity) {
        let name = entity.name();
        if name.is_empty() {
            self.diagnostics
                .push(Diagnostic::error(DB_ENTITY, name, "db entity has no name"));
        }

        let parent = match entity.kind() {
            DbEntityKind::Physical(_) => {
                if entity.primary_key_attributes().next().is_none() {
                    self.diagnostics
                        .push(Diagnostic::warning(DB_ENTITY, name, "no primary key attributes"));
                }
                None
            }
            DbEntityKind::Derived { parent } => {
                let resolved = self.map.resolve_db_entity(parent);
                if resolved.is_none() {
                    self.diagnostics.push(Diagnostic::error(
                        DB_ENTITY,
                        name,
                        format!("parent entity '{parent}' not found"),
                    ));
                }
                resolved
            }
        };

        for attribute in entity.attributes() {
            self.check_db_attribute(entity, attribute, parent);
        }
        for relationship in entity.relationships() {
            self.check_db_relationship(entity, relationship);
        }
    }

    fn check_db_attribute(&mut self, entity: &DbEntity, attribute: &DbAttribute, parent: Option<&DbEntity>) {
        let location = path(entity.name(), attribute.name());
        if attribute.name().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(DB_ATTRIBUTE, &location, "attribute has no name"));
        }

        let code = attribute.sql_type();
        if code == types::NOT_DEFINED {
            self.diagnostics
                .push(Diagnostic::error(DB_ATTRIBUTE, &location, "attribute has no type"));
        } else if !types::is_known(code) {
            self.diagnostics.push(Diagnostic::error(
                DB_ATTRIBUTE,
                &location,
                format!("unknown type code {code}"),
            ));
        } else if types::is_character(code) && attribute.max_length().is_none() {
            self.diagnostics.push(Diagnostic::warning(
                DB_ATTRIBUTE,
                &location,
                "character attribute has no maximum length",
            ));
        }

        if let (Some(spec), Some(parent)) = (attribute.derived(), parent) {
            for param in &spec.params {
                if parent.attribute(param).is_none() {
                    self.diagnostics.push(Diagnostic::error(
                        DB_ATTRIBUTE,
                        &location,
                        format!("parameter '{param}' is not an attribute of '{}'", parent.name()),
                    ));
                }
            }
        }
    }

    fn check_db_relationship(&mut self, entity: &DbEntity, relationship: &DbRelationship) {
        let location = path(entity.name(), relationship.name());
        if relationship.name().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(DB_RELATIONSHIP, &location, "relationship has no name"));
        }

        if relationship.target().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(DB_RELATIONSHIP, &location, "relationship has no target"));
            return;
        }
        let Some(target) = self.map.resolve_db_entity(relationship.target()) else {
            self.diagnostics.push(Diagnostic::error(
                DB_RELATIONSHIP,
                &location,
                format!("target entity '{}' not found", relationship.target()),
            ));
            return;
        };

        if relationship.joins().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(DB_RELATIONSHIP, &location, "relationship has no joins"));
            return;
        }
        for join in relationship.joins() {
            if entity.attribute(&join.source).is_none() {
                self.diagnostics.push(Diagnostic::error(
                    DB_RELATIONSHIP,
                    &location,
                    format!("join column '{}' not found in '{}'", join.source, entity.name()),
                ));
            }
            if target.attribute(&join.target).is_none() {
                self.diagnostics.push(Diagnostic::error(
                    DB_RELATIONSHIP,
                    &location,
                    format!("join column '{}' not found in '{}'", join.target, target.name()),
                ));
            }
        }

        let Some(reverse) = relationship.reverse_relationship(self.map) else {
            self.diagnostics
                .push(Diagnostic::warning(DB_RELATIONSHIP, &location, "no reverse relationship"));
            return;
        };

        // A mutual pair inside this map is reported from its smaller side only.
        let mutual = self.map.db_entity(reverse.source()).is_some()
            && reverse
                .reverse_relationship(self.map)
                .is_some_and(|back| back.key() == relationship.key());
        if mutual && relationship.key() > reverse.key() {
            return;
        }
        let pair = format!("{} and {}", relationship.key(), reverse.key());
        if relationship.is_to_dependent_pk() && reverse.is_to_dependent_pk() {
            self.diagnostics.push(Diagnostic::error(
                DB_RELATIONSHIP,
                &location,
                format!("both {pair} are to a dependent primary key"),
            ));
        } else if !relationship.is_to_many()
            && !reverse.is_to_many()
            && !relationship.is_to_dependent_pk()
            && !reverse.is_to_dependent_pk()
        {
            self.diagnostics.push(Diagnostic::warning(
                DB_RELATIONSHIP,
                &location,
                format!("one-to-one {pair} needs one side to a dependent primary key"),
            ));
        }
    }

    fn check_obj_entity(&mut self, entity: &ObjEntity) {
        let name = entity.name();
        if name.is_empty() {
            self.diagnostics
                .push(Diagnostic::error(OBJ_ENTITY, name, "obj entity has no name"));
        }
        if entity.class_name().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(OBJ_ENTITY, name, "no class name"));
        }

        let db_entity = match entity.db_entity() {
            None => {
                self.diagnostics
                    .push(Diagnostic::warning(OBJ_ENTITY, name, "not mapped to a db entity"));
                None
            }
            Some(db_name) => {
                let resolved = self.map.resolve_db_entity(db_name);
                if resolved.is_none() {
                    self.diagnostics.push(Diagnostic::error(
                        OBJ_ENTITY,
                        name,
                        format!("db entity '{db_name}' not found"),
                    ));
                }
                resolved
            }
        };

        for attribute in entity.attributes() {
            self.check_obj_attribute(entity, attribute, db_entity);
        }
        for relationship in entity.relationships() {
            self.check_obj_relationship(entity, relationship);
        }
    }

    fn check_obj_attribute(&mut self, entity: &ObjEntity, attribute: &ObjAttribute, db_entity: Option<&DbEntity>) {
        let location = path(entity.name(), attribute.name());
        if attribute.name().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(OBJ_ATTRIBUTE, &location, "attribute has no name"));
        }
        if attribute.type_name().is_empty() {
            self.diagnostics
                .push(Diagnostic::warning(OBJ_ATTRIBUTE, &location, "attribute has no type"));
        }

        match (attribute.db_attribute(), db_entity) {
            (None, _) => self.diagnostics.push(Diagnostic::warning(
                OBJ_ATTRIBUTE,
                &location,
                "not mapped to a db attribute",
            )),
            (Some(column), Some(db_entity)) if db_entity.attribute(column).is_none() => {
                self.diagnostics.push(Diagnostic::error(
                    OBJ_ATTRIBUTE,
                    &location,
                    format!("db attribute '{column}' not found in '{}'", db_entity.name()),
                ))
            }
            _ => {}
        }
    }

    fn check_obj_relationship(&mut self, entity: &ObjEntity, relationship: &ObjRelationship) {
        let location = path(entity.name(), relationship.name());
        if relationship.name().is_empty() {
            self.diagnostics
                .push(Diagnostic::error(OBJ_RELATIONSHIP, &location, "relationship has no name"));
        }

        let target = self.map.resolve_obj_entity(relationship.target());
        if target.is_none() {
            self.diagnostics.push(Diagnostic::error(
                OBJ_RELATIONSHIP,
                &location,
                format!("target entity '{}' not found", relationship.target()),
            ));
        }

        if !relationship.is_mapped() {
            self.diagnostics.push(Diagnostic::warning(
                OBJ_RELATIONSHIP,
                &location,
                "not mapped to db relationships",
            ));
            return;
        }

        let mut resolved = Vec::with_capacity(relationship.db_relationships().len());
        for key in relationship.db_relationships() {
            match self.map.resolve_db_relationship(key) {
                Some(hop) => resolved.push(hop),
                None => self.diagnostics.push(Diagnostic::error(
                    OBJ_RELATIONSHIP,
                    &location,
                    format!("db relationship {key} not found"),
                )),
            }
        }
        if resolved.len() != relationship.db_relationships().len() {
            return;
        }

        let connected = resolved.windows(2).all(|w| w[0].target() == w[1].source());
        let starts = entity
            .db_entity()
            .map_or(true, |db| resolved.first().is_some_and(|hop| hop.source() == db));
        let ends = target
            .and_then(ObjEntity::db_entity)
            .map_or(true, |db| resolved.last().is_some_and(|hop| hop.target() == db));
        if !(connected && starts && ends) {
            self.diagnostics.push(Diagnostic::error(
                OBJ_RELATIONSHIP,
                &location,
                "db relationship path does not connect source and target",
            ));
        }
    }
}

/// Validate a map.
pub fn validate(map: &DataMap) -> Vec<Diagnostic> {
    Validator::new(map).validate()
}
