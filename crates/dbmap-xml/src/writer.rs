//! Writer of map documents.

use std::collections::HashSet;
use std::io::Write;

use dbmap_core::{DataMap, DbAttribute, DbEntity, DbRelationship, DbRelationshipKey, ObjEntity, ObjRelationship};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::format::*;

/// Everything that will be written, in order.
struct Plan<'m> {
    db_entities: Vec<&'m DbEntity>,
    db_relationships: Vec<&'m DbRelationship>,
    obj_relationships: Vec<&'m ObjRelationship>,
}

pub(crate) struct MapWriter<'m> {
    map: &'m DataMap,
    config: &'m CodecConfig,
}

impl<'m> MapWriter<'m> {
    pub(crate) fn new(map: &'m DataMap, config: &'m CodecConfig) -> Self {
        Self { map, config }
    }

    /// Order the entities and reject, before anything is written, every
    /// reference a load of the document would reject.
    fn plan(&self) -> Result<Plan<'m>, CodecError> {
        let map = self.map;

        // Physical entities first, then derived ones after their parents.
        let mut db_entities: Vec<&DbEntity> = map.db_entities().filter(|e| !e.is_derived()).collect();
        let mut written: HashSet<&str> = db_entities.iter().map(|e| e.name()).collect();
        let mut pending: Vec<&DbEntity> = map.db_entities().filter(|e| e.is_derived()).collect();
        while !pending.is_empty() {
            let (ready, waiting): (Vec<&DbEntity>, Vec<&DbEntity>) = pending.into_iter().partition(|e| {
                e.parent_name()
                    .is_some_and(|parent| written.contains(parent) || !map.contains_db_entity(parent))
            });
            if ready.is_empty() {
                return Err(CodecError::CyclicParent {
                    entity: waiting.first().map(|e| e.name().to_string()).unwrap_or_default(),
                });
            }
            for entity in ready {
                written.insert(entity.name());
                db_entities.push(entity);
            }
            pending = waiting;
        }

        for entity in &db_entities {
            check_db_entity(map, entity)?;
        }

        let db_relationships: Vec<&DbRelationship> = map.db_relationships().collect();
        for relationship in &db_relationships {
            if map.resolve_db_entity(relationship.target()).is_none() {
                return Err(CodecError::UnknownEntity {
                    referrer: format!("db relationship {}", relationship.key()),
                    entity: relationship.target().to_string(),
                });
            }
        }
        let keys: HashSet<DbRelationshipKey> = db_relationships.iter().map(|r| r.key()).collect();

        let obj_relationships: Vec<&ObjRelationship> = map.obj_relationships().collect();
        for relationship in &obj_relationships {
            if map.resolve_obj_entity(relationship.target()).is_none() {
                return Err(CodecError::UnknownEntity {
                    referrer: format!("obj relationship '{}.{}'", relationship.source(), relationship.name()),
                    entity: relationship.target().to_string(),
                });
            }
            for key in relationship.db_relationships() {
                let external = map
                    .dependencies()
                    .iter()
                    .any(|dependency| dependency.resolve_db_relationship(key).is_some());
                if !keys.contains(key) && !external {
                    return Err(CodecError::DanglingReference {
                        entity: relationship.source().to_string(),
                        relationship: relationship.name().to_string(),
                        reference: key.clone(),
                    });
                }
            }
        }

        Ok(Plan {
            db_entities,
            db_relationships,
            obj_relationships,
        })
    }

    pub(crate) fn write<W: Write>(&self, sink: W) -> Result<W, CodecError> {
        let plan = self.plan()?;

        let mut writer = if self.config.indent > 0 {
            Writer::new_with_indent(sink, b' ', self.config.indent)
        } else {
            Writer::new(sink)
        };
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new(DATA_MAP);
        if self.config.include_map_name {
            root.push_attribute((NAME, self.map.name()));
        }
        root.push_attribute((PROJECT_VERSION_ATTR, PROJECT_VERSION));
        writer.write_event(Event::Start(root))?;

        for entity in &plan.db_entities {
            write_db_entity(&mut writer, entity)?;
        }
        for entity in self.map.obj_entities() {
            write_obj_entity(&mut writer, entity)?;
        }
        for relationship in &plan.db_relationships {
            write_db_relationship(&mut writer, relationship)?;
        }
        for relationship in &plan.obj_relationships {
            write_obj_relationship(&mut writer, relationship)?;
        }

        writer.write_event(Event::End(BytesEnd::new(DATA_MAP)))?;

        debug!(
            map = %self.map.name(),
            db_entities = plan.db_entities.len(),
            db_relationships = plan.db_relationships.len(),
            obj_relationships = plan.obj_relationships.len(),
            "map saved"
        );
        Ok(writer.into_inner())
    }
}

/// Write an element whose children are all empty elements.
fn write_element<W: Write>(
    writer: &mut Writer<W>,
    start: BytesStart<'_>,
    children: Vec<BytesStart<'_>>,
) -> Result<(), CodecError> {
    if children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    for child in children {
        writer.write_event(Event::Empty(child))?;
    }
    writer.write_event(Event::End(end))?;
    Ok(())
}

/// Reject what a load of the written document would reject for one entity.
fn check_db_entity(map: &DataMap, entity: &DbEntity) -> Result<(), CodecError> {
    let Some(parent_name) = entity.parent_name() else {
        return match entity.attributes().find(|a| a.is_group_by() || a.derived().is_some()) {
            Some(attribute) => Err(CodecError::DerivedOnlyAttribute {
                entity: entity.name().to_string(),
                attribute: attribute.name().to_string(),
            }),
            None => Ok(()),
        };
    };

    let parent = map
        .resolve_db_entity(parent_name)
        .ok_or_else(|| CodecError::UnknownEntity {
            referrer: format!("derived entity '{}'", entity.name()),
            entity: parent_name.to_string(),
        })?;
    for attribute in entity.attributes() {
        let params = attribute.derived().map(|spec| spec.params.as_slice()).unwrap_or_default();
        if let Some(column) = params.iter().find(|column| parent.attribute(column.as_str()).is_none()) {
            return Err(CodecError::UnknownParameter {
                entity: entity.name().to_string(),
                attribute: attribute.name().to_string(),
                column: column.to_string(),
                parent: parent_name.to_string(),
            });
        }
    }
    Ok(())
}

fn db_attribute_start(attribute: &DbAttribute) -> BytesStart<'static> {
    let mut start = BytesStart::new(DB_ATTRIBUTE);
    start.push_attribute((NAME, attribute.name()));
    if let Some(type_name) = attribute.type_name() {
        start.push_attribute((TYPE, type_name));
    }
    if let Some(length) = attribute.max_length() {
        start.push_attribute((LENGTH, length.to_string().as_str()));
    }
    if let Some(precision) = attribute.precision() {
        start.push_attribute((PRECISION, precision.to_string().as_str()));
    }
    if attribute.is_primary_key() {
        start.push_attribute((IS_PRIMARY_KEY, bool_str(true)));
    }
    if attribute.is_mandatory() {
        start.push_attribute((IS_MANDATORY, bool_str(true)));
    }
    if attribute.is_group_by() {
        start.push_attribute((IS_GROUP_BY, bool_str(true)));
    }
    if let Some(spec) = attribute.derived() {
        start.push_attribute((SPEC, spec.expression.as_str()));
    }
    start
}

fn write_db_entity<W: Write>(writer: &mut Writer<W>, entity: &DbEntity) -> Result<(), CodecError> {
    let mut start = BytesStart::new(DB_ENTITY);
    start.push_attribute((NAME, entity.name()));
    if let Some(schema) = entity.schema() {
        start.push_attribute((SCHEMA, schema));
    }
    if let Some(catalog) = entity.catalog() {
        start.push_attribute((CATALOG, catalog));
    }
    if let Some(parent) = entity.parent_name() {
        start.push_attribute((PARENT_NAME, parent));
    }

    if entity.attribute_count() == 0 {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for attribute in entity.attributes() {
        let refs: Vec<BytesStart> = attribute
            .derived()
            .map(|spec| {
                spec.params
                    .iter()
                    .map(|param| {
                        let mut param_ref = BytesStart::new(DB_ATTRIBUTE_REF);
                        param_ref.push_attribute((NAME, param.as_str()));
                        param_ref
                    })
                    .collect()
            })
            .unwrap_or_default();
        write_element(writer, db_attribute_start(attribute), refs)?;
    }
    writer.write_event(Event::End(BytesEnd::new(DB_ENTITY)))?;
    Ok(())
}

fn write_obj_entity<W: Write>(writer: &mut Writer<W>, entity: &ObjEntity) -> Result<(), CodecError> {
    let mut start = BytesStart::new(OBJ_ENTITY);
    start.push_attribute((NAME, entity.name()));
    if !entity.class_name().is_empty() {
        start.push_attribute((CLASS_NAME, entity.class_name()));
    }
    if let Some(super_class) = entity.super_class_name() {
        start.push_attribute((SUPER_CLASS_NAME, super_class));
    }
    if let Some(db_entity) = entity.db_entity() {
        start.push_attribute((DB_ENTITY_NAME, db_entity));
    }

    let attributes = entity
        .attributes()
        .map(|attribute| {
            let mut element = BytesStart::new(OBJ_ATTRIBUTE);
            element.push_attribute((NAME, attribute.name()));
            if !attribute.type_name().is_empty() {
                element.push_attribute((TYPE, attribute.type_name()));
            }
            if let Some(column) = attribute.db_attribute() {
                element.push_attribute((DB_ATTRIBUTE_NAME, column));
            }
            element
        })
        .collect();
    write_element(writer, start, attributes)
}

fn write_db_relationship<W: Write>(
    writer: &mut Writer<W>,
    relationship: &DbRelationship,
) -> Result<(), CodecError> {
    let mut start = BytesStart::new(DB_RELATIONSHIP);
    start.push_attribute((NAME, relationship.name()));
    start.push_attribute((SOURCE, relationship.source()));
    start.push_attribute((TARGET, relationship.target()));
    start.push_attribute((TO_MANY, bool_str(relationship.is_to_many())));
    start.push_attribute((TO_DEPENDENT_PK, bool_str(relationship.is_to_dependent_pk())));

    let joins = relationship
        .joins()
        .iter()
        .map(|join| {
            let mut pair = BytesStart::new(DB_ATTRIBUTE_PAIR);
            pair.push_attribute((SOURCE, join.source.as_str()));
            pair.push_attribute((TARGET, join.target.as_str()));
            pair
        })
        .collect();
    write_element(writer, start, joins)
}

fn write_obj_relationship<W: Write>(
    writer: &mut Writer<W>,
    relationship: &ObjRelationship,
) -> Result<(), CodecError> {
    let mut start = BytesStart::new(OBJ_RELATIONSHIP);
    start.push_attribute((NAME, relationship.name()));
    start.push_attribute((SOURCE, relationship.source()));
    start.push_attribute((TARGET, relationship.target()));
    start.push_attribute((TO_MANY, bool_str(relationship.is_to_many())));

    let refs = relationship
        .db_relationships()
        .iter()
        .map(|key| {
            let mut reference = BytesStart::new(DB_RELATIONSHIP_REF);
            reference.push_attribute((SOURCE, key.source.as_str()));
            reference.push_attribute((TARGET, key.target.as_str()));
            reference.push_attribute((NAME, key.name.as_str()));
            reference
        })
        .collect();
    write_element(writer, start, refs)
}
