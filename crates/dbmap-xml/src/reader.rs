//! Streaming reader of map documents.
//!
//! The document is processed one event at a time. Database relationships
//! are recorded as they complete, and a `db-relationship-ref` must resolve
//! against those (or against a dependency map) when it is read. Anything
//! that does not resolve aborts the load.

use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;
use std::sync::Arc;

use dbmap_core::types::{self, NOT_DEFINED};
use dbmap_core::{
    DataMap, DbAttribute, DbEntity, DbJoin, DbRelationship, DbRelationshipKey, DerivedSpec,
    ObjAttribute, ObjEntity, ObjRelationship,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::config::CodecConfig;
use crate::error::{CodecError, FormatError};
use crate::format::*;

/// The element currently open.
enum Context {
    Document,
    DataMap,
    DbEntity { name: String },
    DbAttribute { entity: String, name: String },
    ObjEntity { name: String },
    DbRelationship { key: DbRelationshipKey },
    ObjRelationship { source: String, name: String },
    /// An element that has no children of its own.
    Leaf(&'static str),
}

impl Context {
    fn element(&self) -> &'static str {
        match self {
            Context::Document => "document",
            Context::DataMap => DATA_MAP,
            Context::DbEntity { .. } => DB_ENTITY,
            Context::DbAttribute { .. } => DB_ATTRIBUTE,
            Context::ObjEntity { .. } => OBJ_ENTITY,
            Context::DbRelationship { .. } => DB_RELATIONSHIP,
            Context::ObjRelationship { .. } => OBJ_RELATIONSHIP,
            Context::Leaf(element) => element,
        }
    }
}

/// Attributes of one element.
struct Attrs {
    element: &'static str,
    values: BTreeMap<String, String>,
    position: usize,
}

impl Attrs {
    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::new(message, self.position)
    }

    /// A non-empty attribute value.
    fn optional(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<&str, FormatError> {
        self.optional(name).ok_or_else(|| {
            self.error(format!("<{}> is missing attribute '{}'", self.element, name))
        })
    }

    /// A boolean attribute; absent means false.
    fn flag(&self, name: &str) -> Result<bool, FormatError> {
        match self.optional(name) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(self.error(format!(
                "attribute '{}' of <{}> must be 'true' or 'false', found '{}'",
                name, self.element, other
            ))),
        }
    }

    fn number(&self, name: &str) -> Result<Option<u32>, FormatError> {
        self.optional(name)
            .map(|v| {
                v.parse::<u32>().map_err(|_| {
                    self.error(format!(
                        "attribute '{}' of <{}> must be a non-negative integer, found '{}'",
                        name, self.element, v
                    ))
                })
            })
            .transpose()
    }
}

pub(crate) struct MapReader<R> {
    reader: Reader<R>,
    map: DataMap,
    stack: Vec<Context>,
    /// Relationships declared so far.
    known: HashSet<DbRelationshipKey>,
    /// Byte offset of the event being processed.
    position: usize,
    finished: bool,
}

impl<R: BufRead> MapReader<R> {
    pub(crate) fn new(source: R, config: &CodecConfig) -> Self {
        let mut map = DataMap::default();
        for dependency in &config.dependencies {
            map.add_dependency(Arc::clone(dependency));
        }
        Self {
            reader: Reader::from_reader(source),
            map,
            stack: vec![Context::Document],
            known: HashSet::new(),
            position: 0,
            finished: false,
        }
    }

    pub(crate) fn read(mut self) -> Result<DataMap, CodecError> {
        let mut buf = Vec::new();
        loop {
            self.position = self.reader.buffer_position() as usize;
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let (element, attrs) = self.element(&e)?;
                    self.start(element, attrs)?;
                }
                Event::Empty(e) => {
                    let (element, attrs) = self.element(&e)?;
                    self.start(element, attrs)?;
                    self.end()?;
                }
                Event::End(_) => self.end()?,
                Event::Text(text) => {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(self.error("unexpected text content").into());
                    }
                }
                Event::CData(_) => return Err(self.error("unexpected CDATA section").into()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !self.finished {
            return Err(self.error("unexpected end of document").into());
        }
        debug!(
            map = %self.map.name(),
            db_entities = self.map.db_entities().count(),
            obj_entities = self.map.obj_entities().count(),
            "map loaded"
        );
        Ok(self.map)
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::new(message, self.position)
    }

    fn element(&self, e: &BytesStart<'_>) -> Result<(&'static str, Attrs), FormatError> {
        let raw = e.name();
        let element = ELEMENTS
            .iter()
            .copied()
            .find(|name| name.as_bytes() == raw.as_ref())
            .ok_or_else(|| {
                self.error(format!(
                    "unknown element <{}>",
                    String::from_utf8_lossy(raw.as_ref())
                ))
            })?;

        let mut values = BTreeMap::new();
        for attr in e.attributes() {
            let attr = attr
                .map_err(|err| self.error(format!("malformed attribute in <{element}>: {err}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|err| {
                self.error(format!("invalid value of '{key}' in <{element}>: {err}"))
            })?;
            values.insert(key, value.into_owned());
        }

        Ok((
            element,
            Attrs {
                element,
                values,
                position: self.position,
            },
        ))
    }

    fn start(&mut self, element: &'static str, attrs: Attrs) -> Result<(), FormatError> {
        let parent = self.stack.pop().unwrap_or(Context::Document);
        let child = self.open(&parent, element, &attrs);
        self.stack.push(parent);
        self.stack.push(child?);
        Ok(())
    }

    fn end(&mut self) -> Result<(), FormatError> {
        match self.stack.pop() {
            Some(Context::DbRelationship { key }) => {
                self.known.insert(key);
            }
            Some(Context::DataMap) => self.finished = true,
            Some(Context::Document) | None => return Err(self.error("unexpected end tag")),
            Some(_) => {}
        }
        Ok(())
    }

    fn open(&mut self, parent: &Context, element: &'static str, attrs: &Attrs) -> Result<Context, FormatError> {
        match (parent, element) {
            (Context::Document, DATA_MAP) if !self.finished => self.open_data_map(attrs),
            (Context::Document, _) if self.finished => {
                Err(self.error("content after the root element"))
            }
            (Context::Document, other) => Err(self.error(format!(
                "expected root element <{DATA_MAP}>, found <{other}>"
            ))),
            (Context::DataMap, DB_ENTITY) => self.open_db_entity(attrs),
            (Context::DbEntity { name }, DB_ATTRIBUTE) => self.open_db_attribute(name, attrs),
            (Context::DbAttribute { entity, name }, DB_ATTRIBUTE_REF) => {
                self.open_db_attribute_ref(entity, name, attrs)
            }
            (Context::DataMap, OBJ_ENTITY) => self.open_obj_entity(attrs),
            (Context::ObjEntity { name }, OBJ_ATTRIBUTE) => self.open_obj_attribute(name, attrs),
            (Context::DataMap, DB_RELATIONSHIP) => self.open_db_relationship(attrs),
            (Context::DbRelationship { key }, DB_ATTRIBUTE_PAIR) => {
                self.open_db_attribute_pair(key, attrs)
            }
            (Context::DataMap, OBJ_RELATIONSHIP) => self.open_obj_relationship(attrs),
            (Context::ObjRelationship { source, name }, DB_RELATIONSHIP_REF) => {
                self.open_db_relationship_ref(source, name, attrs)
            }
            (parent, element) => Err(self.error(format!(
                "unexpected <{}> inside <{}>",
                element,
                parent.element()
            ))),
        }
    }

    fn open_data_map(&mut self, attrs: &Attrs) -> Result<Context, FormatError> {
        if let Some(version) = attrs.optional(PROJECT_VERSION_ATTR) {
            if version != PROJECT_VERSION {
                return Err(attrs
                    .error(format!("unsupported project version '{version}'"))
                    .with_hint(format!("this reader understands version {PROJECT_VERSION}")));
            }
        }
        self.map.set_name(attrs.optional(NAME).unwrap_or_default());
        Ok(Context::DataMap)
    }

    fn open_db_entity(&mut self, attrs: &Attrs) -> Result<Context, FormatError> {
        let name = attrs.required(NAME)?;
        if self.map.contains_db_entity(name) {
            return Err(attrs.error(format!("duplicate db entity '{name}'")));
        }

        let entity = match attrs.optional(PARENT_NAME) {
            Some(parent) => {
                if attrs.optional(SCHEMA).is_some() || attrs.optional(CATALOG).is_some() {
                    return Err(attrs.error(format!(
                        "derived entity '{name}' cannot declare a schema or catalog"
                    )));
                }
                if self.map.resolve_db_entity(parent).is_none() {
                    return Err(attrs
                        .error(format!("unknown parent entity '{parent}' of '{name}'"))
                        .with_hint("a parent entity must be declared before its derived entities"));
                }
                DbEntity::derived(name, parent)
            }
            None => {
                let mut entity = DbEntity::new(name);
                if let Some(schema) = attrs.optional(SCHEMA) {
                    entity = entity.with_schema(schema);
                }
                if let Some(catalog) = attrs.optional(CATALOG) {
                    entity = entity.with_catalog(catalog);
                }
                entity
            }
        };

        self.map.add_db_entity(entity);
        Ok(Context::DbEntity {
            name: name.to_string(),
        })
    }

    fn open_db_attribute(&mut self, entity_name: &str, attrs: &Attrs) -> Result<Context, FormatError> {
        let name = attrs.required(NAME)?;
        let sql_type = match attrs.optional(TYPE) {
            None => NOT_DEFINED,
            Some(type_name) => types::type_code(type_name)
                .ok_or_else(|| attrs.error(format!("unknown SQL type '{type_name}'")))?,
        };

        let mut attribute = DbAttribute::new(name, sql_type);
        attribute.set_max_length(attrs.number(LENGTH)?);
        attribute.set_precision(attrs.number(PRECISION)?);
        attribute.set_mandatory(attrs.flag(IS_MANDATORY)?);
        if attrs.flag(IS_PRIMARY_KEY)? {
            attribute.set_primary_key(true);
        }
        let group_by = attrs.flag(IS_GROUP_BY)?;
        let spec = attrs.optional(SPEC);

        let entity = self
            .map
            .db_entity_mut(entity_name)
            .ok_or_else(|| attrs.error(format!("unknown db entity '{entity_name}'")))?;
        if !entity.is_derived() && (group_by || spec.is_some()) {
            return Err(attrs.error(format!(
                "attribute '{name}' of physical entity '{entity_name}' cannot declare '{IS_GROUP_BY}' or '{SPEC}'"
            )));
        }
        if entity.attribute(name).is_some() {
            return Err(attrs.error(format!("duplicate attribute '{name}' in '{entity_name}'")));
        }

        attribute.set_group_by(group_by);
        attribute.set_derived(spec.map(DerivedSpec::new));
        entity.add_attribute(attribute);

        Ok(Context::DbAttribute {
            entity: entity_name.to_string(),
            name: name.to_string(),
        })
    }

    fn open_db_attribute_ref(
        &mut self,
        entity_name: &str,
        attribute_name: &str,
        attrs: &Attrs,
    ) -> Result<Context, FormatError> {
        let column = attrs.required(NAME)?;
        let parent_name = self
            .map
            .db_entity(entity_name)
            .and_then(DbEntity::parent_name)
            .ok_or_else(|| {
                attrs.error(format!(
                    "<{DB_ATTRIBUTE_REF}> in '{entity_name}', which is not a derived entity"
                ))
            })?;
        let parent = self
            .map
            .resolve_db_entity(parent_name)
            .ok_or_else(|| attrs.error(format!("unknown parent entity '{parent_name}'")))?;
        if parent.attribute(column).is_none() {
            return Err(attrs.error(format!(
                "parameter column '{column}' not found in parent entity '{parent_name}'"
            )));
        }

        let attribute = self
            .map
            .db_entity_mut(entity_name)
            .and_then(|e| e.attribute_mut(attribute_name))
            .ok_or_else(|| attrs.error(format!("unknown attribute '{entity_name}.{attribute_name}'")))?;
        let Some(mut spec) = attribute.derived().cloned() else {
            return Err(attrs.error(format!(
                "<{DB_ATTRIBUTE_REF}> requires a '{SPEC}' on attribute '{entity_name}.{attribute_name}'"
            )));
        };
        spec.params.push(column.to_string());
        attribute.set_derived(Some(spec));

        Ok(Context::Leaf(DB_ATTRIBUTE_REF))
    }

    fn open_obj_entity(&mut self, attrs: &Attrs) -> Result<Context, FormatError> {
        let name = attrs.required(NAME)?;
        if self.map.contains_obj_entity(name) {
            return Err(attrs.error(format!("duplicate obj entity '{name}'")));
        }

        let mut entity = ObjEntity::new(name).with_class_name(attrs.optional(CLASS_NAME).unwrap_or_default());
        if let Some(super_class) = attrs.optional(SUPER_CLASS_NAME) {
            entity = entity.with_super_class_name(super_class);
        }
        if let Some(db_entity) = attrs.optional(DB_ENTITY_NAME) {
            entity = entity.with_db_entity(db_entity);
        }

        self.map.add_obj_entity(entity);
        Ok(Context::ObjEntity {
            name: name.to_string(),
        })
    }

    fn open_obj_attribute(&mut self, entity_name: &str, attrs: &Attrs) -> Result<Context, FormatError> {
        let name = attrs.required(NAME)?;
        let mut attribute = ObjAttribute::new(name, attrs.optional(TYPE).unwrap_or_default());
        if let Some(column) = attrs.optional(DB_ATTRIBUTE_NAME) {
            attribute = attribute.with_db_attribute(column);
        }

        let entity = self
            .map
            .obj_entity_mut(entity_name)
            .ok_or_else(|| attrs.error(format!("unknown obj entity '{entity_name}'")))?;
        if entity.attribute(name).is_some() {
            return Err(attrs.error(format!("duplicate attribute '{name}' in '{entity_name}'")));
        }
        entity.add_attribute(attribute);

        Ok(Context::Leaf(OBJ_ATTRIBUTE))
    }

    fn open_db_relationship(&mut self, attrs: &Attrs) -> Result<Context, FormatError> {
        let name = attrs.required(NAME)?;
        let source = attrs.required(SOURCE)?;
        let target = attrs.required(TARGET)?;
        let to_many = attrs.flag(TO_MANY)?;
        let to_dependent_pk = attrs.flag(TO_DEPENDENT_PK)?;

        if self.map.resolve_db_entity(target).is_none() {
            return Err(attrs.error(format!(
                "unknown target entity '{target}' of db relationship '{source}.{name}'"
            )));
        }
        let entity = self.map.db_entity_mut(source).ok_or_else(|| {
            attrs.error(format!("unknown source entity '{source}' of db relationship '{name}'"))
        })?;
        if entity.has_relationship(name) {
            return Err(attrs.error(format!("duplicate db relationship '{source}.{name}'")));
        }

        entity.add_relationship(
            DbRelationship::new(name, target)
                .with_to_many(to_many)
                .with_to_dependent_pk(to_dependent_pk),
        );
        Ok(Context::DbRelationship {
            key: DbRelationshipKey::new(source, target, name),
        })
    }

    fn open_db_attribute_pair(&mut self, key: &DbRelationshipKey, attrs: &Attrs) -> Result<Context, FormatError> {
        let join = DbJoin::new(attrs.required(SOURCE)?, attrs.required(TARGET)?);
        let relationship = self
            .map
            .db_entity_mut(&key.source)
            .and_then(|e| e.relationship_mut(&key.name))
            .ok_or_else(|| attrs.error(format!("unknown db relationship {key}")))?;
        relationship.add_join(join);
        Ok(Context::Leaf(DB_ATTRIBUTE_PAIR))
    }

    fn open_obj_relationship(&mut self, attrs: &Attrs) -> Result<Context, FormatError> {
        let name = attrs.required(NAME)?;
        let source = attrs.required(SOURCE)?;
        let target = attrs.required(TARGET)?;
        let to_many = attrs.flag(TO_MANY)?;

        if self.map.resolve_obj_entity(target).is_none() {
            return Err(attrs.error(format!(
                "unknown target entity '{target}' of obj relationship '{source}.{name}'"
            )));
        }
        let entity = self.map.obj_entity_mut(source).ok_or_else(|| {
            attrs.error(format!("unknown source entity '{source}' of obj relationship '{name}'"))
        })?;
        if entity.relationship(name).is_some() {
            return Err(attrs.error(format!("duplicate obj relationship '{source}.{name}'")));
        }

        entity.add_relationship(ObjRelationship::new(name, target).with_to_many(to_many));
        Ok(Context::ObjRelationship {
            source: source.to_string(),
            name: name.to_string(),
        })
    }

    fn open_db_relationship_ref(&mut self, source: &str, name: &str, attrs: &Attrs) -> Result<Context, FormatError> {
        let key = DbRelationshipKey::new(
            attrs.required(SOURCE)?,
            attrs.required(TARGET)?,
            attrs.required(NAME)?,
        );

        let resolved = self.known.contains(&key)
            || self
                .map
                .dependencies()
                .iter()
                .any(|dependency| dependency.resolve_db_relationship(&key).is_some());
        if !resolved {
            return Err(attrs
                .error(format!("unresolved db relationship reference {key}"))
                .with_hint(format!(
                    "a <{DB_RELATIONSHIP_REF}> must name a <{DB_RELATIONSHIP}> declared earlier in the document"
                )));
        }

        let relationship = self
            .map
            .obj_entity_mut(source)
            .and_then(|e| e.relationship_mut(name))
            .ok_or_else(|| attrs.error(format!("unknown obj relationship '{source}.{name}'")))?;
        relationship.add_db_relationship(key);
        Ok(Context::Leaf(DB_RELATIONSHIP_REF))
    }
}
