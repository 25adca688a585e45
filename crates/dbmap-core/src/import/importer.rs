//! Reverse engineering of a [`DataMap`] from a catalog.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::introspect::{CatalogIntrospector, ExportedKey, TableInfo};
use crate::config::ImportConfig;
use crate::error::Error;
use crate::map::{
    types, DataMap, DbAttribute, DbEntity, DbRelationship, DbRelationshipKey, ObjAttribute,
    ObjEntity, ObjRelationship,
};
use crate::naming;

/// Builds a [`DataMap`] from the tables of a database catalog.
///
/// Every introspection failure aborts the import: the map under
/// construction is dropped and the failure is returned as
/// [`Error::CatalogIntrospection`].
pub struct Importer<'a, I: CatalogIntrospector + ?Sized> {
    introspector: &'a I,
    config: ImportConfig,
}

impl<'a, I: CatalogIntrospector + ?Sized> Importer<'a, I> {
    /// Create an importer with the default configuration.
    pub fn new(introspector: &'a I) -> Self {
        Self::with_config(introspector, ImportConfig::default())
    }

    /// Create an importer with a configuration.
    pub fn with_config(introspector: &'a I, config: ImportConfig) -> Self {
        Self {
            introspector,
            config,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Catalogs available to choose from.
    pub fn catalogs(&self) -> Result<Vec<String>, Error> {
        self.introspector
            .list_catalogs()
            .map_err(|e| Error::introspection("list_catalogs", e))
    }

    /// Schemas available to choose from.
    pub fn schemas(&self) -> Result<Vec<String>, Error> {
        self.introspector
            .list_schemas()
            .map_err(|e| Error::introspection("list_schemas", e))
    }

    /// Tables selected by the configuration.
    pub fn tables(&self) -> Result<Vec<TableInfo>, Error> {
        self.introspector
            .list_tables(
                self.config.catalog.as_deref(),
                self.config.schema_pattern.as_deref(),
                &self.config.table_pattern,
                &self.config.table_types,
            )
            .map_err(|e| Error::introspection("list_tables", e))
    }

    /// Import every table selected by the configuration.
    pub fn import(&self) -> Result<DataMap, Error> {
        let tables = self.tables()?;
        self.import_tables(&tables)
    }

    /// Import the given tables.
    pub fn import_tables(&self, tables: &[TableInfo]) -> Result<DataMap, Error> {
        info!(
            map = %self.config.map_name,
            tables = tables.len(),
            "importing catalog"
        );

        let mut map = DataMap::new(&self.config.map_name);
        let mut entity_names = Vec::with_capacity(tables.len());
        for table in tables {
            // Same-named tables of different schemas get distinct entities.
            let name = naming::unique_name(&table.name, |n| map.contains_db_entity(n));
            if name != table.name {
                warn!(
                    table = %table.name,
                    schema = ?table.schema,
                    entity = %name,
                    "table name already imported from another schema"
                );
            }
            let entity = self.load_entity(table, &name)?;
            map.add_db_entity(entity);
            entity_names.push(name);
        }

        for (table, name) in tables.iter().zip(&entity_names) {
            self.mark_primary_keys(&mut map, table, name)?;
        }

        for (table, name) in tables.iter().zip(&entity_names) {
            let keys = self
                .introspector
                .list_exported_keys(table.catalog.as_deref(), table.schema.as_deref(), &table.name)
                .map_err(|e| Error::introspection("list_exported_keys", e))?;
            for group in group_exported_keys(&keys) {
                let Some(first) = group.first() else {
                    continue;
                };
                match entity_for_table(tables, &entity_names, &first.fk_table, table.schema.as_deref()) {
                    Some(fk_entity) => add_relationship_pair(&mut map, name, fk_entity, group),
                    None => warn!(
                        pk_table = %table.name,
                        fk_table = %first.fk_table,
                        "skipping foreign key from a table that was not imported"
                    ),
                }
            }
        }

        let obj_names = self.add_obj_entities(&mut map);
        add_obj_relationships(&mut map, &obj_names);

        info!(
            map = %map.name(),
            db_entities = map.db_entities().count(),
            db_relationships = map.db_relationships().count(),
            obj_entities = map.obj_entities().count(),
            "catalog imported"
        );
        Ok(map)
    }

    fn load_entity(&self, table: &TableInfo, name: &str) -> Result<DbEntity, Error> {
        let mut entity = DbEntity::new(name);
        if let Some(catalog) = &table.catalog {
            entity = entity.with_catalog(catalog);
        }
        if let Some(schema) = &table.schema {
            entity = entity.with_schema(schema);
        }

        let columns = self
            .introspector
            .list_columns(table.catalog.as_deref(), table.schema.as_deref(), &table.name)
            .map_err(|e| Error::introspection("list_columns", e))?;

        for column in columns {
            let mut attribute = DbAttribute::new(&column.name, column.sql_type);
            attribute.set_max_length(column.size);
            attribute.set_precision(column.decimal_digits);
            attribute.set_mandatory(!column.nullable);
            entity.add_attribute(attribute);
        }

        debug!(
            entity = %name,
            columns = entity.attribute_count(),
            "loaded table"
        );
        Ok(entity)
    }

    fn mark_primary_keys(&self, map: &mut DataMap, table: &TableInfo, name: &str) -> Result<(), Error> {
        let keys = self
            .introspector
            .list_primary_keys(table.schema.as_deref(), &table.name)
            .map_err(|e| Error::introspection("list_primary_keys", e))?;

        let Some(entity) = map.db_entity_mut(name) else {
            return Ok(());
        };
        for column in keys {
            match entity.attribute_mut(&column) {
                Some(attribute) => attribute.set_primary_key(true),
                None => warn!(
                    entity = %name,
                    column = %column,
                    "primary key column not among the table's columns"
                ),
            }
        }
        Ok(())
    }

    /// Add one object entity per database entity; returns the object entity
    /// name chosen for each database entity.
    fn add_obj_entities(&self, map: &mut DataMap) -> BTreeMap<String, String> {
        let package = self.config.class_package.as_deref();
        let mut names = BTreeMap::new();
        let mut entities = Vec::new();

        for db_entity in map.db_entities() {
            let base = naming::entity_name(db_entity.name());
            let name = naming::unique_name(&base, |n| {
                map.contains_obj_entity(n) || names.values().any(|taken: &String| taken == n)
            });

            let mut entity = ObjEntity::new(&name)
                .with_class_name(naming::class_name(db_entity.name(), package))
                .with_db_entity(db_entity.name());
            // Primary keys stay out of the object layer.
            for column in db_entity.attributes().filter(|a| !a.is_primary_key()) {
                let property = naming::unique_name(&naming::property_name(column.name()), |n| {
                    entity.attribute(n).is_some()
                });
                entity.add_attribute(
                    ObjAttribute::new(property, types::logical_type_name(column.sql_type()))
                        .with_db_attribute(column.name()),
                );
            }

            names.insert(db_entity.name().to_string(), name);
            entities.push(entity);
        }

        for entity in entities {
            map.add_obj_entity(entity);
        }
        names
    }
}

/// Split exported-key rows into keys. A row with `key_seq == 1`, or one
/// naming a different table than the previous row, starts a new key.
fn group_exported_keys(rows: &[ExportedKey]) -> Vec<&[ExportedKey]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..rows.len() {
        if rows[i].key_seq == 1 || rows[i].fk_table != rows[i - 1].fk_table {
            groups.push(&rows[start..i]);
            start = i;
        }
    }
    if start < rows.len() {
        groups.push(&rows[start..]);
    }
    groups
}

/// Entity imported for the table `name`, preferring the table in `schema`
/// when several schemas hold a table of that name.
fn entity_for_table<'t>(
    tables: &[TableInfo],
    entity_names: &'t [String],
    name: &str,
    schema: Option<&str>,
) -> Option<&'t str> {
    let candidates: Vec<(&TableInfo, &'t String)> = tables
        .iter()
        .zip(entity_names)
        .filter(|(table, _)| table.name == name)
        .collect();
    candidates
        .iter()
        .find(|(table, _)| table.schema.as_deref() == schema)
        .or(candidates.first())
        .map(|&(_, entity)| entity.as_str())
}

/// Add the to-many relationship `pk_table -> fk_table` and its to-one
/// reverse for one foreign key.
fn add_relationship_pair(map: &mut DataMap, pk_table: &str, fk_table: &str, group: &[ExportedKey]) {
    if group.is_empty() {
        return;
    }

    let Some(fk_entity) = map.db_entity(fk_table) else {
        warn!(
            pk_table,
            fk_table,
            "skipping foreign key from a table that was not imported"
        );
        return;
    };
    let Some(pk_entity) = map.db_entity(pk_table) else {
        return;
    };

    let dependent = group.iter().all(|row| {
        fk_entity
            .attribute(&row.fk_column)
            .is_some_and(|a| a.is_primary_key())
    });

    let forward_name = naming::unique_name(&naming::to_many_name(fk_table), |n| pk_entity.has_relationship(n));
    let mut forward = DbRelationship::new(forward_name, fk_table)
        .with_to_many(true)
        .with_to_dependent_pk(dependent);
    for row in group {
        forward = forward.with_join(&row.pk_column, &row.fk_column);
    }
    if let Some(pk_entity) = map.db_entity_mut(pk_table) {
        pk_entity.add_relationship(forward);
    }

    // Computed after the forward is added: on a self reference both land
    // in the same entity.
    let Some(fk_entity) = map.db_entity(fk_table) else {
        return;
    };
    let reverse_name = naming::unique_name(&naming::to_one_name(pk_table), |n| fk_entity.has_relationship(n));
    let mut reverse = DbRelationship::new(reverse_name, pk_table);
    for row in group {
        reverse = reverse.with_join(&row.fk_column, &row.pk_column);
    }
    if let Some(fk_entity) = map.db_entity_mut(fk_table) {
        fk_entity.add_relationship(reverse);
    }

    debug!(pk_table, fk_table, joins = group.len(), "added relationship pair");
}

/// One object relationship per database relationship of each mapped entity.
fn add_obj_relationships(map: &mut DataMap, obj_names: &BTreeMap<String, String>) {
    let mut pending: Vec<(String, ObjRelationship)> = Vec::new();

    for db_relationship in map.db_relationships() {
        let (Some(source), Some(target)) = (
            obj_names.get(db_relationship.source()),
            obj_names.get(db_relationship.target()),
        ) else {
            continue;
        };
        let relationship = ObjRelationship::new(db_relationship.name(), target)
            .with_to_many(db_relationship.is_to_many())
            .with_db_relationship(DbRelationshipKey::new(
                db_relationship.source(),
                db_relationship.target(),
                db_relationship.name(),
            ));
        pending.push((source.clone(), relationship));
    }

    for (source, relationship) in pending {
        if let Some(entity) = map.obj_entity_mut(&source) {
            entity.add_relationship(relationship);
        }
    }
}
