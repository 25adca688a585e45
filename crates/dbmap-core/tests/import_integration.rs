//! Integration tests for the catalog importer.

use std::cell::Cell;
use std::collections::HashMap;

use dbmap_core::import::IntrospectionResult;
use dbmap_core::types::{INTEGER, VARCHAR};
use dbmap_core::{
    validate, CatalogIntrospector, ColumnInfo, DbJoin, Error, ExportedKey, ImportConfig, Importer,
    TableInfo,
};
use pretty_assertions::assert_eq;

/// An in-memory catalog.
#[derive(Default)]
struct FakeCatalog {
    tables: Vec<TableInfo>,
    columns: HashMap<String, Vec<ColumnInfo>>,
    primary_keys: HashMap<String, Vec<String>>,
    exported_keys: HashMap<String, Vec<ExportedKey>>,
    /// Name of a call that fails.
    fail_on: Option<&'static str>,
    calls: Cell<usize>,
}

impl FakeCatalog {
    fn table(mut self, name: &str, columns: &[(&str, i32, bool)], pk: &[&str]) -> Self {
        self.tables.push(TableInfo::table(name));
        self.columns.insert(
            name.to_string(),
            columns
                .iter()
                .map(|(column, sql_type, nullable)| ColumnInfo {
                    name: column.to_string(),
                    sql_type: *sql_type,
                    size: (*sql_type == VARCHAR).then_some(100),
                    decimal_digits: None,
                    nullable: *nullable,
                })
                .collect(),
        );
        self.primary_keys
            .insert(name.to_string(), pk.iter().map(|c| c.to_string()).collect());
        self
    }

    fn foreign_key(mut self, pk_table: &str, fk_table: &str, columns: &[(&str, &str)]) -> Self {
        let rows = self.exported_keys.entry(pk_table.to_string()).or_default();
        for (i, (pk_column, fk_column)) in columns.iter().enumerate() {
            rows.push(ExportedKey {
                fk_table: fk_table.to_string(),
                pk_column: pk_column.to_string(),
                fk_column: fk_column.to_string(),
                key_seq: i as u32 + 1,
            });
        }
        self
    }

    fn failing(mut self, call: &'static str) -> Self {
        self.fail_on = Some(call);
        self
    }

    fn call(&self, name: &'static str) -> IntrospectionResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on == Some(name) {
            return Err(format!("{name}: connection lost").into());
        }
        Ok(())
    }
}

impl CatalogIntrospector for FakeCatalog {
    fn list_catalogs(&self) -> IntrospectionResult<Vec<String>> {
        self.call("list_catalogs")?;
        Ok(vec!["main".to_string()])
    }

    fn list_schemas(&self) -> IntrospectionResult<Vec<String>> {
        self.call("list_schemas")?;
        Ok(Vec::new())
    }

    fn list_tables(
        &self,
        _catalog: Option<&str>,
        _schema_pattern: Option<&str>,
        name_pattern: &str,
        _types: &[String],
    ) -> IntrospectionResult<Vec<TableInfo>> {
        self.call("list_tables")?;
        let prefix = name_pattern.trim_end_matches('%');
        Ok(self
            .tables
            .iter()
            .filter(|t| t.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn list_columns(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> IntrospectionResult<Vec<ColumnInfo>> {
        self.call("list_columns")?;
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    fn list_primary_keys(&self, _schema: Option<&str>, table: &str) -> IntrospectionResult<Vec<String>> {
        self.call("list_primary_keys")?;
        Ok(self.primary_keys.get(table).cloned().unwrap_or_default())
    }

    fn list_exported_keys(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> IntrospectionResult<Vec<ExportedKey>> {
        self.call("list_exported_keys")?;
        Ok(self.exported_keys.get(table).cloned().unwrap_or_default())
    }
}

fn parent_child() -> FakeCatalog {
    FakeCatalog::default()
        .table(
            "parent",
            &[("id", INTEGER, false), ("name", VARCHAR, true)],
            &["id"],
        )
        .table(
            "child",
            &[
                ("id", INTEGER, false),
                ("parent_id", INTEGER, false),
                ("label", VARCHAR, true),
            ],
            &["id"],
        )
        .foreign_key("parent", "child", &[("id", "parent_id")])
}

#[test]
fn test_two_table_import() {
    let catalog = parent_child();
    let map = Importer::with_config(&catalog, ImportConfig::new().with_map_name("family"))
        .import()
        .unwrap();

    assert_eq!(map.name(), "family");
    assert_eq!(map.db_entity_names(), vec!["child", "parent"]);

    let parent = map.db_entity("parent").unwrap();
    let child = map.db_entity("child").unwrap();
    assert!(parent.attribute("id").unwrap().is_primary_key());
    assert!(parent.attribute("id").unwrap().is_mandatory());
    assert!(!parent.attribute("name").unwrap().is_mandatory());
    assert_eq!(parent.attribute("name").unwrap().max_length(), Some(100));

    let to_many = parent.relationship("childArray").unwrap();
    assert!(to_many.is_to_many());
    assert_eq!(to_many.target(), "child");
    assert_eq!(to_many.joins(), &[DbJoin::new("id", "parent_id")]);

    let to_one = child.relationship("toParent").unwrap();
    assert!(!to_one.is_to_many());
    assert_eq!(to_one.joins(), &[DbJoin::new("parent_id", "id")]);
    assert_eq!(to_many.reverse_relationship(&map), Some(to_one));
    assert_eq!(to_one.reverse_relationship(&map), Some(to_many));

    // Primary keys stay out of the object layer; foreign keys do not.
    let child_obj = map.obj_entity("Child").unwrap();
    let mut names: Vec<_> = child_obj.attributes().map(|a| a.name()).collect();
    names.sort();
    assert_eq!(names, vec!["label", "parentId"]);
    assert_eq!(child_obj.attribute("parentId").unwrap().db_attribute(), Some("parent_id"));
    assert_eq!(child_obj.attribute("label").unwrap().type_name(), "String");
    assert_eq!(child_obj.db_entity(), Some("child"));

    let children = map.obj_entity("Parent").unwrap().relationship("childArray").unwrap();
    assert_eq!(children.target(), "Child");
    assert!(children.is_to_many());
    assert_eq!(children.db_relationships(), &[to_many.key()]);
    let back = map.obj_entity("Child").unwrap().relationship("toParent").unwrap();
    assert_eq!(children.reverse_relationship(&map), Some(back));
}

#[test]
fn test_imported_map_validates() {
    let catalog = parent_child();
    let map = Importer::new(&catalog).import().unwrap();
    assert_eq!(validate(&map), Vec::new());
}

#[test]
fn test_class_package() {
    let catalog = parent_child();
    let map = Importer::with_config(&catalog, ImportConfig::new().with_class_package("org.example"))
        .import()
        .unwrap();
    assert_eq!(map.obj_entity("Parent").unwrap().class_name(), "org.example.Parent");
}

#[test]
fn test_composite_and_repeated_keys() {
    let catalog = FakeCatalog::default()
        .table(
            "orders",
            &[("shop", INTEGER, false), ("num", INTEGER, false)],
            &["shop", "num"],
        )
        .table(
            "line",
            &[
                ("order_shop", INTEGER, false),
                ("order_num", INTEGER, false),
                ("alt_shop", INTEGER, true),
                ("alt_num", INTEGER, true),
            ],
            &["order_shop", "order_num"],
        )
        .foreign_key("orders", "line", &[("shop", "order_shop"), ("num", "order_num")])
        .foreign_key("orders", "line", &[("shop", "alt_shop"), ("num", "alt_num")]);

    let map = Importer::new(&catalog).import().unwrap();
    let orders = map.db_entity("orders").unwrap();
    let line = map.db_entity("line").unwrap();

    let first = orders.relationship("lineArray").unwrap();
    assert_eq!(first.joins().len(), 2);
    assert!(first.is_to_dependent_pk());
    let second = orders.relationship("lineArray1").unwrap();
    assert_eq!(second.joins()[0], DbJoin::new("shop", "alt_shop"));
    assert!(!second.is_to_dependent_pk());

    assert!(line.has_relationship("toOrders"));
    assert!(line.has_relationship("toOrders1"));
    assert_eq!(
        second.reverse_relationship(&map).map(|r| r.name()),
        Some("toOrders1")
    );
}

#[test]
fn test_foreign_key_from_unselected_table_is_skipped() {
    let catalog = parent_child();
    let map = Importer::with_config(&catalog, ImportConfig::new().with_table_pattern("par%"))
        .import()
        .unwrap();
    assert_eq!(map.db_entity_names(), vec!["parent"]);
    assert_eq!(map.db_entity("parent").unwrap().relationship_count(), 0);
}

#[test]
fn test_introspection_failure_aborts() {
    for call in ["list_tables", "list_columns", "list_primary_keys", "list_exported_keys"] {
        let catalog = parent_child().failing(call);
        let err = Importer::new(&catalog).import().unwrap_err();
        match err {
            Error::CatalogIntrospection { operation, source } => {
                assert_eq!(operation, call);
                assert!(source.to_string().contains("connection lost"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_catalog_and_schema_listing() {
    let catalog = parent_child();
    let importer = Importer::new(&catalog);
    assert_eq!(importer.catalogs().unwrap(), vec!["main".to_string()]);
    assert!(importer.schemas().unwrap().is_empty());

    let failing = parent_child().failing("list_catalogs");
    assert!(matches!(
        Importer::new(&failing).catalogs(),
        Err(Error::CatalogIntrospection { operation: "list_catalogs", .. })
    ));
    assert!(failing.calls.get() > 0);
}
