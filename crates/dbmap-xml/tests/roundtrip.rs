//! Save and load behaviour of the XML codec.

use std::sync::Arc;

use dbmap_core::types::{DECIMAL, INTEGER, VARCHAR};
use dbmap_core::{
    DataMap, DbAttribute, DbEntity, DbRelationship, DbRelationshipKey, DerivedSpec, ObjAttribute,
    ObjEntity, ObjRelationship,
};
use dbmap_xml::{CodecConfig, CodecError};
use pretty_assertions::assert_eq;

fn gallery() -> DataMap {
    DataMap::new("gallery")
        .with_db_entity(
            DbEntity::new("artist")
                .with_schema("art")
                .with_catalog("main")
                .with_attribute(DbAttribute::new("id", INTEGER).with_primary_key())
                .with_attribute(DbAttribute::new("name", VARCHAR).with_length(200).with_mandatory())
                .with_relationship(
                    DbRelationship::new("paintingArray", "painting")
                        .with_join("id", "artist_id")
                        .with_to_many(true),
                ),
        )
        .with_db_entity(
            DbEntity::new("painting")
                .with_attribute(DbAttribute::new("id", INTEGER).with_primary_key())
                .with_attribute(DbAttribute::new("artist_id", INTEGER))
                .with_attribute(DbAttribute::new("price", DECIMAL).with_length(10).with_precision(2))
                .with_relationship(DbRelationship::new("toArtist", "artist").with_join("artist_id", "id")),
        )
        .with_db_entity(
            DbEntity::derived("painting_totals", "painting")
                .with_attribute(DbAttribute::new("artist_id", INTEGER).with_group_by())
                .with_attribute(
                    DbAttribute::new("total", DECIMAL)
                        .with_derived(DerivedSpec::new("SUM(%@)").with_param("price")),
                ),
        )
        .with_obj_entity(
            ObjEntity::new("Artist")
                .with_class_name("org.gallery.Artist")
                .with_db_entity("artist")
                .with_attribute(ObjAttribute::new("name", "String").with_db_attribute("name"))
                .with_relationship(
                    ObjRelationship::new("paintings", "Painting")
                        .with_to_many(true)
                        .with_db_relationship(DbRelationshipKey::new("artist", "painting", "paintingArray")),
                ),
        )
        .with_obj_entity(
            ObjEntity::new("Painting")
                .with_class_name("org.gallery.Painting")
                .with_super_class_name("org.gallery.Item")
                .with_db_entity("painting")
                .with_attribute(ObjAttribute::new("price", "Decimal").with_db_attribute("price"))
                .with_relationship(
                    ObjRelationship::new("artist", "Artist")
                        .with_db_relationship(DbRelationshipKey::new("painting", "artist", "toArtist")),
                ),
        )
}

fn assert_same_map(left: &DataMap, right: &DataMap) {
    assert_eq!(left.name(), right.name());
    assert_eq!(left.db_entity_names(), right.db_entity_names());
    assert_eq!(left.obj_entity_names(), right.obj_entity_names());
    for name in left.db_entity_names() {
        assert_eq!(left.db_entity(name), right.db_entity(name), "db entity {name}");
    }
    for name in left.obj_entity_names() {
        assert_eq!(left.obj_entity(name), right.obj_entity(name), "obj entity {name}");
    }
}

fn format_error(err: CodecError) -> String {
    match err {
        CodecError::Format(err) => err.message,
        other => panic!("expected a format error, got {other}"),
    }
}

#[test]
fn test_round_trip_preserves_map() {
    let map = gallery();
    let xml = dbmap_xml::to_string(&map).unwrap();
    let loaded = dbmap_xml::load_str(&xml).unwrap();
    assert_same_map(&map, &loaded);

    // Saving the loaded map again gives the same document.
    assert_eq!(dbmap_xml::to_string(&loaded).unwrap(), xml);
}

#[test]
fn test_document_order() {
    let xml = dbmap_xml::to_string(&gallery()).unwrap();
    let position = |needle: &str| xml.find(needle).unwrap_or_else(|| panic!("{needle} not written"));

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(xml.contains("<data-map name=\"gallery\" project-version=\"1\">"));
    assert!(position("<db-entity name=\"painting\"") < position("<db-entity name=\"painting_totals\""));
    assert!(position("<db-entity name=\"painting_totals\"") < position("<obj-entity name=\"Artist\""));
    assert!(position("<obj-entity name=\"Painting\"") < position("<db-relationship"));
    assert!(position("<db-relationship") < position("<obj-relationship"));
}

#[test]
fn test_written_attributes() {
    let xml = dbmap_xml::to_string(&gallery()).unwrap();

    assert!(xml.contains(
        "<db-attribute name=\"id\" type=\"INTEGER\" isPrimaryKey=\"true\" isMandatory=\"true\"/>"
    ));
    assert!(xml.contains("<db-attribute name=\"artist_id\" type=\"INTEGER\"/>"));
    assert!(xml.contains("<db-attribute name=\"total\" type=\"DECIMAL\" spec=\"SUM(%@)\">"));
    assert!(xml.contains("<db-attribute-ref name=\"price\"/>"));
    assert!(xml.contains(
        "<db-relationship name=\"toArtist\" source=\"painting\" target=\"artist\" toMany=\"false\" toDependentPK=\"false\">"
    ));
    assert!(xml.contains("<db-attribute-pair source=\"artist_id\" target=\"id\"/>"));
    assert!(xml.contains("<db-relationship-ref source=\"painting\" target=\"artist\" name=\"toArtist\"/>"));
}

#[test]
fn test_unindented_and_nameless_output() {
    let config = CodecConfig::new().with_indent(0).without_map_name();
    let bytes = dbmap_xml::save(&gallery(), Vec::new(), &config).unwrap();
    let xml = String::from_utf8(bytes).unwrap();

    assert!(!xml.contains('\n'));
    assert!(xml.contains("<data-map project-version=\"1\">"));

    let loaded = dbmap_xml::load(xml.as_bytes(), &config).unwrap();
    assert_eq!(loaded.name(), "");
    assert_eq!(loaded.db_entity_names(), vec!["artist", "painting", "painting_totals"]);
}

#[test]
fn test_empty_map() {
    let loaded = dbmap_xml::load_str("<data-map name=\"empty\"/>").unwrap();
    assert_eq!(loaded.name(), "empty");
    assert!(loaded.is_empty());
}

#[test]
fn test_unresolved_relationship_reference_fails() {
    let xml = r#"<data-map project-version="1">
  <db-entity name="artist"/>
  <obj-entity name="Artist" className="Artist" dbEntityName="artist"/>
  <obj-relationship name="paintings" source="Artist" target="Artist" toMany="true">
    <db-relationship-ref source="artist" target="painting" name="paintingArray"/>
  </obj-relationship>
</data-map>"#;
    let err = dbmap_xml::load_str(xml).unwrap_err();
    let rendered = err.format_with_source(xml);
    assert!(rendered.contains("unresolved db relationship reference artist.paintingArray -> painting"));
    assert!(rendered.contains("--> line 5:5"));
    assert!(rendered.contains("= hint:"));
}

#[test]
fn test_reference_before_declaration_fails() {
    let xml = r#"<data-map>
  <db-entity name="artist"/>
  <obj-entity name="Artist"/>
  <obj-relationship name="self" source="Artist" target="Artist">
    <db-relationship-ref source="artist" target="artist" name="toSelf"/>
  </obj-relationship>
  <db-relationship name="toSelf" source="artist" target="artist"/>
</data-map>"#;
    let message = format_error(dbmap_xml::load_str(xml).unwrap_err());
    assert!(message.starts_with("unresolved db relationship reference"));
}

#[test]
fn test_reference_resolves_in_dependency() {
    let shared = Arc::new(
        DataMap::new("shared")
            .with_db_entity(
                DbEntity::new("artist")
                    .with_attribute(DbAttribute::new("id", INTEGER).with_primary_key())
                    .with_relationship(
                        DbRelationship::new("paintingArray", "painting")
                            .with_join("id", "artist_id")
                            .with_to_many(true),
                    ),
            )
            .with_db_entity(DbEntity::new("painting").with_attribute(DbAttribute::new("artist_id", INTEGER)))
            .with_obj_entity(ObjEntity::new("Painting").with_class_name("Painting")),
    );
    let xml = r#"<data-map name="local">
  <obj-entity name="Artist" className="Artist" dbEntityName="artist"/>
  <obj-relationship name="paintings" source="Artist" target="Painting" toMany="true">
    <db-relationship-ref source="artist" target="painting" name="paintingArray"/>
  </obj-relationship>
</data-map>"#;
    let config = CodecConfig::new().with_dependency(Arc::clone(&shared));

    let loaded = dbmap_xml::load(xml.as_bytes(), &config).unwrap();
    assert_eq!(loaded.dependencies().len(), 1);
    let relationship = loaded.obj_entity("Artist").unwrap().relationship("paintings").unwrap();
    assert_eq!(
        relationship.db_relationships(),
        &[DbRelationshipKey::new("artist", "painting", "paintingArray")]
    );

    // Without the dependency the same document is rejected.
    assert!(dbmap_xml::load_str(xml).is_err());

    // The reference is not dangling when saving either.
    let saved = dbmap_xml::to_string(&loaded).unwrap();
    assert!(saved.contains("<db-relationship-ref source=\"artist\" target=\"painting\" name=\"paintingArray\"/>"));
}

#[test]
fn test_unknown_parent_fails() {
    let xml = r#"<data-map>
  <db-entity name="totals" parentName="painting"/>
</data-map>"#;
    let err = dbmap_xml::load_str(xml).unwrap_err();
    let CodecError::Format(format) = err else {
        panic!("expected a format error");
    };
    assert_eq!(format.message, "unknown parent entity 'painting' of 'totals'");
    assert!(format.hint.is_some());
}

#[test]
fn test_invalid_values_fail() {
    let bad_flag = r#"<data-map><db-entity name="a"><db-attribute name="id" type="INTEGER" isPrimaryKey="yes"/></db-entity></data-map>"#;
    assert_eq!(
        format_error(dbmap_xml::load_str(bad_flag).unwrap_err()),
        "attribute 'isPrimaryKey' of <db-attribute> must be 'true' or 'false', found 'yes'"
    );

    let bad_type = r#"<data-map><db-entity name="a"><db-attribute name="id" type="NUMBERISH"/></db-entity></data-map>"#;
    assert_eq!(
        format_error(dbmap_xml::load_str(bad_type).unwrap_err()),
        "unknown SQL type 'NUMBERISH'"
    );

    let bad_length = r#"<data-map><db-entity name="a"><db-attribute name="n" type="VARCHAR" length="-1"/></db-entity></data-map>"#;
    assert!(format_error(dbmap_xml::load_str(bad_length).unwrap_err()).contains("non-negative integer"));
}

#[test]
fn test_structural_errors() {
    let cases = [
        ("<db-entity name=\"a\"/>", "expected root element <data-map>, found <db-entity>"),
        ("<data-map><bogus/></data-map>", "unknown element <bogus>"),
        ("<data-map><db-attribute name=\"x\"/></data-map>", "unexpected <db-attribute> inside <data-map>"),
        ("<data-map>text</data-map>", "unexpected text content"),
        ("<data-map><db-entity name=\"a\"/><db-entity name=\"a\"/></data-map>", "duplicate db entity 'a'"),
        ("<data-map project-version=\"9\"/>", "unsupported project version '9'"),
        ("<data-map><db-entity/></data-map>", "<db-entity> is missing attribute 'name'"),
        ("<data-map/><data-map/>", "content after the root element"),
    ];
    for (xml, expected) in cases {
        assert_eq!(format_error(dbmap_xml::load_str(xml).unwrap_err()), expected, "{xml}");
    }

    let truncated = dbmap_xml::load_str("<data-map><db-entity name=\"a\">");
    assert!(truncated.is_err());
}

#[test]
fn test_physical_entity_rejects_derived_attributes() {
    let xml = r#"<data-map><db-entity name="a"><db-attribute name="n" type="INTEGER" isGroupBy="true"/></db-entity></data-map>"#;
    let message = format_error(dbmap_xml::load_str(xml).unwrap_err());
    assert!(message.contains("physical entity 'a'"));
}

#[test]
fn test_dangling_reference_on_save() {
    let mut map = gallery();
    map.db_entity_mut("painting").unwrap().remove_relationship("toArtist");

    let err = dbmap_xml::save(&map, Vec::new(), &CodecConfig::default()).unwrap_err();
    match err {
        CodecError::DanglingReference {
            entity,
            relationship,
            reference,
        } => {
            assert_eq!(entity, "Painting");
            assert_eq!(relationship, "artist");
            assert_eq!(reference, DbRelationshipKey::new("painting", "artist", "toArtist"));
        }
        other => panic!("expected a dangling reference, got {other}"),
    }
}

#[test]
fn test_cyclic_parents_on_save() {
    let map = DataMap::new("loop")
        .with_db_entity(DbEntity::derived("a", "b"))
        .with_db_entity(DbEntity::derived("b", "a"));

    let err = dbmap_xml::to_string(&map).unwrap_err();
    assert!(matches!(err, CodecError::CyclicParent { entity } if entity == "a"));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery.map.xml");
    let config = CodecConfig::default();

    dbmap_xml::save_file(&gallery(), &path, &config).unwrap();
    let loaded = dbmap_xml::load_file(&path, &config).unwrap();
    assert_same_map(&gallery(), &loaded);
}

#[test]
fn test_failed_save_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery.map.xml");
    std::fs::write(&path, "previous").unwrap();

    let broken = DataMap::new("loop")
        .with_db_entity(DbEntity::derived("a", "b"))
        .with_db_entity(DbEntity::derived("b", "a"));
    assert!(dbmap_xml::save_file(&broken, &path, &CodecConfig::default()).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = dbmap_xml::load_file(dir.path().join("absent.xml"), &CodecConfig::default()).unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
}

#[test]
fn test_relationship_to_removed_entity_is_not_saved() {
    let mut map = gallery();
    map.remove_db_entity("painting");
    map.remove_db_entity("painting_totals");
    map.remove_obj_entity("Painting");
    map.obj_entity_mut("Artist").unwrap().remove_relationship("paintings");

    let err = dbmap_xml::to_string(&map).unwrap_err();
    assert_eq!(
        err.to_string(),
        "db relationship artist.paintingArray -> painting refers to unknown entity 'painting'"
    );
}

#[test]
fn test_derived_entity_without_parent_is_not_saved() {
    let mut map = gallery();
    map.remove_db_entity("painting");

    let err = dbmap_xml::to_string(&map).unwrap_err();
    assert!(matches!(
        err,
        CodecError::UnknownEntity { ref referrer, ref entity }
            if referrer == "derived entity 'painting_totals'" && entity == "painting"
    ));
}

#[test]
fn test_physical_entity_with_derived_attribute_is_not_saved() {
    let group_by = DataMap::new("m")
        .with_db_entity(DbEntity::new("t").with_attribute(DbAttribute::new("c", INTEGER).with_group_by()));
    let spec = DataMap::new("m").with_db_entity(
        DbEntity::new("t").with_attribute(DbAttribute::new("c", INTEGER).with_derived(DerivedSpec::new("COUNT(*)"))),
    );

    for map in [group_by, spec] {
        let err = dbmap_xml::to_string(&map).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DerivedOnlyAttribute { ref entity, ref attribute } if entity == "t" && attribute == "c"
        ));
    }
}

#[test]
fn test_unknown_parameter_column_is_not_saved() {
    let mut map = gallery();
    map.db_entity_mut("painting").unwrap().remove_attribute("price");

    let err = dbmap_xml::to_string(&map).unwrap_err();
    assert_eq!(
        err.to_string(),
        "attribute 'painting_totals.total' uses column 'price', which parent entity 'painting' does not have"
    );
}

#[test]
fn test_obj_relationship_to_removed_entity_is_not_saved() {
    let mut map = gallery();
    map.remove_obj_entity("Painting");

    let err = dbmap_xml::to_string(&map).unwrap_err();
    assert!(matches!(
        err,
        CodecError::UnknownEntity { ref referrer, .. } if referrer == "obj relationship 'Artist.paintings'"
    ));
}

#[test]
fn test_every_saved_map_loads() {
    let mut map = gallery();
    map.db_entity_mut("painting")
        .unwrap()
        .add_attribute(DbAttribute::new("titel_äö", VARCHAR).with_length(80));

    let xml = dbmap_xml::to_string(&map).unwrap();
    assert!(xml.contains("name=\"titel_äö\""));
    assert_same_map(&map, &dbmap_xml::load_str(&xml).unwrap());
}
