//! Element and attribute names of the document format.

/// Version written to, and accepted from, `project-version`.
pub const PROJECT_VERSION: &str = "1";

pub const DATA_MAP: &str = "data-map";
pub const DB_ENTITY: &str = "db-entity";
pub const DB_ATTRIBUTE: &str = "db-attribute";
pub const DB_ATTRIBUTE_REF: &str = "db-attribute-ref";
pub const OBJ_ENTITY: &str = "obj-entity";
pub const OBJ_ATTRIBUTE: &str = "obj-attribute";
pub const DB_RELATIONSHIP: &str = "db-relationship";
pub const DB_ATTRIBUTE_PAIR: &str = "db-attribute-pair";
pub const OBJ_RELATIONSHIP: &str = "obj-relationship";
pub const DB_RELATIONSHIP_REF: &str = "db-relationship-ref";

pub const ELEMENTS: &[&str] = &[
    DATA_MAP,
    DB_ENTITY,
    DB_ATTRIBUTE,
    DB_ATTRIBUTE_REF,
    OBJ_ENTITY,
    OBJ_ATTRIBUTE,
    DB_RELATIONSHIP,
    DB_ATTRIBUTE_PAIR,
    OBJ_RELATIONSHIP,
    DB_RELATIONSHIP_REF,
];

pub const NAME: &str = "name";
pub const PROJECT_VERSION_ATTR: &str = "project-version";
pub const SCHEMA: &str = "schema";
pub const CATALOG: &str = "catalog";
pub const PARENT_NAME: &str = "parentName";
pub const TYPE: &str = "type";
pub const LENGTH: &str = "length";
pub const PRECISION: &str = "precision";
pub const IS_PRIMARY_KEY: &str = "isPrimaryKey";
pub const IS_MANDATORY: &str = "isMandatory";
pub const IS_GROUP_BY: &str = "isGroupBy";
pub const SPEC: &str = "spec";
pub const CLASS_NAME: &str = "className";
pub const SUPER_CLASS_NAME: &str = "superClassName";
pub const DB_ENTITY_NAME: &str = "dbEntityName";
pub const DB_ATTRIBUTE_NAME: &str = "db-attribute-name";
pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";
pub const TO_MANY: &str = "toMany";
pub const TO_DEPENDENT_PK: &str = "toDependentPK";

pub fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
