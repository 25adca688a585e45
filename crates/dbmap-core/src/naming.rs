//! Default names derived from database identifiers.

use convert_case::{Case, Casing};

/// Object entity / class name for a table, e.g. `order_line` -> `OrderLine`.
pub fn entity_name(table: &str) -> String {
    table.to_case(Case::Pascal)
}

/// Property name for a column, e.g. `artist_id` -> `artistId`.
pub fn property_name(column: &str) -> String {
    column.to_case(Case::Camel)
}

/// Class name for a table, optionally qualified with a package.
pub fn class_name(table: &str, package: Option<&str>) -> String {
    match package {
        Some(package) if !package.is_empty() => format!("{}.{}", package, entity_name(table)),
        _ => entity_name(table),
    }
}

/// Default name of a to-many relationship towards `target`.
pub fn to_many_name(target: &str) -> String {
    format!("{}Array", property_name(target))
}

/// Default name of a to-one relationship towards `target`.
pub fn to_one_name(target: &str) -> String {
    format!("to{}", entity_name(target))
}

/// Make `base` unique by appending the smallest free numeric suffix.
pub fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base}{i}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Split a qualified class name into `(package, simple name)`.
pub fn split_class_name(class_name: &str) -> (&str, &str) {
    match class_name.rfind('.') {
        Some(pos) => (&class_name[..pos], &class_name[pos + 1..]),
        None => ("", class_name),
    }
}
