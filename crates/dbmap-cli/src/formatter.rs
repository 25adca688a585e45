//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use dbmap_core::{Diagnostic, Entity};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One row of an entity listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRow {
    pub kind: &'static str,
    pub name: String,
    /// Table, parent entity or mapped db entity.
    pub mapping: String,
    pub attributes: usize,
    pub relationships: usize,
}

impl EntityRow {
    pub fn new(entity: Entity<'_>, mapping: impl Into<String>) -> Self {
        Self {
            kind: entity.kind_label(),
            name: entity.name().to_string(),
            mapping: mapping.into(),
            attributes: entity.attribute_count(),
            relationships: entity.relationship_count(),
        }
    }
}

/// One class of a generation listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRow {
    pub entity: String,
    pub class_name: String,
    pub role: &'static str,
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format an entity listing.
    fn format_entities(&self, map_name: &str, rows: &[EntityRow]) -> String;

    /// Format validation findings.
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String;

    /// Format a class listing; `skipped` names entities without classes.
    fn format_classes(&self, rows: &[ClassRow], skipped: &[String]) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_entities(&self, map_name: &str, rows: &[EntityRow]) -> String {
        if rows.is_empty() {
            return format!("Map '{}' is empty", map_name);
        }

        let mut table = Table::new();
        table.set_header(vec!["Kind", "Name", "Mapping", "Attributes", "Relationships"]);
        for row in rows {
            table.add_row(vec![
                Cell::new(row.kind),
                Cell::new(&row.name),
                Cell::new(&row.mapping),
                Cell::new(row.attributes),
                Cell::new(row.relationships),
            ]);
        }
        format!("Map '{}'\n{}", map_name, table)
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        if diagnostics.is_empty() {
            return "No problems found".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Severity", "Kind", "Location", "Message"]);
        for diagnostic in diagnostics {
            table.add_row(vec![
                Cell::new(diagnostic.severity),
                Cell::new(diagnostic.kind),
                Cell::new(&diagnostic.location),
                Cell::new(&diagnostic.message),
            ]);
        }

        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        format!(
            "{}\n{} error(s), {} warning(s)",
            table,
            errors,
            diagnostics.len() - errors
        )
    }

    fn format_classes(&self, rows: &[ClassRow], skipped: &[String]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Entity", "Class", "Role"]);
        for row in rows {
            table.add_row(vec![
                Cell::new(&row.entity),
                Cell::new(&row.class_name),
                Cell::new(row.role),
            ]);
        }

        let mut output = table.to_string();
        if !skipped.is_empty() {
            output.push_str(&format!("\nSkipped: {}", skipped.join(", ")));
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_entities(&self, map_name: &str, rows: &[EntityRow]) -> String {
        let entities: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "kind": row.kind,
                    "name": row.name,
                    "mapping": row.mapping,
                    "attributes": row.attributes,
                    "relationships": row.relationships,
                })
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "map": map_name,
            "entities": entities,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        serde_json::to_string_pretty(diagnostics).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_classes(&self, rows: &[ClassRow], skipped: &[String]) -> String {
        let classes: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "entity": row.entity,
                    "class": row.class_name,
                    "role": row.role,
                })
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "classes": classes,
            "skipped": skipped,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({
            "message": message
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbmap_core::Severity;

    fn diagnostics() -> Vec<Diagnostic> {
        vec![
            Diagnostic::error("db-attribute", "artist.id", "attribute has no type"),
            Diagnostic::warning("db-entity", "artist", "no primary key attributes"),
        ]
    }

    #[test]
    fn test_table_diagnostics_summary() {
        let output = TableFormatter.format_diagnostics(&diagnostics());
        assert!(output.contains("artist.id"));
        assert!(output.ends_with("1 error(s), 1 warning(s)"));
        assert_eq!(TableFormatter.format_diagnostics(&[]), "No problems found");
    }

    #[test]
    fn test_json_diagnostics() {
        let output = JsonFormatter.format_diagnostics(&diagnostics());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["severity"], "error");
        assert_eq!(value[1]["location"], "artist");
        assert_eq!(diagnostics()[1].severity, Severity::Warning);
    }

    #[test]
    fn test_entities() {
        let rows = vec![EntityRow {
            kind: "db-entity",
            name: "artist".to_string(),
            mapping: "art.artist".to_string(),
            attributes: 2,
            relationships: 1,
        }];

        let table = TableFormatter.format_entities("gallery", &rows);
        assert!(table.starts_with("Map 'gallery'\n"));
        assert!(table.contains("art.artist"));
        assert_eq!(TableFormatter.format_entities("empty", &[]), "Map 'empty' is empty");

        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_entities("gallery", &rows)).unwrap();
        assert_eq!(json["map"], "gallery");
        assert_eq!(json["entities"][0]["attributes"], 2);
    }

    #[test]
    fn test_classes_with_skipped() {
        let rows = vec![ClassRow {
            entity: "Artist".to_string(),
            class_name: "org.gallery.Artist".to_string(),
            role: "single",
        }];
        let output = TableFormatter.format_classes(&rows, &["Blank".to_string()]);
        assert!(output.contains("org.gallery.Artist"));
        assert!(output.ends_with("Skipped: Blank"));
    }
}
