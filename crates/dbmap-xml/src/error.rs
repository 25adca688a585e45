//! Codec errors.

use dbmap_core::DbRelationshipKey;
use thiserror::Error;

/// A malformed or inconsistent document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {position})")]
pub struct FormatError {
    pub message: String,
    /// Byte offset of the offending element.
    pub position: usize,
    /// Optional hint for fixing the document.
    pub hint: Option<String>,
}

impl FormatError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
            hint: None,
        }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Format the error with the offending source line.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.position);
        let mut result = format!("error: {}\n", self.message);
        result.push_str(&format!("  --> line {}:{}\n", line, col));

        if let Some(source_line) = source.lines().nth(line - 1) {
            result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
            for _ in 0..col {
                result.push(' ');
            }
            result.push_str("^\n");
        }

        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }
        result
    }
}

/// Convert a byte offset to a 1-based line and column.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Errors of loading or saving a map.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document is malformed or refers to something that does not exist.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// An object relationship refers to a database relationship that is not
    /// part of the map being saved.
    #[error("obj relationship '{entity}.{relationship}' refers to db relationship {reference}, which is not being saved")]
    DanglingReference {
        entity: String,
        relationship: String,
        reference: DbRelationshipKey,
    },

    /// Derived entities whose parents form a loop cannot be ordered.
    #[error("derived entity '{entity}' has a cyclic parent chain")]
    CyclicParent { entity: String },

    /// A parent or relationship target that neither the map nor its
    /// dependencies contain.
    #[error("{referrer} refers to unknown entity '{entity}'")]
    UnknownEntity { referrer: String, entity: String },

    /// `isGroupBy` or a derived expression on an attribute of a physical entity.
    #[error("attribute '{entity}.{attribute}' is derived but '{entity}' is a physical entity")]
    DerivedOnlyAttribute { entity: String, attribute: String },

    /// A derived expression parameter missing from the parent entity.
    #[error("attribute '{entity}.{attribute}' uses column '{column}', which parent entity '{parent}' does not have")]
    UnknownParameter {
        entity: String,
        attribute: String,
        column: String,
        parent: String,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Render the error, with source context for format errors.
    pub fn format_with_source(&self, source: &str) -> String {
        match self {
            CodecError::Format(err) => err.format_with_source(source),
            other => format!("error: {}\n", other),
        }
    }
}
