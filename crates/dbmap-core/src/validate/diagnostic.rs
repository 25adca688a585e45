//! Validation findings.

use std::fmt;

use serde::Serialize;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but usable.
    Warning,
    /// The map cannot be used as is.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single finding of the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Kind of the offending object, e.g. `db-attribute`.
    pub kind: &'static str,
    /// Dotted path of the offending object, e.g. `artist.id`.
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(kind: &'static str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn warning(kind: &'static str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}: {}", self.severity, self.kind, self.location, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::error("db-attribute", "artist.id", "no type");
        assert_eq!(d.to_string(), "error: db-attribute artist.id: no type");
        assert!(d.is_error());
        assert!(!Diagnostic::warning("db-entity", "artist", "x").is_error());
    }

    #[test]
    fn test_serialize() {
        let d = Diagnostic::warning("db-entity", "artist", "no primary key");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "db-entity");
        assert_eq!(json["location"], "artist");
    }
}
