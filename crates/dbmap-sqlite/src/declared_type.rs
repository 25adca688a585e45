//! Mapping of SQLite declared column types to SQL type codes.

use dbmap_core::types::{self, BIGINT, BLOB, BOOLEAN, CHAR, DOUBLE, INTEGER, LONGVARCHAR, NUMERIC, TIMESTAMP, VARCHAR};

/// A parsed column declaration such as `DECIMAL(10, 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredType {
    pub sql_type: i32,
    pub size: Option<u32>,
    pub decimal_digits: Option<u32>,
}

/// Parse a declared type.
///
/// Known type names map directly. Anything else falls back to SQLite's
/// column affinity rules, so every declaration gets some type.
pub fn parse_declared_type(declared: &str) -> DeclaredType {
    let declared = declared.trim();
    let (base, args) = match declared.split_once('(') {
        Some((base, rest)) => (base.trim(), rest.trim_end().trim_end_matches(')')),
        None => (declared, ""),
    };

    let mut numbers = args.split(',').map(|arg| arg.trim().parse::<u32>().ok());
    let size = numbers.next().flatten();
    let decimal_digits = numbers.next().flatten();

    DeclaredType {
        sql_type: sql_type_of(base, size.is_some()),
        size,
        decimal_digits,
    }
}

fn sql_type_of(base: &str, sized: bool) -> i32 {
    let upper = base.to_ascii_uppercase();
    if let Some(code) = types::type_code(&upper) {
        return code;
    }

    match upper.as_str() {
        "INT" | "INT4" | "MEDIUMINT" => return INTEGER,
        "INT8" | "UNSIGNED BIG INT" => return BIGINT,
        "BOOL" => return BOOLEAN,
        "DATETIME" => return TIMESTAMP,
        "DOUBLE PRECISION" => return DOUBLE,
        "CHARACTER" | "NATIVE CHARACTER" => return CHAR,
        _ => {}
    }

    // Affinity rules, in SQLite's order of precedence.
    if upper.contains("INT") {
        INTEGER
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        if sized {
            VARCHAR
        } else {
            LONGVARCHAR
        }
    } else if upper.is_empty() || upper.contains("BLOB") {
        BLOB
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        DOUBLE
    } else {
        NUMERIC
    }
}
