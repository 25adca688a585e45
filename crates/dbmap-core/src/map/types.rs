//! SQL type codes and their symbolic names.
//!
//! Codes follow the JDBC numbering, which is what most catalog drivers
//! report. The symbolic names are the ones used by the persisted map format.

/// Marker for an attribute whose type has not been set.
pub const NOT_DEFINED: i32 = i32::MAX;

pub const ARRAY: i32 = 2003;
pub const BIGINT: i32 = -5;
pub const BINARY: i32 = -2;
pub const BIT: i32 = -7;
pub const BLOB: i32 = 2004;
pub const BOOLEAN: i32 = 16;
pub const CHAR: i32 = 1;
pub const CLOB: i32 = 2005;
pub const DATE: i32 = 91;
pub const DECIMAL: i32 = 3;
pub const DOUBLE: i32 = 8;
pub const FLOAT: i32 = 6;
pub const INTEGER: i32 = 4;
pub const LONGVARBINARY: i32 = -4;
pub const LONGVARCHAR: i32 = -1;
pub const NCHAR: i32 = -15;
pub const NUMERIC: i32 = 2;
pub const NVARCHAR: i32 = -9;
pub const OTHER: i32 = 1111;
pub const REAL: i32 = 7;
pub const SMALLINT: i32 = 5;
pub const TIME: i32 = 92;
pub const TIMESTAMP: i32 = 93;
pub const TINYINT: i32 = -6;
pub const VARBINARY: i32 = -3;
pub const VARCHAR: i32 = 12;

const NAMES: &[(i32, &str)] = &[
    (ARRAY, "ARRAY"),
    (BIGINT, "BIGINT"),
    (BINARY, "BINARY"),
    (BIT, "BIT"),
    (BLOB, "BLOB"),
    (BOOLEAN, "BOOLEAN"),
    (CHAR, "CHAR"),
    (CLOB, "CLOB"),
    (DATE, "DATE"),
    (DECIMAL, "DECIMAL"),
    (DOUBLE, "DOUBLE"),
    (FLOAT, "FLOAT"),
    (INTEGER, "INTEGER"),
    (LONGVARBINARY, "LONGVARBINARY"),
    (LONGVARCHAR, "LONGVARCHAR"),
    (NCHAR, "NCHAR"),
    (NUMERIC, "NUMERIC"),
    (NVARCHAR, "NVARCHAR"),
    (OTHER, "OTHER"),
    (REAL, "REAL"),
    (SMALLINT, "SMALLINT"),
    (TIME, "TIME"),
    (TIMESTAMP, "TIMESTAMP"),
    (TINYINT, "TINYINT"),
    (VARBINARY, "VARBINARY"),
    (VARCHAR, "VARCHAR"),
];

/// Get the symbolic name of a type code.
pub fn type_name(code: i32) -> Option<&'static str> {
    NAMES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

/// Get the type code for a symbolic name (case-insensitive).
pub fn type_code(name: &str) -> Option<i32> {
    NAMES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(c, _)| *c)
}

/// Check if a code is one of the known types.
pub fn is_known(code: i32) -> bool {
    type_name(code).is_some()
}

/// Check if this type stores character data and normally carries a length.
pub fn is_character(code: i32) -> bool {
    matches!(code, CHAR | VARCHAR | NCHAR | NVARCHAR)
}

/// Check if this type is numeric.
pub fn is_numeric(code: i32) -> bool {
    matches!(
        code,
        BIGINT | BIT | DECIMAL | DOUBLE | FLOAT | INTEGER | NUMERIC | REAL | SMALLINT | TINYINT
    )
}

/// Logical (object-side) type name for a SQL type.
pub fn logical_type_name(code: i32) -> &'static str {
    match code {
        CHAR | VARCHAR | LONGVARCHAR | CLOB | NCHAR | NVARCHAR => "String",
        BIT | BOOLEAN => "bool",
        TINYINT => "i8",
        SMALLINT => "i16",
        INTEGER => "i32",
        BIGINT => "i64",
        REAL => "f32",
        FLOAT | DOUBLE => "f64",
        DECIMAL | NUMERIC => "Decimal",
        DATE => "Date",
        TIME => "Time",
        TIMESTAMP => "Timestamp",
        BINARY | VARBINARY | LONGVARBINARY | BLOB => "Vec<u8>",
        _ => "Value",
    }
}
