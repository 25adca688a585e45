//! Column definitions.

use super::types;

/// A computed column of a derived entity.
///
/// `params` name columns of the parent entity; each `%@` placeholder in the
/// expression is substituted by the matching parameter, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSpec {
    /// Expression text, e.g. `SUM(%@)`.
    pub expression: String,
    /// Parent column names the expression refers to.
    pub params: Vec<String>,
}

impl DerivedSpec {
    /// Create a derived specification.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            params: Vec::new(),
        }
    }

    /// Add a parent column parameter.
    pub fn with_param(mut self, column: impl Into<String>) -> Self {
        self.params.push(column.into());
        self
    }

    /// Render the expression with parameters substituted.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.expression.len());
        let mut params = self.params.iter();
        let mut rest = self.expression.as_str();
        while let Some(pos) = rest.find("%@") {
            out.push_str(&rest[..pos]);
            match params.next() {
                Some(p) => out.push_str(p),
                None => out.push_str("%@"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// A column of a [`DbEntity`](super::DbEntity).
///
/// Equality compares the column definition; the owning entity link is
/// ignored so copies taken from another entity compare equal.
#[derive(Debug, Clone)]
pub struct DbAttribute {
    name: String,
    entity: String,
    sql_type: i32,
    mandatory: bool,
    primary_key: bool,
    max_length: Option<u32>,
    precision: Option<u32>,
    group_by: bool,
    derived: Option<DerivedSpec>,
}

impl DbAttribute {
    /// Create a nullable, non-key column.
    pub fn new(name: impl Into<String>, sql_type: i32) -> Self {
        Self {
            name: name.into(),
            entity: String::new(),
            sql_type,
            mandatory: false,
            primary_key: false,
            max_length: None,
            precision: None,
            group_by: false,
            derived: None,
        }
    }

    /// Create a column with no type set.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, types::NOT_DEFINED)
    }

    /// Mark as primary key (which also makes it mandatory).
    pub fn with_primary_key(mut self) -> Self {
        self.set_primary_key(true);
        self
    }

    /// Mark as mandatory (NOT NULL).
    pub fn with_mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Set the maximum length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Set the numeric precision.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Mark as a GROUP BY column of a derived entity.
    pub fn with_group_by(mut self) -> Self {
        self.group_by = true;
        self
    }

    /// Attach a derived specification.
    pub fn with_derived(mut self, spec: DerivedSpec) -> Self {
        self.derived = Some(spec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the entity owning this column. Empty until added to one.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub(crate) fn set_entity(&mut self, entity: &str) {
        if self.entity != entity {
            self.entity = entity.to_string();
        }
    }

    pub fn sql_type(&self) -> i32 {
        self.sql_type
    }

    pub fn set_sql_type(&mut self, sql_type: i32) {
        self.sql_type = sql_type;
    }

    /// Symbolic type name, if the code is known.
    pub fn type_name(&self) -> Option<&'static str> {
        types::type_name(self.sql_type)
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn set_mandatory(&mut self, mandatory: bool) {
        self.mandatory = mandatory;
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Set the primary-key flag. Becoming a key also forces mandatory;
    /// dropping the key leaves mandatory as it is.
    pub fn set_primary_key(&mut self, primary_key: bool) {
        self.primary_key = primary_key;
        if primary_key {
            self.mandatory = true;
        }
    }

    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    pub fn set_max_length(&mut self, length: Option<u32>) {
        self.max_length = length;
    }

    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub fn set_precision(&mut self, precision: Option<u32>) {
        self.precision = precision;
    }

    pub fn is_group_by(&self) -> bool {
        self.group_by
    }

    pub fn set_group_by(&mut self, group_by: bool) {
        self.group_by = group_by;
    }

    pub fn derived(&self) -> Option<&DerivedSpec> {
        self.derived.as_ref()
    }

    pub fn set_derived(&mut self, spec: Option<DerivedSpec>) {
        self.derived = spec;
    }
}

impl PartialEq for DbAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.sql_type == other.sql_type
            && self.mandatory == other.mandatory
            && self.primary_key == other.primary_key
            && self.max_length == other.max_length
            && self.precision == other.precision
            && self.group_by == other.group_by
            && self.derived == other.derived
    }
}

impl Eq for DbAttribute {}
