//! Core error types.

use thiserror::Error;

/// Error reported by a catalog introspection collaborator.
pub type IntrospectionError = Box<dyn std::error::Error + Send + Sync>;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Catalog introspection failed; the import was aborted.
    #[error("catalog introspection failed in {operation}: {source}")]
    CatalogIntrospection {
        /// The introspection call that failed.
        operation: &'static str,
        /// Underlying cause.
        #[source]
        source: IntrospectionError,
    },

    /// An operation was applied to a model that does not support it.
    #[error("model integrity violation: {0}")]
    Integrity(#[from] IntegrityError),
}

impl Error {
    /// Wrap an introspection failure.
    pub fn introspection(operation: &'static str, source: IntrospectionError) -> Self {
        Error::CatalogIntrospection { operation, source }
    }
}

/// Model integrity violations, signaled to the caller immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A to-one-only operation was called on a to-many relationship.
    #[error("{operation} requires a to-one relationship, but '{relationship}' is to-many")]
    ToManyRelationship {
        /// Relationship name.
        relationship: String,
        /// Operation name.
        operation: &'static str,
    },

    /// A snapshot has some, but not all, join columns.
    #[error("snapshot for relationship '{relationship}' is missing join columns {missing:?}")]
    PartialJoinSnapshot {
        /// Relationship name.
        relationship: String,
        /// Columns that were absent.
        missing: Vec<String>,
    },

    /// Catalog/schema cannot be set on a derived entity.
    #[error("derived entity '{entity}' takes its catalog and schema from its parent")]
    DerivedTableIdentity {
        /// Entity name.
        entity: String,
    },

    /// A derived-only operation was called on a physical entity.
    #[error("entity '{entity}' is not a derived entity")]
    NotDerived {
        /// Entity name.
        entity: String,
    },

    /// A derived entity was reset against the wrong parent.
    #[error("derived entity '{entity}' has parent '{expected}', not '{found}'")]
    ParentMismatch {
        /// Entity name.
        entity: String,
        /// Declared parent.
        expected: String,
        /// Parent supplied.
        found: String,
    },

    /// The parent of a derived entity could not be found.
    #[error("parent '{parent}' of derived entity '{entity}' not found")]
    UnknownParent {
        /// Entity name.
        entity: String,
        /// Missing parent name.
        parent: String,
    },

    /// A derived entity's parent chain loops.
    #[error("derived entity '{entity}' has a cyclic parent chain")]
    CyclicParent {
        /// Entity name.
        entity: String,
    },

    /// Unknown database entity.
    #[error("unknown db entity '{0}'")]
    UnknownDbEntity(String),

    /// Unknown database relationship.
    #[error("unknown db relationship '{0}'")]
    UnknownDbRelationship(String),

    /// A name is already used within an entity.
    #[error("entity '{entity}' already has a member named '{name}'")]
    DuplicateName {
        /// Entity name.
        entity: String,
        /// Conflicting name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspection_error_keeps_source() {
        let cause: IntrospectionError = "connection reset".into();
        let err = Error::introspection("list_columns", cause);
        assert_eq!(
            err.to_string(),
            "catalog introspection failed in list_columns: connection reset"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_integrity_conversion() {
        let err: Error = IntegrityError::UnknownDbEntity("artist".into()).into();
        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(
            err.to_string(),
            "model integrity violation: unknown db entity 'artist'"
        );
    }
}
