//! Projection of row snapshots across to-one relationships.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::IntegrityError;
use crate::map::DbRelationship;

/// Column values of a single row, keyed by column name.
///
/// A missing key and a `Value::Null` both mean "no value".
pub type Snapshot = BTreeMap<String, Value>;

fn present<'s>(snapshot: &'s Snapshot, column: &str) -> Option<&'s Value> {
    snapshot.get(column).filter(|v| !v.is_null())
}

impl DbRelationship {
    fn require_to_one(&self, operation: &'static str) -> Result<(), IntegrityError> {
        if self.is_to_many() {
            return Err(IntegrityError::ToManyRelationship {
                relationship: self.key().to_string(),
                operation,
            });
        }
        Ok(())
    }

    /// Project a source row onto the primary key of the related target row.
    ///
    /// Returns `Ok(None)` when none of the joined source columns has a
    /// value (there is no related row). A row with only some of them set is
    /// inconsistent and reported as an error.
    pub fn target_pk_snapshot_with_src_snapshot(
        &self,
        src: &Snapshot,
    ) -> Result<Option<Snapshot>, IntegrityError> {
        self.require_to_one("target_pk_snapshot_with_src_snapshot")?;

        let mut target = Snapshot::new();
        let mut missing = Vec::new();
        for join in self.joins() {
            match present(src, &join.source) {
                Some(value) => {
                    target.insert(join.target.clone(), value.clone());
                }
                None => missing.push(join.source.clone()),
            }
        }

        if target.is_empty() {
            return Ok(None);
        }
        if !missing.is_empty() {
            return Err(IntegrityError::PartialJoinSnapshot {
                relationship: self.key().to_string(),
                missing,
            });
        }
        Ok(Some(target))
    }

    /// Project a target row onto the foreign-key columns of the source.
    ///
    /// Target columns without a value become `Null` in the result.
    pub fn src_fk_snapshot_with_target_snapshot(
        &self,
        target: &Snapshot,
    ) -> Result<Snapshot, IntegrityError> {
        self.require_to_one("src_fk_snapshot_with_target_snapshot")?;

        Ok(self
            .joins()
            .iter()
            .map(|join| {
                let value = present(target, &join.target).cloned().unwrap_or(Value::Null);
                (join.source.clone(), value)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(pairs: &[(&str, Value)]) -> Snapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn to_order() -> DbRelationship {
        DbRelationship::new("toOrders", "orders")
            .with_join("order_shop", "shop")
            .with_join("order_num", "num")
    }

    #[test]
    fn test_target_pk_projection() {
        let src = snapshot(&[
            ("order_shop", json!(3)),
            ("order_num", json!(1042)),
            ("pos", json!(1)),
        ]);
        let pk = to_order().target_pk_snapshot_with_src_snapshot(&src).unwrap();
        assert_eq!(pk, Some(snapshot(&[("shop", json!(3)), ("num", json!(1042))])));
    }

    #[test]
    fn test_no_related_row() {
        let rel = to_order();
        assert_eq!(rel.target_pk_snapshot_with_src_snapshot(&Snapshot::new()), Ok(None));

        let nulls = snapshot(&[("order_shop", Value::Null), ("order_num", Value::Null)]);
        assert_eq!(rel.target_pk_snapshot_with_src_snapshot(&nulls), Ok(None));
    }

    #[test]
    fn test_partial_snapshot_is_an_error() {
        let src = snapshot(&[("order_shop", json!(3)), ("order_num", Value::Null)]);
        let err = to_order().target_pk_snapshot_with_src_snapshot(&src).unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::PartialJoinSnapshot { ref missing, .. } if missing == &["order_num".to_string()]
        ));
    }

    #[test]
    fn test_to_many_is_rejected() {
        let rel = DbRelationship::new("lineArray", "line")
            .with_join("num", "order_num")
            .with_to_many(true);
        assert!(matches!(
            rel.target_pk_snapshot_with_src_snapshot(&Snapshot::new()),
            Err(IntegrityError::ToManyRelationship { .. })
        ));
        assert!(matches!(
            rel.src_fk_snapshot_with_target_snapshot(&Snapshot::new()),
            Err(IntegrityError::ToManyRelationship { .. })
        ));
    }

    #[test]
    fn test_src_fk_projection() {
        let target = snapshot(&[("shop", json!(3)), ("name", json!("north"))]);
        let fk = to_order().src_fk_snapshot_with_target_snapshot(&target).unwrap();
        assert_eq!(
            fk,
            snapshot(&[("order_shop", json!(3)), ("order_num", Value::Null)])
        );
    }
}
