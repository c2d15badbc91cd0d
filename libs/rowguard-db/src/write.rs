//! Write-path validation: everything checked before a write statement may
//! be assembled. All checks fail closed and run before any SQL exists.

use rowguard_catalog::{CryptoCatalog, TablePrivilege};
use rowguard_query::{ColumnValues, Rejection, ScalarValue, WriteOp};

use crate::schema::ColumnMeta;
use crate::sql::{Assignment, ColumnRef, WhereExpr};

/// Reject write shapes the privilege catalog disables outright: delete
/// without the delete flag, update/insert with an empty configured set.
///
/// # Errors
/// Returns [`Rejection::WriteNotPermitted`].
pub fn check_write_permitted(
    privilege: &TablePrivilege,
    op: WriteOp,
    table: &str,
) -> Result<(), Rejection> {
    let permitted = match op {
        WriteOp::Insert => !privilege.insertable.is_empty(),
        WriteOp::Update => !privilege.updatable.is_empty(),
        WriteOp::Delete => privilege.deletable,
    };
    if permitted {
        Ok(())
    } else {
        Err(Rejection::WriteNotPermitted {
            table: table.to_owned(),
            op,
        })
    }
}

/// Require the caller's key map to contain every primary-key column the
/// schema declares, and build the equality conditions in schema order.
/// A schema with no primary key cannot target a row at all.
///
/// # Errors
/// Returns [`Rejection::IncompletePrimaryKey`] naming the first missing
/// column.
pub fn primary_key_conditions(
    live: &[ColumnMeta],
    key: &ColumnValues,
) -> Result<Vec<WhereExpr>, Rejection> {
    let mut conditions = Vec::new();
    for meta in live.iter().filter(|m| m.is_primary_key) {
        let Some(value) = key.get(&meta.name) else {
            return Err(Rejection::IncompletePrimaryKey {
                column: meta.name.clone(),
            });
        };
        conditions.push(WhereExpr::eq(
            ColumnRef::target(meta.name.clone()),
            value.clone(),
        ));
    }
    if conditions.is_empty() {
        return Err(Rejection::IncompletePrimaryKey {
            column: "(no primary key declared)".to_owned(),
        });
    }
    Ok(conditions)
}

/// Require every updated column to be in the role's updatable set; an empty
/// payload or any extra column rejects the whole write.
///
/// # Errors
/// Returns [`Rejection::ColumnSetMismatch`].
pub fn check_updatable(
    privilege: &TablePrivilege,
    table: &str,
    values: &ColumnValues,
) -> Result<(), Rejection> {
    if values.is_empty() || values.keys().any(|c| !privilege.updatable.contains(c)) {
        return Err(Rejection::ColumnSetMismatch {
            table: table.to_owned(),
            op: WriteOp::Update,
        });
    }
    Ok(())
}

/// Require the insert payload's key set to equal the configured insertable
/// set exactly — a subset or superset is rejected, never partially applied.
///
/// # Errors
/// Returns [`Rejection::ColumnSetMismatch`].
pub fn check_insertable(
    privilege: &TablePrivilege,
    table: &str,
    values: &ColumnValues,
) -> Result<(), Rejection> {
    let payload: std::collections::BTreeSet<&str> = values.keys().map(String::as_str).collect();
    let configured: std::collections::BTreeSet<&str> =
        privilege.insertable.iter().map(String::as_str).collect();
    if payload != configured {
        return Err(Rejection::ColumnSetMismatch {
            table: table.to_owned(),
            op: WriteOp::Insert,
        });
    }
    Ok(())
}

/// True when any payload column is stored encrypted (and therefore needs
/// key material to compile).
#[must_use]
pub fn touches_encrypted(encrypted: &CryptoCatalog, table: &str, values: &ColumnValues) -> bool {
    values.keys().any(|c| encrypted.is_encrypted(table, c))
}

/// Build the assignment list for an already-validated payload, wrapping
/// encrypted columns. Columns are canonicalized against the live schema;
/// a payload column the schema does not know is a catalog/schema mismatch
/// and fails closed.
///
/// # Errors
/// Returns [`Rejection::ColumnSetMismatch`] when a payload column is absent
/// from the live schema.
pub fn build_assignments(
    encrypted: &CryptoCatalog,
    table: &str,
    op: WriteOp,
    values: &ColumnValues,
    live: &[ColumnMeta],
    key: Option<&ScalarValue>,
) -> Result<Vec<Assignment>, Rejection> {
    let mut assignments = Vec::with_capacity(values.len());
    for (column, value) in values {
        let Some(meta) = live.iter().find(|m| m.name.eq_ignore_ascii_case(column)) else {
            tracing::debug!(table, column, "payload column absent from live schema");
            return Err(Rejection::ColumnSetMismatch {
                table: table.to_owned(),
                op,
            });
        };
        if encrypted.is_encrypted(table, &meta.name) {
            assignments.push(Assignment::Encrypt {
                column: meta.name.clone(),
                value: value.clone(),
                key: key.cloned().unwrap_or(ScalarValue::Null),
            });
        } else {
            assignments.push(Assignment::Plain {
                column: meta.name.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rowguard_catalog::{EncryptedColumn, RowScope};

    fn officer_privilege() -> TablePrivilege {
        TablePrivilege::read_only(RowScope::All)
            .with_insertable(["StuID", "CID", "term", "grade", "comments"])
            .with_updatable(["grade", "term", "comments"])
            .with_deletable()
    }

    fn values(pairs: &[(&str, &str)]) -> ColumnValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), ScalarValue::from(*v)))
            .collect()
    }

    #[test]
    fn disabled_write_shapes_are_rejected() {
        let read_only = TablePrivilege::read_only(RowScope::All);
        for op in [WriteOp::Insert, WriteOp::Update, WriteOp::Delete] {
            let err = check_write_permitted(&read_only, op, "grades").unwrap_err();
            assert_eq!(
                err,
                Rejection::WriteNotPermitted {
                    table: "grades".to_owned(),
                    op,
                }
            );
        }
        for op in [WriteOp::Insert, WriteOp::Update, WriteOp::Delete] {
            assert!(check_write_permitted(&officer_privilege(), op, "grades").is_ok());
        }
    }

    #[test]
    fn primary_key_must_be_complete() {
        let live = vec![
            ColumnMeta::new("GradeID", "int").primary_key(),
            ColumnMeta::new("term", "varchar(16)"),
        ];
        let err = primary_key_conditions(&live, &values(&[("term", "x")])).unwrap_err();
        assert_eq!(
            err,
            Rejection::IncompletePrimaryKey {
                column: "GradeID".to_owned()
            }
        );

        let conditions = primary_key_conditions(&live, &values(&[("GradeID", "7")])).unwrap();
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn composite_keys_bind_every_declared_column() {
        let live = vec![
            ColumnMeta::new("StuID", "varchar(16)").primary_key(),
            ColumnMeta::new("CID", "varchar(16)").primary_key(),
            ColumnMeta::new("term", "varchar(16)"),
        ];
        let err = primary_key_conditions(&live, &values(&[("StuID", "100")])).unwrap_err();
        assert_eq!(
            err,
            Rejection::IncompletePrimaryKey {
                column: "CID".to_owned()
            }
        );
        let conditions =
            primary_key_conditions(&live, &values(&[("StuID", "100"), ("CID", "C1")])).unwrap();
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn schema_without_primary_key_cannot_target_rows() {
        let live = vec![ColumnMeta::new("note", "text")];
        assert!(primary_key_conditions(&live, &values(&[("note", "x")])).is_err());
    }

    #[test]
    fn update_payload_must_stay_inside_the_updatable_set() {
        let privilege = officer_privilege();
        assert!(check_updatable(&privilege, "grades", &values(&[("grade", "A")])).is_ok());
        assert!(check_updatable(&privilege, "grades", &ColumnValues::new()).is_err());
        let err =
            check_updatable(&privilege, "grades", &values(&[("grade", "A"), ("StuID", "1")]))
                .unwrap_err();
        assert_eq!(
            err,
            Rejection::ColumnSetMismatch {
                table: "grades".to_owned(),
                op: WriteOp::Update,
            }
        );
    }

    #[test]
    fn insert_requires_exact_set_equality() {
        let privilege = officer_privilege();
        let full = values(&[
            ("StuID", "100"),
            ("CID", "C1"),
            ("term", "Fall2024"),
            ("grade", "A"),
            ("comments", "ok"),
        ]);
        assert!(check_insertable(&privilege, "grades", &full).is_ok());

        // Strict subset.
        let subset = values(&[("StuID", "100"), ("CID", "C1"), ("term", "Fall2024")]);
        assert!(check_insertable(&privilege, "grades", &subset).is_err());

        // Strict superset.
        let mut superset = full;
        superset.insert("GradeID".to_owned(), ScalarValue::from("9"));
        assert!(check_insertable(&privilege, "grades", &superset).is_err());
    }

    #[test]
    fn assignments_wrap_encrypted_columns_and_canonicalize_names() {
        let crypto =
            CryptoCatalog::new().with_column("students", "address", EncryptedColumn::default());
        let live = vec![
            ColumnMeta::new("address", "varbinary(512)"),
            ColumnMeta::new("phone", "varchar(32)"),
        ];
        let key = ScalarValue::from("k1");
        let assignments = build_assignments(
            &crypto,
            "students",
            WriteOp::Update,
            &values(&[("ADDRESS", "12 North St"), ("phone", "555-0100")]),
            &live,
            Some(&key),
        )
        .unwrap();
        assert_eq!(
            assignments,
            vec![
                Assignment::Encrypt {
                    column: "address".to_owned(),
                    value: ScalarValue::from("12 North St"),
                    key: ScalarValue::from("k1"),
                },
                Assignment::Plain {
                    column: "phone".to_owned(),
                    value: ScalarValue::from("555-0100"),
                },
            ]
        );
    }

    #[test]
    fn payload_column_missing_from_schema_fails_closed() {
        let live = vec![ColumnMeta::new("phone", "varchar(32)")];
        let err = build_assignments(
            &CryptoCatalog::new(),
            "students",
            WriteOp::Update,
            &values(&[("dropped_col", "x")]),
            &live,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Rejection::ColumnSetMismatch { .. }));
    }
}
