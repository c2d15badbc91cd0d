//! Predicate compilation: caller filters and orders against the projected
//! column vocabulary.
//!
//! Two failure classes, deliberately different: malformed or unauthorized
//! entries (unknown column, unknown operator, wrong literal shape) drop
//! silently so invalid input is never an oracle, while predicates on
//! encrypted columns abort the whole request — the WHERE layer cannot see
//! through ciphertext and pretending otherwise would return misleading
//! results.

use rowguard_query::{FilterOp, FilterSpec, FilterValue, OrderSpec, Rejection, ScalarValue, SortDir};

use crate::projection::Projection;
use crate::sql::{ColumnRef, CompareOp, OrderItem, WhereExpr};

fn compare_token(op: FilterOp) -> Option<CompareOp> {
    match op {
        FilterOp::Eq => Some(CompareOp::Eq),
        FilterOp::Ne => Some(CompareOp::Ne),
        FilterOp::Gt => Some(CompareOp::Gt),
        FilterOp::Lt => Some(CompareOp::Lt),
        FilterOp::Ge => Some(CompareOp::Ge),
        FilterOp::Le => Some(CompareOp::Le),
        FilterOp::Like => Some(CompareOp::Like),
        FilterOp::In | FilterOp::Between | FilterOp::IsNull | FilterOp::IsNotNull => None,
    }
}

/// Extract exactly two string/number literals for membership/range
/// operators. A JSON-encoded list in a string literal is accepted for
/// wire compatibility.
fn pair_literals(value: Option<&FilterValue>) -> Option<[ScalarValue; 2]> {
    let items: Vec<ScalarValue> = match value? {
        FilterValue::List(items) => items.clone(),
        FilterValue::Scalar(ScalarValue::String(raw)) => {
            serde_json::from_str::<Vec<ScalarValue>>(raw).ok()?
        }
        FilterValue::Scalar(_) => return None,
    };
    let [low, high] = <[ScalarValue; 2]>::try_from(items).ok()?;
    if low.is_ordinal() && high.is_ordinal() {
        Some([low, high])
    } else {
        None
    }
}

/// Compile filter entries into WHERE conjuncts, in request order.
///
/// # Errors
/// Returns [`Rejection::EncryptedColumnPredicateUnsupported`] when any entry
/// names an encrypted projected column; everything else malformed is
/// dropped.
pub fn compile_filters(
    projection: &Projection,
    filters: &[FilterSpec],
) -> Result<Vec<WhereExpr>, Rejection> {
    let mut conjuncts = Vec::new();

    for spec in filters {
        let op = match FilterOp::parse(&spec.operator) {
            Ok(op) => op,
            Err(rejection) => {
                tracing::debug!(column = %spec.column, %rejection, "dropping filter entry");
                continue;
            }
        };

        let Some(column) = projection.get(&spec.column) else {
            tracing::debug!(column = %spec.column, "dropping filter on unprojected column");
            continue;
        };
        if column.encrypted.is_some() {
            return Err(Rejection::encrypted_predicate(column.meta.name.clone()));
        }
        let col = ColumnRef::target(column.meta.name.clone());

        if let Some(token) = compare_token(op) {
            match spec.value.as_ref().and_then(FilterValue::as_scalar) {
                Some(value) if !value.is_null() => {
                    conjuncts.push(WhereExpr::Compare {
                        col,
                        op: token,
                        value: value.clone(),
                    });
                }
                _ => {
                    let rejection = Rejection::InvalidFilterShape {
                        column: spec.column.clone(),
                        operator: spec.operator.clone(),
                    };
                    tracing::debug!(%rejection, "dropping filter entry");
                }
            }
            continue;
        }

        match op {
            FilterOp::In | FilterOp::Between => match pair_literals(spec.value.as_ref()) {
                Some([low, high]) => {
                    conjuncts.push(if op == FilterOp::In {
                        WhereExpr::InTwo {
                            col,
                            values: [low, high],
                        }
                    } else {
                        WhereExpr::Between { col, low, high }
                    });
                }
                None => {
                    let rejection = Rejection::InvalidFilterShape {
                        column: spec.column.clone(),
                        operator: spec.operator.clone(),
                    };
                    tracing::debug!(%rejection, "dropping filter entry");
                }
            },
            FilterOp::IsNull => conjuncts.push(WhereExpr::IsNull { col }),
            FilterOp::IsNotNull => conjuncts.push(WhereExpr::IsNotNull { col }),
            _ => {}
        }
    }

    Ok(conjuncts)
}

/// Compile order entries, in request order. Entries with an unknown column
/// or direction drop silently.
///
/// # Errors
/// Returns [`Rejection::EncryptedColumnPredicateUnsupported`] when any entry
/// names an encrypted projected column.
pub fn compile_orders(
    projection: &Projection,
    orders: &[OrderSpec],
) -> Result<Vec<OrderItem>, Rejection> {
    let mut items = Vec::new();

    for spec in orders {
        let Some(dir) = SortDir::parse(&spec.direction) else {
            tracing::debug!(column = %spec.column, direction = %spec.direction, "dropping order entry");
            continue;
        };
        let Some(column) = projection.get(&spec.column) else {
            tracing::debug!(column = %spec.column, "dropping order on unprojected column");
            continue;
        };
        if column.encrypted.is_some() {
            return Err(Rejection::encrypted_predicate(column.meta.name.clone()));
        }
        items.push(OrderItem {
            col: ColumnRef::target(column.meta.name.clone()),
            dir,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::projection::project;
    use crate::schema::ColumnMeta;
    use rowguard_catalog::{CryptoCatalog, EncryptedColumn, RowScope, TablePrivilege};

    fn projection() -> Projection {
        let live = vec![
            ColumnMeta::new("StuID", "varchar(16)").primary_key(),
            ColumnMeta::new("term", "varchar(16)"),
            ColumnMeta::new("grade", "int"),
            ColumnMeta::new("address", "varbinary(512)"),
        ];
        let privilege = TablePrivilege::read_only(RowScope::All);
        let crypto =
            CryptoCatalog::new().with_column("students", "address", EncryptedColumn::default());
        project("students", &privilege, &crypto, &live).unwrap()
    }

    #[test]
    fn scalar_comparison_binds_one_parameter() {
        let filters = [FilterSpec::new("term", "eq").with_value("Fall2024")];
        let conjuncts = compile_filters(&projection(), &filters).unwrap();
        assert_eq!(
            conjuncts,
            vec![WhereExpr::Compare {
                col: ColumnRef::target("term"),
                op: CompareOp::Eq,
                value: ScalarValue::from("Fall2024"),
            }]
        );
    }

    #[test]
    fn unprojected_column_drops_but_valid_entries_survive() {
        let filters = [
            FilterSpec::new("secret_flag", "eq").with_value("x"),
            FilterSpec::new("grade", "gte").with_value(60_i64),
        ];
        let conjuncts = compile_filters(&projection(), &filters).unwrap();
        assert_eq!(conjuncts.len(), 1);
        assert!(matches!(
            &conjuncts[0],
            WhereExpr::Compare {
                op: CompareOp::Ge,
                ..
            }
        ));
    }

    #[test]
    fn unknown_operator_drops_silently() {
        let filters = [
            FilterSpec::new("term", "regexp").with_value(".*"),
            FilterSpec::new("term", "ne").with_value("Fall2024"),
        ];
        let conjuncts = compile_filters(&projection(), &filters).unwrap();
        assert_eq!(conjuncts.len(), 1);
    }

    #[test]
    fn encrypted_column_filter_aborts() {
        let filters = [FilterSpec::new("Address", "like").with_value("%North%")];
        let err = compile_filters(&projection(), &filters).unwrap_err();
        // Canonical (schema) spelling in the rejection, not the caller's.
        assert_eq!(err, Rejection::encrypted_predicate("address"));
    }

    #[test]
    fn missing_or_null_comparison_literal_drops() {
        let filters = [
            FilterSpec::new("term", "eq"),
            FilterSpec {
                column: "term".to_owned(),
                operator: "eq".to_owned(),
                value: Some(FilterValue::Scalar(ScalarValue::Null)),
            },
        ];
        assert!(compile_filters(&projection(), &filters).unwrap().is_empty());
    }

    #[test]
    fn membership_requires_exactly_two_ordinals() {
        let bad = [
            FilterSpec::new("term", "in").with_values(["a"]),
            FilterSpec::new("term", "in").with_values(["a", "b", "c"]),
            FilterSpec {
                column: "term".to_owned(),
                operator: "in".to_owned(),
                value: Some(FilterValue::List(vec![
                    ScalarValue::Bool(true),
                    ScalarValue::from("b"),
                ])),
            },
        ];
        assert!(compile_filters(&projection(), &bad).unwrap().is_empty());

        let good = [FilterSpec::new("term", "in").with_values(["Fall2024", "Spring2025"])];
        assert_eq!(compile_filters(&projection(), &good).unwrap().len(), 1);
    }

    #[test]
    fn json_encoded_pair_string_is_accepted() {
        let filters = [FilterSpec::new("grade", "between").with_value("[60, 90]")];
        let conjuncts = compile_filters(&projection(), &filters).unwrap();
        assert!(matches!(&conjuncts[0], WhereExpr::Between { .. }));
    }

    #[test]
    fn null_tests_take_no_value() {
        let filters = [
            FilterSpec::new("grade", "is_null"),
            FilterSpec::new("grade", "is_not_null"),
        ];
        let conjuncts = compile_filters(&projection(), &filters).unwrap();
        assert_eq!(conjuncts.len(), 2);
    }

    #[test]
    fn orders_drop_bad_direction_and_unknown_column() {
        let orders = [
            OrderSpec::new("grade", "sideways"),
            OrderSpec::new("ghost", "asc"),
            OrderSpec::new("grade", "DESC"),
        ];
        let items = compile_orders(&projection(), &orders).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].dir, SortDir::Desc);
    }

    #[test]
    fn order_on_encrypted_column_aborts() {
        let orders = [OrderSpec::new("address", "asc")];
        let err = compile_orders(&projection(), &orders).unwrap_err();
        assert_eq!(err, Rejection::encrypted_predicate("address"));
    }
}
