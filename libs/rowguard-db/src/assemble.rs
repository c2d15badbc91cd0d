//! Statement assembly: composes projection, row scope, predicates and
//! catalog enrichment into one of the four statement shapes, in the fixed
//! clause order, and renders it.

use rowguard_catalog::FkCatalog;
use rowguard_query::ScalarValue;

use crate::projection::Projection;
use crate::scope::RangeFilter;
use crate::sql::{
    Assignment, ColumnRef, CompiledStatement, DeleteStatement, InsertStatement, JoinClause,
    JoinKind, OrderItem, SelectItem, SelectStatement, UpdateStatement, WhereExpr,
};

/// Assemble and render a SELECT.
///
/// Each projected column renders as a plain reference, a decrypt-and-cast
/// expression, or — for foreign-key columns — the raw id plus a joined
/// display column. Join aliases are `j1…jn` in projected-column order, so a
/// table with several foreign keys never collides. `decrypt_key` must be
/// present when the projection holds encrypted columns; without it the
/// decrypt expression binds a null key and yields NULL rather than
/// ciphertext.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn assemble_select(
    table: &str,
    projection: &Projection,
    foreign_keys: &FkCatalog,
    range: RangeFilter,
    predicates: Vec<WhereExpr>,
    order_by: Vec<OrderItem>,
    limit: u64,
    offset: u64,
    decrypt_key: Option<&ScalarValue>,
) -> CompiledStatement {
    let mut items = Vec::new();
    let mut fk_joins = Vec::new();

    for column in projection.columns() {
        let name = &column.meta.name;
        if let Some(link) = foreign_keys.link(table, name) {
            let alias = format!("j{}", fk_joins.len() + 1);
            items.push(SelectItem::Column {
                col: ColumnRef::target(name.clone()),
                alias: name.clone(),
            });
            fk_joins.push(JoinClause {
                kind: JoinKind::Left,
                table: link.target_table.clone(),
                alias: alias.clone(),
                left: ColumnRef::target(name.clone()),
                right: ColumnRef::new(alias.clone(), link.target_key.clone()),
            });
            items.push(SelectItem::Display {
                sql: link.render_display(&alias),
                alias: link.display_alias.clone(),
            });
        } else if let Some(spec) = &column.encrypted {
            items.push(SelectItem::Decrypt {
                col: ColumnRef::target(name.clone()),
                cast: spec.cast.sql_name(),
                key: decrypt_key.cloned().unwrap_or(ScalarValue::Null),
                alias: name.clone(),
            });
        } else {
            items.push(SelectItem::Column {
                col: ColumnRef::target(name.clone()),
                alias: name.clone(),
            });
        }
    }

    let mut joins = range.joins;
    joins.extend(fk_joins);

    let mut conjuncts = Vec::with_capacity(predicates.len() + 1);
    conjuncts.extend(range.condition);
    conjuncts.extend(predicates);

    SelectStatement {
        table: table.to_owned(),
        items,
        joins,
        conjuncts,
        order_by,
        limit,
        offset,
    }
    .render()
}

/// Assemble and render an UPDATE: SET list, then primary-key equality, then
/// the range fragment.
#[must_use]
pub fn assemble_update(
    table: &str,
    set: Vec<Assignment>,
    key_conditions: Vec<WhereExpr>,
    range: RangeFilter,
) -> CompiledStatement {
    let mut conjuncts = key_conditions;
    conjuncts.extend(range.condition);
    UpdateStatement {
        table: table.to_owned(),
        joins: range.joins,
        set,
        conjuncts,
    }
    .render()
}

/// Assemble and render a DELETE: same WHERE construction as UPDATE, no SET.
#[must_use]
pub fn assemble_delete(
    table: &str,
    key_conditions: Vec<WhereExpr>,
    range: RangeFilter,
) -> CompiledStatement {
    let mut conjuncts = key_conditions;
    conjuncts.extend(range.condition);
    DeleteStatement {
        table: table.to_owned(),
        joins: range.joins,
        conjuncts,
    }
    .render()
}

/// Assemble and render an INSERT from an already-validated assignment list.
#[must_use]
pub fn assemble_insert(table: &str, values: Vec<Assignment>) -> CompiledStatement {
    InsertStatement {
        table: table.to_owned(),
        values,
    }
    .render()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::projection::project;
    use crate::schema::ColumnMeta;
    use rowguard_catalog::{CryptoCatalog, FkLink, RowScope, TablePrivilege};

    fn grades_projection() -> Projection {
        let live = vec![
            ColumnMeta::new("GradeID", "int").primary_key(),
            ColumnMeta::new("StuID", "varchar(16)"),
            ColumnMeta::new("CID", "varchar(16)"),
            ColumnMeta::new("grade", "int"),
        ];
        let privilege = TablePrivilege::read_only(RowScope::All);
        project("grades", &privilege, &CryptoCatalog::new(), &live).unwrap()
    }

    fn grades_fks() -> FkCatalog {
        FkCatalog::new()
            .with_link(
                "grades",
                "StuID",
                FkLink {
                    target_table: "students".to_owned(),
                    target_key: "StuID".to_owned(),
                    display_template: "CONCAT({alias}.`first_name`, ' ', {alias}.`last_name`)"
                        .to_owned(),
                    display_alias: "Student name".to_owned(),
                },
            )
            .with_link(
                "grades",
                "CID",
                FkLink {
                    target_table: "courses".to_owned(),
                    target_key: "CID".to_owned(),
                    display_template: "{alias}.`course_name`".to_owned(),
                    display_alias: "Course Name".to_owned(),
                },
            )
    }

    #[test]
    fn foreign_keys_get_fresh_aliases_in_projection_order() {
        let compiled = assemble_select(
            "grades",
            &grades_projection(),
            &grades_fks(),
            RangeFilter::default(),
            vec![],
            vec![],
            100,
            0,
            None,
        );
        // StuID precedes CID in the live schema, so it takes j1.
        assert!(compiled.sql.contains(
            "LEFT JOIN `students` j1 ON target.`StuID` = j1.`StuID` \
             LEFT JOIN `courses` j2 ON target.`CID` = j2.`CID`"
        ));
        assert!(compiled
            .sql
            .contains("CONCAT(j1.`first_name`, ' ', j1.`last_name`) AS `Student name`"));
        assert!(compiled.sql.contains("j2.`course_name` AS `Course Name`"));
    }

    #[test]
    fn select_aliases_are_unique() {
        let compiled = assemble_select(
            "grades",
            &grades_projection(),
            &grades_fks(),
            RangeFilter::default(),
            vec![],
            vec![],
            100,
            0,
            None,
        );
        let mut aliases: Vec<&str> = compiled
            .sql
            .split(" AS `")
            .skip(1)
            .filter_map(|part| part.split('`').next())
            .collect();
        aliases.sort_unstable();
        let before = aliases.len();
        aliases.dedup();
        assert_eq!(before, aliases.len());
    }

    #[test]
    fn update_orders_key_before_range() {
        let range = RangeFilter {
            joins: vec![],
            condition: Some(WhereExpr::eq(ColumnRef::target("StuID"), "100")),
        };
        let compiled = assemble_update(
            "students",
            vec![Assignment::Plain {
                column: "phone".to_owned(),
                value: ScalarValue::from("555-0100"),
            }],
            vec![WhereExpr::eq(ColumnRef::target("StuID"), "100")],
            range,
        );
        assert_eq!(
            compiled.sql,
            "UPDATE `students` target SET target.`phone` = ? \
             WHERE target.`StuID` = ? AND target.`StuID` = ?"
        );
        assert_eq!(compiled.params.len(), 3);
    }
}
