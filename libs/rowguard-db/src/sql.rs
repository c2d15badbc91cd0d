//! The internal statement AST and its MySQL renderer.
//!
//! Every other module builds clause objects; only this module produces SQL
//! text. Identifier quoting and placeholder generation live here and nowhere
//! else, so parameter interpolation cannot regress elsewhere. Placeholders
//! are always `?`, identifiers always backtick-quoted (embedded backticks
//! doubled), and parameters are collected in render order — which makes the
//! parameter list deterministic for a deterministic clause list.

use rowguard_query::{ScalarValue, SortDir};

/// Alias the statement's base table is always known under.
pub const TARGET_ALIAS: &str = "target";

/// The compiler's sole output artifact: SQL text plus its bound parameters,
/// consumed exactly once by the execution collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<ScalarValue>,
}

/// Backtick-quote an identifier. Embedded backticks are doubled.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// An alias-qualified column reference. The qualifier is always a
/// server-generated alias (`target`, `owner`, `j1`…), never caller input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(qualifier: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            column: column.into(),
        }
    }

    /// Column on the statement's base table.
    pub fn target(column: impl Into<String>) -> Self {
        Self::new(TARGET_ALIAS, column)
    }

    fn render(&self) -> String {
        format!("{}.{}", self.qualifier, quote_ident(&self.column))
    }
}

/// Comparison tokens a [`WhereExpr::Compare`] may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
}

impl CompareOp {
    fn token(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// One conjunct of a WHERE clause. Conjuncts combine with AND only.
#[derive(Clone, Debug, PartialEq)]
pub enum WhereExpr {
    Compare {
        col: ColumnRef,
        op: CompareOp,
        value: ScalarValue,
    },
    /// Two-element membership test.
    InTwo {
        col: ColumnRef,
        values: [ScalarValue; 2],
    },
    /// Closed range between two values.
    Between {
        col: ColumnRef,
        low: ScalarValue,
        high: ScalarValue,
    },
    IsNull {
        col: ColumnRef,
    },
    IsNotNull {
        col: ColumnRef,
    },
}

impl WhereExpr {
    pub fn eq(col: ColumnRef, value: impl Into<ScalarValue>) -> Self {
        WhereExpr::Compare {
            col,
            op: CompareOp::Eq,
            value: value.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A single-condition join clause.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// One ORDER BY entry.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub col: ColumnRef,
    pub dir: SortDir,
}

/// One projected output column of a SELECT.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectItem {
    /// `target.`col` AS `alias``
    Column { col: ColumnRef, alias: String },
    /// `CAST(AES_DECRYPT(target.`col`, ?) AS <cast>) AS `alias``
    Decrypt {
        col: ColumnRef,
        cast: &'static str,
        key: ScalarValue,
        alias: String,
    },
    /// A catalog-owned display expression, already alias-substituted.
    /// Contains no caller input and binds no parameters.
    Display { sql: String, alias: String },
}

impl SelectItem {
    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            SelectItem::Column { alias, .. }
            | SelectItem::Decrypt { alias, .. }
            | SelectItem::Display { alias, .. } => alias,
        }
    }
}

/// One SET-list (or VALUES-list) entry of a write statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Assignment {
    /// `col = ?`
    Plain { column: String, value: ScalarValue },
    /// `col = AES_ENCRYPT(?, ?)` — plaintext parameter, then key parameter.
    Encrypt {
        column: String,
        value: ScalarValue,
        key: ScalarValue,
    },
}

impl Assignment {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Assignment::Plain { column, .. } | Assignment::Encrypt { column, .. } => column,
        }
    }
}

/// Accumulates SQL text and parameters in render order.
struct SqlWriter {
    sql: String,
    params: Vec<ScalarValue>,
}

impl SqlWriter {
    fn new() -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn push_param(&mut self, value: ScalarValue) {
        self.sql.push('?');
        self.params.push(value);
    }

    fn push_joins(&mut self, joins: &[JoinClause]) {
        for join in joins {
            let kind = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            self.push(&format!(
                " {kind} {} {} ON {} = {}",
                quote_ident(&join.table),
                join.alias,
                join.left.render(),
                join.right.render()
            ));
        }
    }

    fn push_where(&mut self, conjuncts: &[WhereExpr]) {
        for (i, expr) in conjuncts.iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            self.push_where_expr(expr);
        }
    }

    fn push_where_expr(&mut self, expr: &WhereExpr) {
        match expr {
            WhereExpr::Compare { col, op, value } => {
                self.push(&format!("{} {} ", col.render(), op.token()));
                self.push_param(value.clone());
            }
            WhereExpr::InTwo { col, values } => {
                self.push(&format!("{} IN (", col.render()));
                self.push_param(values[0].clone());
                self.push(", ");
                self.push_param(values[1].clone());
                self.push(")");
            }
            WhereExpr::Between { col, low, high } => {
                self.push(&format!("{} BETWEEN ", col.render()));
                self.push_param(low.clone());
                self.push(" AND ");
                self.push_param(high.clone());
            }
            WhereExpr::IsNull { col } => {
                self.push(&format!("{} IS NULL", col.render()));
            }
            WhereExpr::IsNotNull { col } => {
                self.push(&format!("{} IS NOT NULL", col.render()));
            }
        }
    }

    fn finish(self) -> CompiledStatement {
        CompiledStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// A full SELECT in the fixed clause order: projection, FROM, range joins,
/// foreign-key joins, WHERE, ORDER BY, LIMIT/OFFSET.
#[derive(Clone, Debug)]
pub struct SelectStatement {
    pub table: String,
    pub items: Vec<SelectItem>,
    pub joins: Vec<JoinClause>,
    pub conjuncts: Vec<WhereExpr>,
    pub order_by: Vec<OrderItem>,
    pub limit: u64,
    pub offset: u64,
}

impl SelectStatement {
    #[must_use]
    pub fn render(&self) -> CompiledStatement {
        let mut w = SqlWriter::new();
        w.push("SELECT ");
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match item {
                SelectItem::Column { col, alias } => {
                    w.push(&format!("{} AS {}", col.render(), quote_ident(alias)));
                }
                SelectItem::Decrypt {
                    col,
                    cast,
                    key,
                    alias,
                } => {
                    w.push(&format!("CAST(AES_DECRYPT({}, ", col.render()));
                    w.push_param(key.clone());
                    w.push(&format!(") AS {cast}) AS {}", quote_ident(alias)));
                }
                SelectItem::Display { sql, alias } => {
                    w.push(&format!("{sql} AS {}", quote_ident(alias)));
                }
            }
        }
        w.push(&format!(
            " FROM {} {TARGET_ALIAS}",
            quote_ident(&self.table)
        ));
        w.push_joins(&self.joins);
        w.push_where(&self.conjuncts);
        for (i, item) in self.order_by.iter().enumerate() {
            w.push(if i == 0 { " ORDER BY " } else { ", " });
            let dir = match item.dir {
                SortDir::Asc => "ASC",
                SortDir::Desc => "DESC",
            };
            w.push(&format!("{} {dir}", item.col.render()));
        }
        w.push(" LIMIT ");
        w.push_param(ScalarValue::from(self.limit));
        w.push(" OFFSET ");
        w.push_param(ScalarValue::from(self.offset));
        w.finish()
    }
}

/// A full UPDATE: base table, range joins, SET list, WHERE.
#[derive(Clone, Debug)]
pub struct UpdateStatement {
    pub table: String,
    pub joins: Vec<JoinClause>,
    pub set: Vec<Assignment>,
    pub conjuncts: Vec<WhereExpr>,
}

impl UpdateStatement {
    #[must_use]
    pub fn render(&self) -> CompiledStatement {
        let mut w = SqlWriter::new();
        w.push(&format!("UPDATE {} {TARGET_ALIAS}", quote_ident(&self.table)));
        w.push_joins(&self.joins);
        w.push(" SET ");
        for (i, assignment) in self.set.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match assignment {
                Assignment::Plain { column, value } => {
                    w.push(&format!("{TARGET_ALIAS}.{} = ", quote_ident(column)));
                    w.push_param(value.clone());
                }
                Assignment::Encrypt { column, value, key } => {
                    w.push(&format!(
                        "{TARGET_ALIAS}.{} = AES_ENCRYPT(",
                        quote_ident(column)
                    ));
                    w.push_param(value.clone());
                    w.push(", ");
                    w.push_param(key.clone());
                    w.push(")");
                }
            }
        }
        w.push_where(&self.conjuncts);
        w.finish()
    }
}

/// A full DELETE in the MySQL multi-table form, so range joins compose.
#[derive(Clone, Debug)]
pub struct DeleteStatement {
    pub table: String,
    pub joins: Vec<JoinClause>,
    pub conjuncts: Vec<WhereExpr>,
}

impl DeleteStatement {
    #[must_use]
    pub fn render(&self) -> CompiledStatement {
        let mut w = SqlWriter::new();
        w.push(&format!(
            "DELETE {TARGET_ALIAS} FROM {} {TARGET_ALIAS}",
            quote_ident(&self.table)
        ));
        w.push_joins(&self.joins);
        w.push_where(&self.conjuncts);
        w.finish()
    }
}

/// A full INSERT: column list plus VALUES placeholders.
#[derive(Clone, Debug)]
pub struct InsertStatement {
    pub table: String,
    pub values: Vec<Assignment>,
}

impl InsertStatement {
    #[must_use]
    pub fn render(&self) -> CompiledStatement {
        let mut w = SqlWriter::new();
        w.push(&format!("INSERT INTO {} (", quote_ident(&self.table)));
        for (i, assignment) in self.values.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(&quote_ident(assignment.column()));
        }
        w.push(") VALUES (");
        for (i, assignment) in self.values.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match assignment {
                Assignment::Plain { value, .. } => {
                    w.push_param(value.clone());
                }
                Assignment::Encrypt { value, key, .. } => {
                    w.push("AES_ENCRYPT(");
                    w.push_param(value.clone());
                    w.push(", ");
                    w.push_param(key.clone());
                    w.push(")");
                }
            }
        }
        w.push(")");
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_quote_and_double_backticks() {
        assert_eq!(quote_ident("StuID"), "`StuID`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn select_renders_fixed_clause_order() {
        let stmt = SelectStatement {
            table: "grades".to_owned(),
            items: vec![
                SelectItem::Column {
                    col: ColumnRef::target("term"),
                    alias: "term".to_owned(),
                },
                SelectItem::Display {
                    sql: "j1.`course_name`".to_owned(),
                    alias: "Course Name".to_owned(),
                },
            ],
            joins: vec![JoinClause {
                kind: JoinKind::Left,
                table: "courses".to_owned(),
                alias: "j1".to_owned(),
                left: ColumnRef::target("CID"),
                right: ColumnRef::new("j1", "CID"),
            }],
            conjuncts: vec![WhereExpr::eq(ColumnRef::target("term"), "Fall2024")],
            order_by: vec![OrderItem {
                col: ColumnRef::target("grade"),
                dir: SortDir::Desc,
            }],
            limit: 100,
            offset: 0,
        };
        let compiled = stmt.render();
        assert_eq!(
            compiled.sql,
            "SELECT target.`term` AS `term`, j1.`course_name` AS `Course Name` \
             FROM `grades` target \
             LEFT JOIN `courses` j1 ON target.`CID` = j1.`CID` \
             WHERE target.`term` = ? \
             ORDER BY target.`grade` DESC \
             LIMIT ? OFFSET ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                ScalarValue::from("Fall2024"),
                ScalarValue::from(100_u64),
                ScalarValue::from(0_u64),
            ]
        );
    }

    #[test]
    fn decrypt_item_binds_key_before_where_params() {
        let stmt = SelectStatement {
            table: "students".to_owned(),
            items: vec![SelectItem::Decrypt {
                col: ColumnRef::target("address"),
                cast: "CHAR",
                key: ScalarValue::from("k1"),
                alias: "address".to_owned(),
            }],
            joins: vec![],
            conjuncts: vec![WhereExpr::eq(ColumnRef::target("StuID"), "100")],
            order_by: vec![],
            limit: 10,
            offset: 0,
        };
        let compiled = stmt.render();
        assert!(compiled.sql.starts_with(
            "SELECT CAST(AES_DECRYPT(target.`address`, ?) AS CHAR) AS `address` FROM"
        ));
        assert_eq!(compiled.params[0], ScalarValue::from("k1"));
        assert_eq!(compiled.params[1], ScalarValue::from("100"));
    }

    #[test]
    fn update_renders_set_then_where() {
        let stmt = UpdateStatement {
            table: "students".to_owned(),
            joins: vec![],
            set: vec![
                Assignment::Encrypt {
                    column: "address".to_owned(),
                    value: ScalarValue::from("12 North St"),
                    key: ScalarValue::from("k1"),
                },
                Assignment::Plain {
                    column: "phone".to_owned(),
                    value: ScalarValue::from("555-0100"),
                },
            ],
            conjuncts: vec![WhereExpr::eq(ColumnRef::target("StuID"), "100")],
        };
        let compiled = stmt.render();
        assert_eq!(
            compiled.sql,
            "UPDATE `students` target \
             SET target.`address` = AES_ENCRYPT(?, ?), target.`phone` = ? \
             WHERE target.`StuID` = ?"
        );
        assert_eq!(compiled.params.len(), 4);
        assert_eq!(compiled.params[1], ScalarValue::from("k1"));
    }

    #[test]
    fn delete_uses_multi_table_form() {
        let stmt = DeleteStatement {
            table: "grades".to_owned(),
            joins: vec![JoinClause {
                kind: JoinKind::Inner,
                table: "students".to_owned(),
                alias: "owner".to_owned(),
                left: ColumnRef::target("StuID"),
                right: ColumnRef::new("owner", "StuID"),
            }],
            conjuncts: vec![
                WhereExpr::eq(ColumnRef::target("GradeID"), 7_i64),
                WhereExpr::eq(ColumnRef::new("owner", "GuaID"), "42"),
            ],
        };
        let compiled = stmt.render();
        assert_eq!(
            compiled.sql,
            "DELETE target FROM `grades` target \
             INNER JOIN `students` owner ON target.`StuID` = owner.`StuID` \
             WHERE target.`GradeID` = ? AND owner.`GuaID` = ?"
        );
    }

    #[test]
    fn insert_wraps_encrypted_values() {
        let stmt = InsertStatement {
            table: "staffs".to_owned(),
            values: vec![
                Assignment::Plain {
                    column: "StfID".to_owned(),
                    value: ScalarValue::from("9"),
                },
                Assignment::Encrypt {
                    column: "address".to_owned(),
                    value: ScalarValue::from("1 Main St"),
                    key: ScalarValue::from("k2"),
                },
            ],
        };
        let compiled = stmt.render();
        assert_eq!(
            compiled.sql,
            "INSERT INTO `staffs` (`StfID`, `address`) VALUES (?, AES_ENCRYPT(?, ?))"
        );
        assert_eq!(
            compiled.params,
            vec![
                ScalarValue::from("9"),
                ScalarValue::from("1 Main St"),
                ScalarValue::from("k2"),
            ]
        );
    }

    #[test]
    fn between_and_membership_bind_two_params() {
        let stmt = SelectStatement {
            table: "grades".to_owned(),
            items: vec![SelectItem::Column {
                col: ColumnRef::target("grade"),
                alias: "grade".to_owned(),
            }],
            joins: vec![],
            conjuncts: vec![
                WhereExpr::Between {
                    col: ColumnRef::target("grade"),
                    low: ScalarValue::from(60_i64),
                    high: ScalarValue::from(90_i64),
                },
                WhereExpr::InTwo {
                    col: ColumnRef::target("term"),
                    values: [ScalarValue::from("Fall2024"), ScalarValue::from("Spring2025")],
                },
                WhereExpr::IsNotNull {
                    col: ColumnRef::target("comments"),
                },
            ],
            order_by: vec![],
            limit: 1,
            offset: 0,
        };
        let compiled = stmt.render();
        assert!(compiled.sql.contains(
            "WHERE target.`grade` BETWEEN ? AND ? \
             AND target.`term` IN (?, ?) \
             AND target.`comments` IS NOT NULL"
        ));
        assert_eq!(compiled.params.len(), 6); // 4 predicate + limit + offset
    }
}
