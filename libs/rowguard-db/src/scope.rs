//! Row-scope compilation: turns a (role, table) scope declaration plus the
//! caller's subject id into join/where fragments.
//!
//! Not the authorization gate — the privilege lookup above it is. An unknown
//! (role, table) pair compiles to the empty filter here and is rejected
//! upstream as `UnknownTable`.

use rowguard_catalog::{Identity, RowScope, TablePrivilege};
use rowguard_query::ScalarValue;

use crate::sql::{ColumnRef, JoinClause, JoinKind, WhereExpr};

/// Alias the ownership join is always known under.
pub const OWNER_ALIAS: &str = "owner";

/// Compiled row-scope fragments, empty for full visibility.
#[derive(Clone, Debug, Default)]
pub struct RangeFilter {
    pub joins: Vec<JoinClause>,
    pub condition: Option<WhereExpr>,
}

impl RangeFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.condition.is_none()
    }
}

/// Compile the row scope for one request.
#[must_use]
pub fn compile_range(privilege: Option<&TablePrivilege>, identity: &Identity) -> RangeFilter {
    let Some(privilege) = privilege else {
        return RangeFilter::default();
    };

    match &privilege.range {
        RowScope::All => RangeFilter::default(),
        RowScope::SelfRows { column } => RangeFilter {
            joins: vec![],
            condition: Some(WhereExpr::eq(
                ColumnRef::target(column.clone()),
                ScalarValue::String(identity.subject_id.clone()),
            )),
        },
        RowScope::Children(link) => RangeFilter {
            joins: vec![JoinClause {
                kind: JoinKind::Inner,
                table: link.parent_table.clone(),
                alias: OWNER_ALIAS.to_owned(),
                left: ColumnRef::target(link.child_column.clone()),
                right: ColumnRef::new(OWNER_ALIAS, link.parent_key.clone()),
            }],
            condition: Some(WhereExpr::eq(
                ColumnRef::new(OWNER_ALIAS, link.owner_column.clone()),
                ScalarValue::String(identity.subject_id.clone()),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rowguard_catalog::ChildLink;

    fn identity() -> Identity {
        Identity::new("guardian", "42")
    }

    #[test]
    fn all_scope_compiles_to_nothing() {
        let privilege = TablePrivilege::read_only(RowScope::All);
        assert!(compile_range(Some(&privilege), &identity()).is_empty());
    }

    #[test]
    fn self_scope_restricts_the_declared_identity_column() {
        let privilege = TablePrivilege::read_only(RowScope::SelfRows {
            column: "GuaID".to_owned(),
        });
        let range = compile_range(Some(&privilege), &identity());
        assert!(range.joins.is_empty());
        assert_eq!(
            range.condition.unwrap(),
            WhereExpr::eq(ColumnRef::target("GuaID"), "42")
        );
    }

    #[test]
    fn children_scope_joins_the_parent_and_restricts_the_owner() {
        let privilege = TablePrivilege::read_only(RowScope::Children(ChildLink {
            parent_table: "students".to_owned(),
            child_column: "StuID".to_owned(),
            parent_key: "StuID".to_owned(),
            owner_column: "GuaID".to_owned(),
        }));
        let range = compile_range(Some(&privilege), &identity());
        assert_eq!(range.joins.len(), 1);
        let join = &range.joins[0];
        assert_eq!(join.kind, JoinKind::Inner);
        assert_eq!(join.table, "students");
        assert_eq!(join.alias, OWNER_ALIAS);
        assert_eq!(
            range.condition.unwrap(),
            WhereExpr::eq(ColumnRef::new(OWNER_ALIAS, "GuaID"), "42")
        );
    }

    #[test]
    fn unknown_pair_compiles_to_the_empty_filter() {
        assert!(compile_range(None, &identity()).is_empty());
    }
}
