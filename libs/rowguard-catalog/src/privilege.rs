//! Per-(role, table) privileges: read visibility, row scope, write column
//! sets, delete permission.

use std::collections::{BTreeMap, BTreeSet};

use crate::Role;

/// Which columns of a table a role may read.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadVisibility {
    /// Every live column the schema reports.
    #[default]
    All,
    /// An explicit allow-list, intersected case-insensitively with the live
    /// schema by the projector.
    Columns(BTreeSet<String>),
}

impl ReadVisibility {
    /// Case-insensitive membership; `All` admits everything.
    #[must_use]
    pub fn admits(&self, column: &str) -> bool {
        match self {
            ReadVisibility::All => true,
            ReadVisibility::Columns(set) => {
                set.iter().any(|c| c.eq_ignore_ascii_case(column))
            }
        }
    }
}

/// The parent-join declaration backing the `children` row scope: rows of the
/// scoped table are visible when the joined parent row is owned by the
/// caller. Declared, never inferred.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChildLink {
    /// Table holding the ownership column (e.g. `students`).
    pub parent_table: String,
    /// Column on the scoped table that references the parent.
    pub child_column: String,
    /// Key column on the parent the join matches against.
    pub parent_key: String,
    /// Column on the parent restricted to the caller's subject id.
    pub owner_column: String,
}

/// Row-level visibility policy for a (role, table) pair.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowScope {
    /// No row restriction beyond what column projection already allows.
    All,
    /// Only rows whose declared identity column equals the caller's subject
    /// id.
    #[serde(rename = "self")]
    SelfRows { column: String },
    /// Rows reachable through an ownership join (guardianship-style
    /// indirection).
    Children(ChildLink),
}

impl RowScope {
    /// Stable name for describe output and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowScope::All => "all",
            RowScope::SelfRows { .. } => "self",
            RowScope::Children(_) => "children",
        }
    }
}

/// Everything one role may do with one table. Absence of a `TablePrivilege`
/// means zero access.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TablePrivilege {
    #[serde(default)]
    pub readable: ReadVisibility,
    pub range: RowScope,
    #[serde(default)]
    pub insertable: BTreeSet<String>,
    #[serde(default)]
    pub updatable: BTreeSet<String>,
    #[serde(default)]
    pub deletable: bool,
}

impl TablePrivilege {
    /// Read-only privilege with the given row scope.
    #[must_use]
    pub fn read_only(range: RowScope) -> Self {
        Self {
            readable: ReadVisibility::All,
            range,
            insertable: BTreeSet::new(),
            updatable: BTreeSet::new(),
            deletable: false,
        }
    }

    #[must_use]
    pub fn with_insertable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insertable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_updatable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.updatable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_deletable(mut self) -> Self {
        self.deletable = true;
        self
    }
}

/// Flat (role, table) → privilege map.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PrivilegeCatalog(BTreeMap<Role, BTreeMap<String, TablePrivilege>>);

impl PrivilegeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(
        mut self,
        role: impl Into<Role>,
        table: impl Into<String>,
        privilege: TablePrivilege,
    ) -> Self {
        self.0
            .entry(role.into())
            .or_default()
            .insert(table.into(), privilege);
        self
    }

    /// Privilege for a (role, table) pair, or `None` which means no access.
    #[must_use]
    pub fn table(&self, role: &Role, table: &str) -> Option<&TablePrivilege> {
        self.0.get(role).and_then(|tables| tables.get(table))
    }

    /// Tables visible to a role, in name order. Empty for unknown roles.
    pub fn tables_for(&self, role: &Role) -> impl Iterator<Item = (&str, &TablePrivilege)> {
        self.0
            .get(role)
            .into_iter()
            .flat_map(|tables| tables.iter().map(|(t, p)| (t.as_str(), p)))
    }

    /// All configured roles, in name order.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.0.keys()
    }
}
