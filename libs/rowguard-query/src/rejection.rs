//! Unified rejection taxonomy for the query compiler.
//!
//! Rejections are plain values, never exceptions used for control flow. The
//! request layer maps them to transport failure codes; that mapping is out of
//! scope here. Two propagation classes exist:
//!
//! - entry-level classifications (`InvalidFilterShape`, `UnknownOperator`)
//!   mark an individual filter/order entry the predicate compiler drops and
//!   moves on from;
//! - everything else aborts the whole request before any SQL is produced.

/// Which write shape a rejection refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOp::Insert => write!(f, "insert"),
            WriteOp::Update => write!(f, "update"),
            WriteOp::Delete => write!(f, "delete"),
        }
    }
}

/// A compile-time refusal to build a statement.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The table is not in the caller role's privilege set. Absence of a
    /// catalog entry means zero access, so this is also the answer for
    /// tables that simply do not exist.
    #[error("table not available to this role: {table}")]
    UnknownTable { table: String },

    /// Catalog/schema intersection left nothing visible. A configuration
    /// error, distinct from a query that merely matches zero rows.
    #[error("no readable columns for table: {table}")]
    NoReadableColumns { table: String },

    /// Wrong literal arity or type for the operator.
    #[error("invalid {operator} filter shape on column {column}")]
    InvalidFilterShape { column: String, operator: String },

    /// Filter or order on a ciphertext column. Predicates cannot see through
    /// the encryption at the WHERE layer, so the whole request aborts.
    #[error("column is encrypted and cannot appear in predicates: {column}")]
    EncryptedColumnPredicateUnsupported { column: String },

    /// Update/delete key map is missing a primary-key column.
    #[error("incomplete primary key: missing {column}")]
    IncompletePrimaryKey { column: String },

    /// Insert/update payload key set violates the configured column set.
    #[error("column set does not match the configured {op} set for table {table}")]
    ColumnSetMismatch { table: String, op: WriteOp },

    /// Operator token outside the closed set.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// The privilege catalog disables this write shape for the role.
    #[error("{op} is not permitted on table {table} for this role")]
    WriteNotPermitted { table: String, op: WriteOp },

    /// An encrypted column was touched but no key material is available for
    /// the caller's role.
    #[error("no encryption key available for role: {role}")]
    KeyUnavailable { role: String },
}

impl Rejection {
    #[must_use]
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Rejection::UnknownTable {
            table: table.into(),
        }
    }

    #[must_use]
    pub fn no_readable_columns(table: impl Into<String>) -> Self {
        Rejection::NoReadableColumns {
            table: table.into(),
        }
    }

    #[must_use]
    pub fn encrypted_predicate(column: impl Into<String>) -> Self {
        Rejection::EncryptedColumnPredicateUnsupported {
            column: column.into(),
        }
    }
}
