//! Column projection: the intersection of a role's configured read
//! visibility with the live schema, with encrypted columns marked.
//!
//! The projection is the server-side column vocabulary for everything
//! downstream — predicates, ordering, foreign-key enrichment. A column
//! outside it does not exist as far as the caller is concerned.

use rowguard_catalog::{CryptoCatalog, EncryptedColumn, TablePrivilege};
use rowguard_query::Rejection;

use crate::schema::ColumnMeta;

/// One visible column, with its encryption spec when the column is stored
/// as ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectedColumn {
    pub meta: ColumnMeta,
    pub encrypted: Option<EncryptedColumn>,
}

/// The ordered visible column set for one (role, table) request.
#[derive(Clone, Debug, Default)]
pub struct Projection {
    columns: Vec<ProjectedColumn>,
}

impl Projection {
    #[must_use]
    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    /// Resolve a caller-supplied column name to its canonical projected
    /// form, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProjectedColumn> {
        self.columns
            .iter()
            .find(|c| c.meta.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn has_encrypted(&self) -> bool {
        self.columns.iter().any(|c| c.encrypted.is_some())
    }
}

/// Intersect the privilege's read visibility with the live schema.
///
/// Configured-but-absent columns drop silently (the catalog may be ahead of
/// or behind the physical schema); an empty result is a configuration error,
/// not an empty result set.
///
/// # Errors
/// Returns [`Rejection::NoReadableColumns`] when nothing remains visible.
pub fn project(
    table: &str,
    privilege: &TablePrivilege,
    encrypted: &CryptoCatalog,
    live: &[ColumnMeta],
) -> Result<Projection, Rejection> {
    let columns: Vec<ProjectedColumn> = live
        .iter()
        .filter(|meta| privilege.readable.admits(&meta.name))
        .map(|meta| ProjectedColumn {
            meta: meta.clone(),
            encrypted: encrypted.spec(table, &meta.name).cloned(),
        })
        .collect();

    if columns.is_empty() {
        tracing::debug!(table, "projection left no readable columns");
        return Err(Rejection::no_readable_columns(table));
    }

    Ok(Projection { columns })
}
