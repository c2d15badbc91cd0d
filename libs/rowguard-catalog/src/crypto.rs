//! Encrypted-column catalog: which columns are stored as ciphertext blobs
//! and what SQL type their decrypted form casts to.
//!
//! The storage scheme is MySQL `AES_ENCRYPT`/`AES_DECRYPT`; the compiler
//! renders the expressions, the key material comes from the key provider
//! port at compile time.

use std::collections::BTreeMap;

/// SQL type a decrypted value is cast to on the read path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecryptCast {
    #[default]
    Char,
    Binary,
    Signed,
    Decimal,
    Date,
    Datetime,
}

impl DecryptCast {
    #[must_use]
    pub fn sql_name(self) -> &'static str {
        match self {
            DecryptCast::Char => "CHAR",
            DecryptCast::Binary => "BINARY",
            DecryptCast::Signed => "SIGNED",
            DecryptCast::Decimal => "DECIMAL",
            DecryptCast::Date => "DATE",
            DecryptCast::Datetime => "DATETIME",
        }
    }
}

/// One encrypted column.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncryptedColumn {
    #[serde(default)]
    pub cast: DecryptCast,
    #[serde(default = "nullable_default")]
    pub nullable: bool,
}

fn nullable_default() -> bool {
    true
}

/// Flat (table, column) → encryption spec map.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CryptoCatalog(BTreeMap<String, BTreeMap<String, EncryptedColumn>>);

impl CryptoCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_column(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        spec: EncryptedColumn,
    ) -> Self {
        self.0
            .entry(table.into())
            .or_default()
            .insert(column.into(), spec);
        self
    }

    /// Spec for a (table, column) pair; column match is case-insensitive to
    /// line up with schema introspection.
    #[must_use]
    pub fn spec(&self, table: &str, column: &str) -> Option<&EncryptedColumn> {
        self.0.get(table).and_then(|cols| {
            cols.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, spec)| spec)
        })
    }

    #[must_use]
    pub fn is_encrypted(&self, table: &str, column: &str) -> bool {
        self.spec(table, column).is_some()
    }

    /// All encrypted columns of a table, in column order.
    pub fn columns_for(&self, table: &str) -> impl Iterator<Item = (&str, &EncryptedColumn)> {
        self.0
            .get(table)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(c, s)| (c.as_str(), s)))
    }

    /// Every declared column as (table, column, spec), in table/column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &EncryptedColumn)> {
        self.0.iter().flat_map(|(table, cols)| {
            cols.iter()
                .map(move |(col, spec)| (table.as_str(), col.as_str(), spec))
        })
    }
}
