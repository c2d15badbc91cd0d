//! Static catalogs driving the rowguard query compiler.
//!
//! Three flat, data-driven tables loaded once at boot and immutable for the
//! process lifetime:
//!
//! - [`PrivilegeCatalog`] — per (role, table): read visibility, row scope,
//!   insertable/updatable column sets, delete permission;
//! - [`FkCatalog`] — per (table, column): foreign-key display enrichment;
//! - [`CryptoCatalog`] — per (table, column): encrypted-at-rest columns.
//!
//! There is deliberately no role type hierarchy: a role is just a normalized
//! name, and everything a role can do is catalog data keyed by it.

pub mod catalog;
pub mod crypto;
pub mod links;
pub mod presets;
pub mod privilege;

pub use catalog::{CatalogError, Catalogs};
pub use crypto::{CryptoCatalog, DecryptCast, EncryptedColumn};
pub use links::{FkCatalog, FkLink};
pub use privilege::{ChildLink, PrivilegeCatalog, ReadVisibility, RowScope, TablePrivilege};

/// An identity class. Normalized to ASCII lowercase so that catalog keys,
/// header values and config spellings all meet in one form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role(String);

impl Role {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::new(s)
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        r.0
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::new(s)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated caller, as resolved by the external identity provider.
/// The compiler trusts this completely and never persists it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub subject_id: String,
}

impl Identity {
    pub fn new(role: impl Into<Role>, subject_id: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            subject_id: subject_id.into(),
        }
    }
}
