//! The catalog aggregate: boot-time loading and cross-catalog validation.
//!
//! Catalogs load once (YAML file merged with `ROWGUARD_`-prefixed
//! environment overrides) and are immutable afterwards; hot reload is out of
//! scope. Validation runs at load, not per request: a bad combination is a
//! deployment error, not caller input.

use figment::providers::{Env, Format, Yaml};
use figment::Figment;

use crate::crypto::CryptoCatalog;
use crate::links::{ALIAS_PLACEHOLDER, FkCatalog};
use crate::privilege::{PrivilegeCatalog, RowScope};

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "ROWGUARD_";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Encrypted + foreign-key on the same column has no defined read shape.
    #[error("column {table}.{column} is declared both encrypted and foreign-key")]
    EncryptedForeignKey { table: String, column: String },

    /// A self scope with no identity column, or a children link with a blank
    /// field, cannot restrict anything.
    #[error("row scope for role {role}, table {table} is incomplete")]
    IncompleteScope { role: String, table: String },

    #[error("display template for {table}.{column} has no {placeholder} placeholder")]
    BadDisplayTemplate {
        table: String,
        column: String,
        placeholder: &'static str,
    },
}

/// The three static catalogs, loaded together and validated as a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Catalogs {
    #[serde(default)]
    pub privileges: PrivilegeCatalog,
    #[serde(default)]
    pub foreign_keys: FkCatalog,
    #[serde(default)]
    pub encrypted: CryptoCatalog,
}

impl Catalogs {
    /// Load from a YAML file merged with `ROWGUARD_` environment overrides,
    /// then validate.
    ///
    /// # Errors
    /// Returns [`CatalogError`] when extraction or validation fails.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, CatalogError> {
        Self::from_figment(
            Figment::new()
                .merge(Yaml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Load from an in-memory YAML document (fixtures, embedded defaults).
    ///
    /// # Errors
    /// Returns [`CatalogError`] when extraction or validation fails.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Self::from_figment(Figment::new().merge(Yaml::string(yaml)))
    }

    fn from_figment(figment: Figment) -> Result<Self, CatalogError> {
        let catalogs: Catalogs = figment.extract().map_err(Box::new)?;
        catalogs.validate()?;
        Ok(catalogs)
    }

    /// Cross-catalog consistency checks. Fails closed: the first offending
    /// declaration aborts the load.
    ///
    /// # Errors
    /// Returns the first [`CatalogError`] found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (table, column, _) in self.encrypted.iter() {
            if self.foreign_keys.link(table, column).is_some() {
                tracing::error!(table, column, "encrypted column also declared as foreign key");
                return Err(CatalogError::EncryptedForeignKey {
                    table: table.to_owned(),
                    column: column.to_owned(),
                });
            }
        }

        for (table, column, link) in self.foreign_keys.iter() {
            if !link.display_template.contains(ALIAS_PLACEHOLDER) {
                tracing::error!(table, column, "display template lacks alias placeholder");
                return Err(CatalogError::BadDisplayTemplate {
                    table: table.to_owned(),
                    column: column.to_owned(),
                    placeholder: ALIAS_PLACEHOLDER,
                });
            }
        }

        let roles: Vec<_> = self.privileges.roles().cloned().collect();
        for role in &roles {
            for (table, privilege) in self.privileges.tables_for(role) {
                let complete = match &privilege.range {
                    RowScope::All => true,
                    RowScope::SelfRows { column } => !column.is_empty(),
                    RowScope::Children(link) => {
                        !link.parent_table.is_empty()
                            && !link.child_column.is_empty()
                            && !link.parent_key.is_empty()
                            && !link.owner_column.is_empty()
                    }
                };
                if !complete {
                    tracing::error!(role = %role, table, "incomplete row scope declaration");
                    return Err(CatalogError::IncompleteScope {
                        role: role.to_string(),
                        table: table.to_owned(),
                    });
                }
            }
        }

        Ok(())
    }
}
