//! Key-material port for the encrypt/decrypt expressions.
//!
//! The compiler treats key material as an opaque secret that only ever
//! becomes a bound parameter. Keys are selected per role; a role without a
//! configured key cannot touch encrypted columns (the request rejects, it
//! never falls back to some other key).

use std::collections::HashMap;
use std::fmt;

use rowguard_catalog::Role;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Environment variable prefix the env-backed provider reads:
/// `ENCRYPTION_KEY_<ROLE>`.
pub const KEY_ENV_PREFIX: &str = "ENCRYPTION_KEY_";

/// Opaque wrapper around symmetric key material.
///
/// `Debug` and `Display` both print `[REDACTED]` — the inner value is never
/// exposed through formatting traits. Use [`expose`](Self::expose) at the
/// single point where the key becomes a bound parameter.
///
/// On [`Drop`] the backing buffer is securely zeroed via the [`zeroize`] crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read-only access to the key. Callers must not log or persist the
    /// returned slice.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Clone for KeyMaterial {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Supplies symmetric key material per role.
pub trait KeyProvider: Send + Sync {
    /// Key for a role, or `None` when the role has no key configured.
    fn role_key(&self, role: &Role) -> Option<KeyMaterial>;
}

/// Fixed in-memory key set.
#[derive(Default)]
pub struct StaticKeys {
    keys: HashMap<Role, KeyMaterial>,
}

impl StaticKeys {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key(mut self, role: impl Into<Role>, key: impl Into<String>) -> Self {
        self.keys.insert(role.into(), KeyMaterial::new(key));
        self
    }
}

impl KeyProvider for StaticKeys {
    fn role_key(&self, role: &Role) -> Option<KeyMaterial> {
        self.keys.get(role).cloned()
    }
}

/// Reads `ENCRYPTION_KEY_<ROLE>` for each given role once, at construction.
/// Roles without a variable simply have no key.
pub struct EnvKeys {
    keys: HashMap<Role, KeyMaterial>,
}

impl EnvKeys {
    #[must_use]
    pub fn from_env<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Self {
        let mut keys = HashMap::new();
        for role in roles {
            let var = format!("{KEY_ENV_PREFIX}{}", role.as_str().to_ascii_uppercase());
            if let Ok(value) = std::env::var(&var) {
                keys.insert(role.clone(), KeyMaterial::new(value));
            } else {
                tracing::debug!(role = %role, %var, "no encryption key configured");
            }
        }
        Self { keys }
    }
}

impl KeyProvider for EnvKeys {
    fn role_key(&self, role: &Role) -> Option<KeyMaterial> {
        self.keys.get(role).cloned()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn static_keys_resolve_per_role() {
        let keys = StaticKeys::new().with_key("student", "k-student");
        let key = keys.role_key(&Role::new("STUDENT")).expect("key");
        assert_eq!(key.expose(), "k-student");
        assert!(keys.role_key(&Role::new("guardian")).is_none());
    }

    #[test]
    fn key_material_never_leaks_through_formatting() {
        let key = KeyMaterial::new("super-secret");
        assert_eq!(format!("{key:?}"), "[REDACTED]");
        assert_eq!(format!("{key}"), "[REDACTED]");
    }
}
