//! Live schema metadata: the introspection port and a TTL snapshot cache.
//!
//! The physical schema can drift independently of the static catalogs, so
//! column metadata is fetched per request or held briefly in a cache. The
//! cache stores immutable `Arc` snapshots and refreshes by swapping the
//! whole entry; a snapshot handed to a reader is never mutated underneath
//! it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// One live column as reported by the database's metadata catalog.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub sql_type: String,
    pub is_primary_key: bool,
    pub is_nullable: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            is_primary_key: false,
            is_nullable: true,
        }
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("table does not exist: {0}")]
    UnknownTable(String),

    #[error("introspection failed for table {table}: {message}")]
    Introspection { table: String, message: String },
}

/// Port to the database's metadata catalog. Owned by the execution side;
/// the compiler itself never calls it — entry points take a snapshot.
#[async_trait::async_trait]
pub trait SchemaIntrospector: Send + Sync {
    async fn get_columns(&self, table: &str) -> Result<Vec<ColumnMeta>, SchemaError>;
}

/// A table's cached column snapshot.
#[derive(Clone)]
struct CachedTable {
    columns: Arc<Vec<ColumnMeta>>,
    fetched_at: Instant,
}

/// TTL cache of per-table column snapshots, safe for concurrent readers.
/// Refresh replaces the entry wholesale (copy-on-write): readers holding the
/// previous `Arc` keep a consistent view.
pub struct SchemaCache {
    ttl: Duration,
    entries: DashMap<String, CachedTable>,
}

impl SchemaCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Current snapshot for a table, unless absent or expired.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<Arc<Vec<ColumnMeta>>> {
        let entry = self.entries.get(table)?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.columns))
    }

    /// Install a fresh snapshot, replacing any previous one atomically.
    pub fn insert(&self, table: &str, columns: Vec<ColumnMeta>) -> Arc<Vec<ColumnMeta>> {
        let snapshot = Arc::new(columns);
        self.entries.insert(
            table.to_owned(),
            CachedTable {
                columns: Arc::clone(&snapshot),
                fetched_at: Instant::now(),
            },
        );
        snapshot
    }

    pub fn invalidate(&self, table: &str) {
        self.entries.remove(table);
    }

    /// Cached snapshot, or fetch through the introspector and cache it.
    ///
    /// # Errors
    /// Propagates the introspector's [`SchemaError`] on a cache miss.
    pub async fn get_or_fetch(
        &self,
        table: &str,
        introspector: &dyn SchemaIntrospector,
    ) -> Result<Arc<Vec<ColumnMeta>>, SchemaError> {
        if let Some(snapshot) = self.get(table) {
            return Ok(snapshot);
        }
        tracing::debug!(table, "schema cache miss, introspecting");
        let columns = introspector.get_columns(table).await?;
        Ok(self.insert(table, columns))
    }
}
