//! Role-scoped SQL statement compiler.
//!
//! Takes a declarative request plus an authenticated identity and
//! deterministically produces a parameterized MySQL statement that respects
//! the static catalogs: per-role column visibility, row-level scoping,
//! foreign-key display enrichment and transparent field-level encryption.
//!
//! The compiler is purely functional and suspension-free; schema
//! introspection and statement execution live behind the async ports in
//! [`schema`] and [`exec`], owned by the surrounding service.

pub mod assemble;
pub mod compiler;
pub mod exec;
pub mod keys;
pub mod predicate;
pub mod projection;
pub mod schema;
pub mod scope;
pub mod sql;
pub mod write;

pub use compiler::{QueryCompiler, RoleDescription, TableDescription};
pub use exec::{ExecError, Row, StatementExecutor};
pub use keys::{EnvKeys, KeyMaterial, KeyProvider, StaticKeys};
pub use projection::{ProjectedColumn, Projection};
pub use schema::{ColumnMeta, SchemaCache, SchemaError, SchemaIntrospector};
pub use scope::{OWNER_ALIAS, RangeFilter, compile_range};
pub use sql::{CompiledStatement, TARGET_ALIAS};
