//! The compiler entry points: one per statement shape, plus the role
//! catalog description.
//!
//! Every entry point is a pure function of (catalogs, identity, schema
//! snapshot, request): no I/O, no suspension points, no mutation. Identical
//! inputs compile to byte-identical SQL and identical parameter order.

use std::collections::BTreeMap;
use std::sync::Arc;

use rowguard_catalog::{Catalogs, Identity, Role, TablePrivilege};
use rowguard_query::{
    DeleteRequest, InsertRequest, PageLimits, ReadRequest, Rejection, ScalarValue, UpdateRequest,
    WriteOp,
};
use crate::assemble::{assemble_delete, assemble_insert, assemble_select, assemble_update};
use crate::keys::KeyProvider;
use crate::predicate::{compile_filters, compile_orders};
use crate::projection::project;
use crate::schema::ColumnMeta;
use crate::scope::compile_range;
use crate::sql::CompiledStatement;
use crate::write;

/// Role-scoped statement compiler over boot-time catalogs.
pub struct QueryCompiler {
    catalogs: Arc<Catalogs>,
    keys: Arc<dyn KeyProvider>,
    limits: PageLimits,
}

impl QueryCompiler {
    #[must_use]
    pub fn new(catalogs: Arc<Catalogs>, keys: Arc<dyn KeyProvider>) -> Self {
        Self {
            catalogs,
            keys,
            limits: PageLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The privilege lookup is the authorization gate: a missing entry is
    /// `UnknownTable` no matter what the caller asked for.
    fn privilege(&self, identity: &Identity, table: &str) -> Result<&TablePrivilege, Rejection> {
        self.catalogs
            .privileges
            .table(&identity.role, table)
            .ok_or_else(|| Rejection::unknown_table(table))
    }

    fn role_key_param(&self, role: &Role) -> Result<ScalarValue, Rejection> {
        self.keys
            .role_key(role)
            .map(|key| ScalarValue::String(key.expose().to_owned()))
            .ok_or_else(|| Rejection::KeyUnavailable {
                role: role.to_string(),
            })
    }

    /// Compile a SELECT for a declarative read request.
    ///
    /// # Errors
    /// `UnknownTable`, `NoReadableColumns`,
    /// `EncryptedColumnPredicateUnsupported`, `KeyUnavailable`.
    pub fn compile_read(
        &self,
        identity: &Identity,
        table: &str,
        live: &[ColumnMeta],
        request: &ReadRequest,
    ) -> Result<CompiledStatement, Rejection> {
        let privilege = self.privilege(identity, table)?;
        let projection = project(table, privilege, &self.catalogs.encrypted, live)?;
        let range = compile_range(Some(privilege), identity);
        let predicates = compile_filters(&projection, &request.filters)?;
        let orders = compile_orders(&projection, &request.orders)?;

        let decrypt_key = if projection.has_encrypted() {
            Some(self.role_key_param(&identity.role)?)
        } else {
            None
        };

        let compiled = assemble_select(
            table,
            &projection,
            &self.catalogs.foreign_keys,
            range,
            predicates,
            orders,
            self.limits.clamp_limit(request.limit),
            self.limits.clamp_offset(request.offset),
            decrypt_key.as_ref(),
        );
        tracing::debug!(table, role = %identity.role, "compiled read statement");
        Ok(compiled)
    }

    /// Compile an INSERT. The payload's column set must equal the role's
    /// insertable set exactly.
    ///
    /// # Errors
    /// `UnknownTable`, `WriteNotPermitted`, `ColumnSetMismatch`,
    /// `KeyUnavailable`.
    pub fn compile_insert(
        &self,
        identity: &Identity,
        table: &str,
        live: &[ColumnMeta],
        request: &InsertRequest,
    ) -> Result<CompiledStatement, Rejection> {
        let privilege = self.privilege(identity, table)?;
        write::check_write_permitted(privilege, WriteOp::Insert, table)?;
        write::check_insertable(privilege, table, &request.values)?;

        let key = self.write_key(identity, table, &request.values)?;
        let assignments = write::build_assignments(
            &self.catalogs.encrypted,
            table,
            WriteOp::Insert,
            &request.values,
            live,
            key.as_ref(),
        )?;

        let compiled = assemble_insert(table, assignments);
        tracing::debug!(table, role = %identity.role, "compiled insert statement");
        Ok(compiled)
    }

    /// Compile an UPDATE targeted by a complete primary key.
    ///
    /// # Errors
    /// `UnknownTable`, `WriteNotPermitted`, `IncompletePrimaryKey`,
    /// `ColumnSetMismatch`, `KeyUnavailable`.
    pub fn compile_update(
        &self,
        identity: &Identity,
        table: &str,
        live: &[ColumnMeta],
        request: &UpdateRequest,
    ) -> Result<CompiledStatement, Rejection> {
        let privilege = self.privilege(identity, table)?;
        write::check_write_permitted(privilege, WriteOp::Update, table)?;
        let key_conditions = write::primary_key_conditions(live, &request.key)?;
        write::check_updatable(privilege, table, &request.values)?;

        let key = self.write_key(identity, table, &request.values)?;
        let assignments = write::build_assignments(
            &self.catalogs.encrypted,
            table,
            WriteOp::Update,
            &request.values,
            live,
            key.as_ref(),
        )?;

        let range = compile_range(Some(privilege), identity);
        let compiled = assemble_update(table, assignments, key_conditions, range);
        tracing::debug!(table, role = %identity.role, "compiled update statement");
        Ok(compiled)
    }

    /// Compile a DELETE targeted by a complete primary key.
    ///
    /// # Errors
    /// `UnknownTable`, `WriteNotPermitted`, `IncompletePrimaryKey`.
    pub fn compile_delete(
        &self,
        identity: &Identity,
        table: &str,
        live: &[ColumnMeta],
        request: &DeleteRequest,
    ) -> Result<CompiledStatement, Rejection> {
        let privilege = self.privilege(identity, table)?;
        write::check_write_permitted(privilege, WriteOp::Delete, table)?;
        let key_conditions = write::primary_key_conditions(live, &request.key)?;

        let range = compile_range(Some(privilege), identity);
        let compiled = assemble_delete(table, key_conditions, range);
        tracing::debug!(table, role = %identity.role, "compiled delete statement");
        Ok(compiled)
    }

    fn write_key(
        &self,
        identity: &Identity,
        table: &str,
        values: &rowguard_query::ColumnValues,
    ) -> Result<Option<ScalarValue>, Rejection> {
        if write::touches_encrypted(&self.catalogs.encrypted, table, values) {
            Ok(Some(self.role_key_param(&identity.role)?))
        } else {
            Ok(None)
        }
    }

    /// The role's view of the world: its tables, their projected columns,
    /// and its write permissions. Builds no SQL; unknown roles get an empty
    /// description.
    #[must_use]
    pub fn describe_role(
        &self,
        identity: &Identity,
        snapshots: &BTreeMap<String, Vec<ColumnMeta>>,
    ) -> RoleDescription {
        let tables = self
            .catalogs
            .privileges
            .tables_for(&identity.role)
            .map(|(table, privilege)| {
                let columns = snapshots
                    .get(table)
                    .and_then(|live| {
                        project(table, privilege, &self.catalogs.encrypted, live).ok()
                    })
                    .map(|projection| {
                        projection
                            .columns()
                            .iter()
                            .map(|c| c.meta.name.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                TableDescription {
                    table: table.to_owned(),
                    scope: privilege.range.kind(),
                    columns,
                    insertable: privilege.insertable.iter().cloned().collect(),
                    updatable: privilege.updatable.iter().cloned().collect(),
                    deletable: privilege.deletable,
                }
            })
            .collect();

        RoleDescription {
            role: identity.role.to_string(),
            tables,
        }
    }
}

/// One table as a role sees it.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TableDescription {
    pub table: String,
    pub scope: &'static str,
    pub columns: Vec<String>,
    pub insertable: Vec<String>,
    pub updatable: Vec<String>,
    pub deletable: bool,
}

/// A role's full catalog view.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RoleDescription {
    pub role: String,
    pub tables: Vec<TableDescription>,
}
