//! Execution port. The compiler stops at [`CompiledStatement`]; the
//! collaborator behind this trait owns connections, pooling, transactions
//! and timeouts.

use crate::sql::CompiledStatement;

/// One result row, keyed by output alias.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("database error: {0}")]
    Db(String),
}

/// Executes compiled statements against the physical database.
#[async_trait::async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run a SELECT and return its rows.
    async fn query(&self, statement: &CompiledStatement) -> Result<Vec<Row>, ExecError>;

    /// Run a write statement and return the affected-row count.
    async fn execute(&self, statement: &CompiledStatement) -> Result<u64, ExecError>;
}
