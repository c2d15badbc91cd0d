#![allow(dead_code)]

use std::sync::Arc;

use rowguard_catalog::presets;
use rowguard_db::keys::{KeyProvider, StaticKeys};
use rowguard_db::{ColumnMeta, QueryCompiler};

/// Compiler over the bundled university catalog with test keys for the
/// roles that touch encrypted columns.
pub fn compiler() -> QueryCompiler {
    let keys: Arc<dyn KeyProvider> = Arc::new(
        StaticKeys::new()
            .with_key("student", "k-student")
            .with_key("guardian", "k-guardian")
            .with_key("root", "k-root"),
    );
    QueryCompiler::new(Arc::new(presets::university()), keys)
}

/// Compiler with no key material configured at all.
pub fn keyless_compiler() -> QueryCompiler {
    let keys: Arc<dyn KeyProvider> = Arc::new(StaticKeys::new());
    QueryCompiler::new(Arc::new(presets::university()), keys)
}

pub fn grades_columns() -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new("GradeID", "int").primary_key(),
        ColumnMeta::new("StuID", "varchar(16)").not_null(),
        ColumnMeta::new("CID", "varchar(16)").not_null(),
        ColumnMeta::new("term", "varchar(16)"),
        ColumnMeta::new("grade", "varchar(4)"),
        ColumnMeta::new("comments", "text"),
    ]
}

pub fn students_columns() -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new("StuID", "varchar(16)").primary_key(),
        ColumnMeta::new("last_name", "varchar(64)"),
        ColumnMeta::new("first_name", "varchar(64)"),
        ColumnMeta::new("gender", "varchar(8)"),
        ColumnMeta::new("Id_No", "varchar(32)"),
        ColumnMeta::new("address", "varbinary(512)"),
        ColumnMeta::new("phone", "varchar(32)"),
        ColumnMeta::new("email", "varchar(128)"),
        ColumnMeta::new("guardian_relation", "varchar(32)"),
        ColumnMeta::new("identification_number", "varbinary(256)"),
        ColumnMeta::new("GuaID", "varchar(16)"),
    ]
}
