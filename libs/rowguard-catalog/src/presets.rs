//! Bundled reference catalog: the university records deployment.
//!
//! Five roles over a student-records schema. `student` and `guardian` are
//! row-scoped to their own data, `aro` (academic records officer) and `dro`
//! (discipline records officer) administer one table each, and `root` is the
//! unrestricted testing role.

use crate::catalog::Catalogs;
use crate::crypto::{CryptoCatalog, EncryptedColumn};
use crate::links::{FkCatalog, FkLink};
use crate::privilege::{ChildLink, PrivilegeCatalog, RowScope, TablePrivilege};

fn self_scope(column: &str) -> RowScope {
    RowScope::SelfRows {
        column: column.to_owned(),
    }
}

fn guarded_children() -> RowScope {
    RowScope::Children(ChildLink {
        parent_table: "students".to_owned(),
        child_column: "StuID".to_owned(),
        parent_key: "StuID".to_owned(),
        owner_column: "GuaID".to_owned(),
    })
}

fn person_name(display_alias: &str, target_table: &str, target_key: &str) -> FkLink {
    FkLink {
        target_table: target_table.to_owned(),
        target_key: target_key.to_owned(),
        display_template: "CONCAT({alias}.`first_name`, ' ', {alias}.`last_name`)".to_owned(),
        display_alias: display_alias.to_owned(),
    }
}

/// The university records catalog.
#[must_use]
pub fn university() -> Catalogs {
    let privileges = PrivilegeCatalog::new()
        // Students see and maintain their own records.
        .with_table(
            "student",
            "students",
            TablePrivilege::read_only(self_scope("StuID")).with_updatable([
                "last_name",
                "first_name",
                "gender",
                "Id_No",
                "address",
                "phone",
                "email",
                "guardian_relation",
            ]),
        )
        .with_table(
            "student",
            "grades",
            TablePrivilege::read_only(self_scope("StuID")),
        )
        .with_table(
            "student",
            "disciplinary_records",
            TablePrivilege::read_only(self_scope("StuID")),
        )
        // Guardians see their own contact row plus their students' records.
        .with_table(
            "guardian",
            "guardians",
            TablePrivilege::read_only(self_scope("GuaID")).with_updatable([
                "last_name",
                "first_name",
                "email",
                "phone",
            ]),
        )
        .with_table(
            "guardian",
            "grades",
            TablePrivilege::read_only(guarded_children()),
        )
        .with_table(
            "guardian",
            "disciplinary_records",
            TablePrivilege::read_only(guarded_children()),
        )
        // Academic records officer administers grades.
        .with_table(
            "aro",
            "grades",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["StuID", "CID", "term", "grade", "comments"])
                .with_updatable(["grade", "term", "comments"])
                .with_deletable(),
        )
        // Discipline records officer administers disciplinary records.
        .with_table(
            "dro",
            "disciplinary_records",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["StuID", "date", "StfID", "descriptions"])
                .with_updatable(["date", "descriptions"])
                .with_deletable(),
        )
        // Unrestricted testing role.
        .with_table(
            "root",
            "students",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable([
                    "StuID",
                    "last_name",
                    "first_name",
                    "gender",
                    "Id_No",
                    "address",
                    "phone",
                    "email",
                    "guardian_relation",
                ])
                .with_updatable([
                    "last_name",
                    "first_name",
                    "gender",
                    "Id_No",
                    "address",
                    "phone",
                    "email",
                    "guardian_relation",
                ])
                .with_deletable(),
        )
        .with_table(
            "root",
            "guardians",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["GuaID", "last_name", "first_name", "email", "phone"])
                .with_updatable(["last_name", "first_name", "email", "phone"])
                .with_deletable(),
        )
        .with_table(
            "root",
            "grades",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["GradeID", "StuID", "CID", "term", "grade", "comments"])
                .with_updatable(["grade", "term", "comments"])
                .with_deletable(),
        )
        .with_table(
            "root",
            "disciplinary_records",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["DrID", "StuID", "date", "StfID", "descriptions"])
                .with_updatable(["date", "descriptions"])
                .with_deletable(),
        )
        .with_table(
            "root",
            "courses",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["CID", "course_name", "description"])
                .with_updatable(["course_name", "description"])
                .with_deletable(),
        )
        .with_table(
            "root",
            "staffs",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["StfID", "last_name", "first_name", "email", "phone"])
                .with_updatable(["last_name", "first_name", "email", "phone"])
                .with_deletable(),
        )
        .with_table(
            "root",
            "dataUpdateLog",
            TablePrivilege::read_only(RowScope::All)
                .with_insertable(["LogID", "user_id", "user_role", "sql_text"])
                .with_updatable(["sql_text"])
                .with_deletable(),
        );

    let foreign_keys = FkCatalog::new()
        .with_link(
            "students",
            "GuaID",
            person_name("Guardian name", "guardians", "GuaID"),
        )
        .with_link(
            "grades",
            "StuID",
            person_name("Student name", "students", "StuID"),
        )
        .with_link(
            "grades",
            "CID",
            FkLink {
                target_table: "courses".to_owned(),
                target_key: "CID".to_owned(),
                display_template: "{alias}.`course_name`".to_owned(),
                display_alias: "Course Name".to_owned(),
            },
        )
        .with_link(
            "disciplinary_records",
            "StuID",
            person_name("Student Name", "students", "StuID"),
        )
        .with_link(
            "disciplinary_records",
            "StfID",
            person_name("Staff Name", "staffs", "StfID"),
        );

    let encrypted = CryptoCatalog::new()
        .with_column(
            "students",
            "identification_number",
            EncryptedColumn::default(),
        )
        .with_column("students", "address", EncryptedColumn::default())
        .with_column(
            "staffs",
            "identification_number",
            EncryptedColumn::default(),
        )
        .with_column("staffs", "address", EncryptedColumn::default())
        .with_column("guardians", "address", EncryptedColumn::default());

    Catalogs {
        privileges,
        foreign_keys,
        encrypted,
    }
}
