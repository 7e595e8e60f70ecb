//! Migration sets shipped with the binary.

use crate::column::{Column, ColumnType, ReferentialAction};
use crate::step::{AddColumn, CreateIndex, Index, MigrationStep};

/// Ordered steps against a single table.
pub struct MigrationSet {
    pub name: &'static str,
    pub table: &'static str,
    pub steps: Vec<Box<dyn MigrationStep>>,
}

impl std::fmt::Debug for MigrationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationSet")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("steps", &format!("[{} steps]", self.steps.len()))
            .finish()
    }
}

/// Scopes membership plans to a gym. The index depends on the column.
pub fn plans_gym_id() -> MigrationSet {
    MigrationSet {
        name: "plans",
        table: "plans",
        steps: vec![
            Box::new(AddColumn::new(
                Column::new("gym_id", ColumnType::Integer)
                    .references("gyms", "id")
                    .on_delete(ReferentialAction::Cascade),
            )),
            Box::new(CreateIndex::new(
                Index::new("idx_plans_gym_id").column("gym_id"),
            )),
        ],
    }
}

/// Face-recognition enrolment data on members.
pub fn members_face_id() -> MigrationSet {
    MigrationSet {
        name: "face-id",
        table: "members",
        steps: vec![
            Box::new(AddColumn::new(Column::new(
                "face_descriptor",
                ColumnType::JsonB,
            ))),
            Box::new(AddColumn::new(Column::new(
                "face_image_url",
                ColumnType::Text,
            ))),
            Box::new(AddColumn::new(Column::new(
                "face_registered_at",
                ColumnType::TimestampTz,
            ))),
        ],
    }
}

pub fn all() -> Vec<MigrationSet> {
    vec![plans_gym_id(), members_face_id()]
}

pub fn find(name: &str) -> Option<MigrationSet> {
    all().into_iter().find(|set| set.name == name)
}
