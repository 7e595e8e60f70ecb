mod column;
mod index;
mod sql;

pub use column::AddColumn;
pub use index::{CreateIndex, Index, IndexOrder};
pub use sql::RunSql;

use crate::backend::Backend;
use crate::ident::{Identifier, IdentifierError};
use crate::schema::SchemaSnapshot;

/// A named, idempotent schema change against a single table.
pub trait MigrationStep: Send + Sync {
    fn describe(&self) -> String;

    /// Label printed next to the precondition result, e.g. `Has gym_id column`.
    fn check_label(&self) -> String;

    /// True iff the step's effect is already present in `snapshot`.
    fn is_applied(&self, snapshot: &SchemaSnapshot) -> bool;

    /// Refuses the step when `snapshot` lacks something it builds on, with a
    /// message for the report. Called only for steps not yet applied.
    fn check_prerequisites(&self, _snapshot: &SchemaSnapshot) -> Result<(), String> {
        Ok(())
    }

    /// Statements to execute, in order. Fails before producing any SQL if a
    /// name the step interpolates is not a valid identifier.
    fn statements(
        &self,
        backend: &dyn Backend,
        table: &Identifier,
    ) -> Result<Vec<String>, IdentifierError>;
}
