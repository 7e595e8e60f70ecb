use crate::backend::Backend;
use crate::column::Column;
use crate::ident::{Identifier, IdentifierError};
use crate::schema::SchemaSnapshot;
use crate::step::MigrationStep;

#[derive(Debug, Clone)]
pub struct AddColumn {
    pub column: Column,
}

impl AddColumn {
    pub fn new(column: Column) -> Self {
        Self { column }
    }
}

impl MigrationStep for AddColumn {
    fn describe(&self) -> String {
        match self.column.references {
            Some(ref fk) => format!(
                "Add column {} referencing {}({})",
                self.column.name, fk.table, fk.column
            ),
            None => format!("Add column {}", self.column.name),
        }
    }

    fn check_label(&self) -> String {
        format!("Has {} column", self.column.name)
    }

    fn is_applied(&self, snapshot: &SchemaSnapshot) -> bool {
        snapshot.has_column(&self.column.name)
    }

    fn statements(
        &self,
        backend: &dyn Backend,
        table: &Identifier,
    ) -> Result<Vec<String>, IdentifierError> {
        self.column.validate()?;
        Ok(vec![backend.add_column_sql(table.as_str(), &self.column)])
    }
}
