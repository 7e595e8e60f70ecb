use crate::backend::Backend;
use crate::ident::{Identifier, IdentifierError};
use crate::schema::SchemaSnapshot;
use crate::step::MigrationStep;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum IndexOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    pub columns: Vec<(String, IndexOrder)>,
    pub unique: bool,
    pub where_clause: Option<String>,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            unique: false,
            where_clause: None,
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push((name.into(), IndexOrder::Asc));
        self
    }

    pub fn column_desc(mut self, name: impl Into<String>) -> Self {
        self.columns.push((name.into(), IndexOrder::Desc));
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Add a WHERE clause to create a partial index.
    /// The condition is raw SQL and is not validated.
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.where_clause = Some(condition.into());
        self
    }
}

/// Creates an index unless one with the same name already exists on the table.
#[derive(Debug, Clone)]
pub struct CreateIndex {
    pub index: Index,
}

impl CreateIndex {
    pub fn new(index: Index) -> Self {
        Self { index }
    }
}

impl MigrationStep for CreateIndex {
    fn describe(&self) -> String {
        let columns: Vec<&str> = self.index.columns.iter().map(|(c, _)| c.as_str()).collect();
        format!(
            "Create {}index {} on ({})",
            if self.index.unique { "unique " } else { "" },
            self.index.name,
            columns.join(", ")
        )
    }

    fn check_label(&self) -> String {
        format!("Has {} index", self.index.name)
    }

    fn is_applied(&self, snapshot: &SchemaSnapshot) -> bool {
        snapshot.has_index(&self.index.name)
    }

    fn check_prerequisites(&self, snapshot: &SchemaSnapshot) -> Result<(), String> {
        match self
            .index
            .columns
            .iter()
            .find(|(column, _)| !snapshot.has_column(column))
        {
            Some((column, _)) => Err(format!(
                "column {} does not exist on {}",
                column, snapshot.table
            )),
            None => Ok(()),
        }
    }

    fn statements(
        &self,
        backend: &dyn Backend,
        table: &Identifier,
    ) -> Result<Vec<String>, IdentifierError> {
        Identifier::new(self.index.name.as_str())?;
        for (column, _) in &self.index.columns {
            Identifier::new(column.as_str())?;
        }
        Ok(vec![backend.create_index_sql(table.as_str(), &self.index)])
    }
}
