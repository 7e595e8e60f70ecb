use std::fmt;

/// One row of column metadata as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable,
        }
    }
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (nullable: {})",
            self.name,
            self.data_type,
            if self.is_nullable { "YES" } else { "NO" }
        )
    }
}

/// Live shape of a single table, recomputed on every inspection.
///
/// A table that does not exist yields an empty snapshot with `exists` unset;
/// inspecting a missing table is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub table: String,
    pub exists: bool,
    /// Ordered by ordinal position.
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<String>,
}

impl SchemaSnapshot {
    pub fn missing(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        has_column(self, name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Case-sensitive exact match against the snapshot's column names.
pub fn has_column(snapshot: &SchemaSnapshot, column_name: &str) -> bool {
    snapshot.columns.iter().any(|c| c.name == column_name)
}
