mod types;

pub use types::ColumnType;

use crate::ident::{Identifier, IdentifierError};

/// Definition of a column to be added to an existing table.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<String>,
    pub references: Option<ForeignKey>,
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            unique: false,
            default: None,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Raw SQL default expression, e.g. `"'active'"` or `"CURRENT_TIMESTAMP"`.
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
            on_delete: ReferentialAction::default(),
            on_update: ReferentialAction::default(),
        });
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        if let Some(ref mut fk) = self.references {
            fk.on_delete = action;
        }
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        if let Some(ref mut fk) = self.references {
            fk.on_update = action;
        }
        self
    }

    /// Checks every name this column interpolates into DDL.
    pub fn validate(&self) -> Result<(), IdentifierError> {
        Identifier::new(self.name.as_str())?;
        if let Some(ref fk) = self.references {
            Identifier::new(fk.table.as_str())?;
            Identifier::new(fk.column.as_str())?;
        }
        Ok(())
    }
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}
