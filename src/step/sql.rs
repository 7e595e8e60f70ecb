use std::fmt;

use crate::backend::Backend;
use crate::ident::{Identifier, IdentifierError};
use crate::schema::SchemaSnapshot;
use crate::step::MigrationStep;

type Precondition = Box<dyn Fn(&SchemaSnapshot) -> bool + Send + Sync>;

/// Raw SQL batch, for changes whose effect is not a column or an index
/// (data backfills, constraints).
///
/// The statements are executed verbatim, so they are expected to be
/// authored, not assembled from external input. A precondition is required:
/// the runner has no other way to tell whether the batch already ran.
pub struct RunSql {
    description: String,
    sql: Vec<String>,
    applied_when: Precondition,
}

impl fmt::Debug for RunSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunSql")
            .field("description", &self.description)
            .field("sql", &self.sql)
            .finish_non_exhaustive()
    }
}

impl RunSql {
    pub fn new<F>(description: impl Into<String>, sql: impl Into<String>, applied_when: F) -> Self
    where
        F: Fn(&SchemaSnapshot) -> bool + Send + Sync + 'static,
    {
        Self::multiple(description, vec![sql.into()], applied_when)
    }

    pub fn multiple<F>(description: impl Into<String>, sql: Vec<String>, applied_when: F) -> Self
    where
        F: Fn(&SchemaSnapshot) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            sql,
            applied_when: Box::new(applied_when),
        }
    }
}

impl MigrationStep for RunSql {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn check_label(&self) -> String {
        format!("Already applied ({})", self.description)
    }

    fn is_applied(&self, snapshot: &SchemaSnapshot) -> bool {
        (self.applied_when)(snapshot)
    }

    fn statements(
        &self,
        _backend: &dyn Backend,
        _table: &Identifier,
    ) -> Result<Vec<String>, IdentifierError> {
        Ok(self.sql.clone())
    }
}
