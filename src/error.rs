use thiserror::Error;

use crate::ident::IdentifierError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The database could not be reached or refused the credentials.
    #[error("connection error: {0}")]
    Connection(String),

    /// Schema metadata could not be read, or the target table is missing.
    #[error("failed to inspect table {table}: {message}")]
    Inspection { table: String, message: String },

    /// The database rejected a step's DDL after its precondition check.
    #[error("step '{step}' on table {table} failed: {message}")]
    Application {
        table: String,
        step: String,
        message: String,
    },

    #[error("step '{step}' on table {table} uses an invalid identifier: {source}")]
    InvalidIdentifier {
        table: String,
        step: String,
        #[source]
        source: IdentifierError,
    },
}

impl RunError {
    pub fn inspection(table: impl Into<String>, message: impl Into<String>) -> Self {
        RunError::Inspection {
            table: table.into(),
            message: message.into(),
        }
    }
}
