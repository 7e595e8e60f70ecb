#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "mysql")]
mod mysql;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

#[cfg(feature = "postgres")]
pub use self::postgres::PostgresConnection;

#[cfg(feature = "mysql")]
pub use self::mysql::MySqlConnection;

use thiserror::Error;

use crate::backend::Backend;
use crate::schema::ColumnInfo;

/// Driver failure, split by whether the connection itself is gone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Query(String),
}

/// An owned database handle the runner inspects and alters the schema through.
///
/// Metadata methods take the table name as a bound parameter. `execute` runs
/// DDL verbatim.
pub trait SchemaConnection {
    fn backend(&self) -> &dyn Backend;

    fn table_exists(&mut self, table: &str) -> Result<bool, DbError>;

    /// Columns of `table` ordered by ordinal position; empty if the table is missing.
    fn columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, DbError>;

    fn indexes(&mut self, table: &str) -> Result<Vec<String>, DbError>;

    fn execute(&mut self, sql: &str) -> Result<(), DbError>;

    /// Release the connection. Dropping it has the same effect without
    /// reporting errors.
    fn close(self) -> Result<(), DbError>
    where
        Self: Sized,
    {
        Ok(())
    }
}
