pub mod backend;
pub mod catalog;
pub mod column;
pub mod config;
pub mod connection;
pub mod error;
pub mod ident;
pub mod report;
pub mod runner;
pub mod schema;
pub mod step;

pub mod prelude {
    pub use crate::backend::{Backend, MySql, Postgres, Sqlite};
    pub use crate::catalog::MigrationSet;
    pub use crate::column::{Column, ColumnType, ForeignKey, ReferentialAction};
    pub use crate::config::DatabaseConfig;
    pub use crate::connection::{DbError, SchemaConnection};
    pub use crate::error::RunError;
    pub use crate::ident::{Identifier, IdentifierError};
    pub use crate::report::{MigrationRun, StepOutcome};
    pub use crate::runner::{PlannedStep, Runner};
    pub use crate::schema::{has_column, ColumnInfo, SchemaSnapshot};
    pub use crate::step::{AddColumn, CreateIndex, Index, IndexOrder, MigrationStep, RunSql};

    #[cfg(feature = "sqlite")]
    pub use crate::connection::SqliteConnection;

    #[cfg(feature = "postgres")]
    pub use crate::connection::PostgresConnection;

    #[cfg(feature = "mysql")]
    pub use crate::connection::MySqlConnection;
}
