use sea_query::{IndexCreateStatement, SqliteQueryBuilder, TableAlterStatement};

use crate::backend::Backend;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Backend for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_index_create(&self, stmt: IndexCreateStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
