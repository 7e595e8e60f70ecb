use sea_query::{IndexCreateStatement, PostgresQueryBuilder, TableAlterStatement};

use crate::backend::Backend;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Backend for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn build_index_create(&self, stmt: IndexCreateStatement) -> String {
        stmt.to_string(PostgresQueryBuilder)
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
