use postgres::{Client, NoTls};

use crate::backend::{Backend, Postgres};
use crate::connection::{DbError, SchemaConnection};
use crate::schema::ColumnInfo;

const COLUMNS_QUERY: &str = "SELECT column_name::text, data_type::text, is_nullable::text
     FROM information_schema.columns
     WHERE table_schema = current_schema() AND table_name = $1
     ORDER BY ordinal_position";

const TABLE_EXISTS_QUERY: &str = "SELECT EXISTS (
         SELECT 1 FROM information_schema.tables
         WHERE table_schema = current_schema() AND table_name = $1
     )";

const INDEXES_QUERY: &str = "SELECT indexname::text
     FROM pg_indexes
     WHERE schemaname = current_schema() AND tablename = $1
     ORDER BY indexname";

pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    /// Connect with a libpq-style key/value string or a `postgres://` URL.
    pub fn connect(params: &str) -> Result<Self, DbError> {
        let client =
            Client::connect(params, NoTls).map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

fn db_error(e: postgres::Error) -> DbError {
    if e.is_closed() {
        DbError::Connection(e.to_string())
    } else {
        match e.as_db_error() {
            Some(db) => DbError::Query(db.message().to_string()),
            None => DbError::Query(e.to_string()),
        }
    }
}

impl SchemaConnection for PostgresConnection {
    fn backend(&self) -> &dyn Backend {
        &Postgres
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, DbError> {
        let row = self
            .client
            .query_one(TABLE_EXISTS_QUERY, &[&table])
            .map_err(db_error)?;
        Ok(row.get(0))
    }

    fn columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        let rows = self
            .client
            .query(COLUMNS_QUERY, &[&table])
            .map_err(db_error)?;

        Ok(rows
            .iter()
            .map(|row| {
                let nullable: String = row.get(2);
                ColumnInfo::new(row.get::<_, String>(0), row.get::<_, String>(1), nullable == "YES")
            })
            .collect())
    }

    fn indexes(&mut self, table: &str) -> Result<Vec<String>, DbError> {
        let rows = self
            .client
            .query(INDEXES_QUERY, &[&table])
            .map_err(db_error)?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.client.batch_execute(sql).map_err(db_error)
    }

    fn close(self) -> Result<(), DbError> {
        self.client
            .close()
            .map_err(|e| DbError::Connection(e.to_string()))
    }
}
