use std::path::Path;

use rusqlite::config::DbConfig;
use rusqlite::Connection;

use crate::backend::{Backend, Sqlite};
use crate::connection::{DbError, SchemaConnection};
use crate::schema::ColumnInfo;

pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path).map_err(|e| DbError::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Wraps an existing handle. Double-quoted string literals are switched
    /// off so that a quoted unknown column is an error instead of a constant.
    pub fn from_connection(conn: Connection) -> Result<Self, DbError> {
        for config in [DbConfig::SQLITE_DBCONFIG_DQS_DDL, DbConfig::SQLITE_DBCONFIG_DQS_DML] {
            conn.set_db_config(config, false)
                .map_err(|e| DbError::Connection(e.to_string()))?;
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn query_error(e: rusqlite::Error) -> DbError {
    DbError::Query(e.to_string())
}

impl SchemaConnection for SqliteConnection {
    fn backend(&self) -> &dyn Backend {
        &Sqlite
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, DbError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .map_err(query_error)?;
        Ok(count > 0)
    }

    fn columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(query_error)?;

        let columns = stmt
            .query_map([table], |row| {
                let not_null: i64 = row.get(2)?;
                Ok(ColumnInfo::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    not_null == 0,
                ))
            })
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        Ok(columns)
    }

    fn indexes(&mut self, table: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_index_list(?1) ORDER BY name")
            .map_err(query_error)?;

        let names = stmt
            .query_map([table], |row| row.get(0))
            .map_err(query_error)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(query_error)?;

        Ok(names)
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.conn.execute_batch(sql).map_err(query_error)
    }

    fn close(self) -> Result<(), DbError> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::Connection(e.to_string()))
    }
}
