mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use sea_query::{Alias, ColumnDef, Index as SeaIndex, IndexCreateStatement, Table, TableAlterStatement};

use crate::column::{Column, ColumnType, ForeignKey, ReferentialAction};
use crate::ident::MAX_IDENTIFIER_LEN;
use crate::step::{Index, IndexOrder};

/// SQL dialect used to render DDL.
///
/// Callers validate identifiers before handing them to a backend; the
/// backend only quotes them.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String;
    fn build_index_create(&self, stmt: IndexCreateStatement) -> String;

    fn quote_identifier(&self, name: &str) -> String;

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        let mut col = column_def(column);

        if let Some(ref fk) = column.references {
            col.extra(self.references_clause(fk));
        }

        let stmt = Table::alter()
            .table(Alias::new(table))
            .add_column(col)
            .to_owned();
        self.build_table_alter(stmt)
    }

    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        let mut stmt = SeaIndex::create();
        stmt.name(&index.name).table(Alias::new(table));

        if index.unique {
            stmt.unique();
        }

        for (col_name, order) in &index.columns {
            match order {
                IndexOrder::Asc => stmt.col(Alias::new(col_name)),
                IndexOrder::Desc => stmt.col((Alias::new(col_name), sea_query::IndexOrder::Desc)),
            };
        }

        let sql = self.build_index_create(stmt.to_owned());
        match index.where_clause {
            Some(ref condition) => format!("{} WHERE {}", sql, condition),
            None => sql,
        }
    }

    /// Inline `REFERENCES` clause for a column definition. Actions left at
    /// `NO ACTION` are omitted since that is every dialect's default.
    fn references_clause(&self, fk: &ForeignKey) -> String {
        let mut clause = format!(
            "REFERENCES {} ({})",
            self.quote_identifier(&fk.table),
            self.quote_identifier(&fk.column)
        );
        if fk.on_delete != ReferentialAction::NoAction {
            clause.push_str(" ON DELETE ");
            clause.push_str(fk.on_delete.as_sql());
        }
        if fk.on_update != ReferentialAction::NoAction {
            clause.push_str(" ON UPDATE ");
            clause.push_str(fk.on_update.as_sql());
        }
        clause
    }
}

/// `fk_<table>_<column>`, cut to the identifier length limit.
fn foreign_key_name(table: &str, column: &str) -> String {
    let mut name = format!("fk_{}_{}", table, column);
    name.truncate(MAX_IDENTIFIER_LEN);
    name
}

fn column_def(column: &Column) -> ColumnDef {
    let mut col = ColumnDef::new(Alias::new(&column.name));

    apply_column_type(&mut col, &column.column_type);

    if !column.nullable {
        col.not_null();
    }

    if column.unique {
        col.unique_key();
    }

    if let Some(ref default) = column.default {
        col.default(sea_query::Expr::cust(default));
    }

    col
}

fn apply_column_type(col: &mut ColumnDef, column_type: &ColumnType) {
    match column_type {
        ColumnType::Integer => {
            col.integer();
        }
        ColumnType::BigInt => {
            col.big_integer();
        }
        ColumnType::SmallInt => {
            col.small_integer();
        }
        ColumnType::Text => {
            col.text();
        }
        ColumnType::VarChar(len) => {
            col.string_len(*len);
        }
        ColumnType::Boolean => {
            col.boolean();
        }
        ColumnType::Timestamp => {
            col.timestamp();
        }
        ColumnType::TimestampTz => {
            col.timestamp_with_time_zone();
        }
        ColumnType::Date => {
            col.date();
        }
        ColumnType::Uuid => {
            col.uuid();
        }
        ColumnType::Json => {
            col.json();
        }
        ColumnType::JsonB => {
            col.json_binary();
        }
        ColumnType::Real => {
            col.float();
        }
        ColumnType::DoublePrecision => {
            col.double();
        }
        ColumnType::Decimal { precision, scale } => {
            col.decimal_len(*precision, *scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_clause_omits_default_actions() {
        let fk = ForeignKey {
            table: "gyms".to_string(),
            column: "id".to_string(),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        };
        assert_eq!(Postgres.references_clause(&fk), "REFERENCES \"gyms\" (\"id\")");
    }

    #[test]
    fn references_clause_renders_both_actions() {
        let fk = ForeignKey {
            table: "gyms".to_string(),
            column: "id".to_string(),
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::SetNull,
        };
        assert_eq!(
            MySql.references_clause(&fk),
            "REFERENCES `gyms` (`id`) ON DELETE CASCADE ON UPDATE SET NULL"
        );
    }

    #[test]
    fn foreign_key_name_fits_identifier_limit() {
        assert_eq!(foreign_key_name("plans", "gym_id"), "fk_plans_gym_id");

        let long = "a".repeat(MAX_IDENTIFIER_LEN);
        assert_eq!(foreign_key_name(&long, "gym_id").len(), MAX_IDENTIFIER_LEN);
    }

    #[test]
    fn add_column_sql_carries_default_and_not_null() {
        let column = Column::new("status", ColumnType::Text)
            .not_null()
            .default("'active'");

        let sql = Sqlite.add_column_sql("plans", &column);
        assert!(sql.contains("ADD COLUMN \"status\""));
        assert!(sql.contains("NOT NULL"));
        assert!(sql.contains("DEFAULT 'active'"));
    }
}
