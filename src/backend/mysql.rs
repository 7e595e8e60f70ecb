use sea_query::{Alias, IndexCreateStatement, MysqlQueryBuilder, Table, TableAlterStatement};

use crate::backend::{column_def, foreign_key_name, Backend};
use crate::column::Column;

/// MySQL parses an inline `REFERENCES` clause and then ignores it, so foreign
/// keys are added as a named constraint in the same `ALTER TABLE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Backend for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_index_create(&self, stmt: IndexCreateStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        let stmt = Table::alter()
            .table(Alias::new(table))
            .add_column(column_def(column))
            .to_owned();
        let sql = self.build_table_alter(stmt);

        match column.references {
            Some(ref fk) => format!(
                "{}, ADD CONSTRAINT {} FOREIGN KEY ({}) {}",
                sql,
                self.quote_identifier(&foreign_key_name(table, &column.name)),
                self.quote_identifier(&column.name),
                self.references_clause(fk)
            ),
            None => sql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnType, ReferentialAction};
    use crate::step::Index;

    #[test]
    fn mysql_backend_name() {
        assert_eq!(MySql.name(), "mysql");
    }

    #[test]
    fn mysql_add_column_uses_backticks() {
        let column = Column::new("face_image_url", ColumnType::Text);

        let sql = MySql.add_column_sql("members", &column);
        assert!(sql.contains("ALTER TABLE `members`"));
        assert!(sql.contains("ADD COLUMN `face_image_url`"));
    }

    #[test]
    fn mysql_add_column_with_foreign_key() {
        let column = Column::new("gym_id", ColumnType::Integer)
            .references("gyms", "id")
            .on_delete(ReferentialAction::Cascade);

        let sql = MySql.add_column_sql("plans", &column);
        assert!(sql.starts_with("ALTER TABLE `plans` ADD COLUMN `gym_id` int"));
        assert!(sql.ends_with(
            ", ADD CONSTRAINT `fk_plans_gym_id` FOREIGN KEY (`gym_id`) REFERENCES `gyms` (`id`) ON DELETE CASCADE"
        ));
        assert_eq!(sql.matches("REFERENCES").count(), 1);
    }

    #[test]
    fn mysql_create_index() {
        let index = Index::new("idx_plans_gym_id").column("gym_id");

        let sql = MySql.create_index_sql("plans", &index);
        assert!(sql.contains("CREATE INDEX `idx_plans_gym_id`"));
        assert!(sql.contains("`plans`"));
    }

    #[test]
    fn mysql_quote_identifier() {
        assert_eq!(MySql.quote_identifier("plans"), "`plans`");
        assert_eq!(MySql.quote_identifier("pl`ans"), "`pl``ans`");
    }
}
