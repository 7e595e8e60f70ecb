use tracing::{debug, info, warn};

use crate::connection::{DbError, SchemaConnection};
use crate::error::RunError;
use crate::ident::Identifier;
use crate::report::{Check, MigrationRun, StepOutcome, StepRecord};
use crate::schema::SchemaSnapshot;
use crate::step::MigrationStep;

/// What a step would do if run now. Produced by [`Runner::plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub description: String,
    pub already_applied: bool,
    /// Empty when `already_applied`.
    pub statements: Vec<String>,
}

/// Applies idempotent steps to one table at a time over an owned connection.
///
/// Whether a step has run is derived from the live schema on every call;
/// nothing is recorded between runs. The connection is released by
/// [`Runner::close`] or when the runner is dropped.
pub struct Runner<C: SchemaConnection> {
    conn: C,
}

impl<C: SchemaConnection> Runner<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_connection(self) -> C {
        self.conn
    }

    pub fn close(self) -> Result<(), RunError> {
        self.conn.close().map_err(|e| RunError::Connection(e.to_string()))
    }

    pub fn inspect_schema(&mut self, table: &str) -> Result<SchemaSnapshot, RunError> {
        let inspect_err = |e: DbError| match e {
            DbError::Connection(message) => RunError::Connection(message),
            DbError::Query(message) => RunError::inspection(table, message),
        };

        if !self.conn.table_exists(table).map_err(inspect_err)? {
            debug!(table, "table does not exist");
            return Ok(SchemaSnapshot::missing(table));
        }

        let columns = self.conn.columns(table).map_err(inspect_err)?;
        let indexes = self.conn.indexes(table).map_err(inspect_err)?;
        debug!(table, columns = columns.len(), indexes = indexes.len(), "inspected schema");

        Ok(SchemaSnapshot {
            table: table.to_string(),
            exists: true,
            columns,
            indexes,
        })
    }

    /// Re-inspects `table`, then executes the step unless its effect is
    /// already present.
    ///
    /// The fresh inspection narrows, but does not close, the window in which
    /// a concurrent process could apply the same change.
    pub fn apply_step(&mut self, table: &Identifier, step: &dyn MigrationStep) -> StepOutcome {
        let description = step.describe();

        let snapshot = match self.inspect_schema(table.as_str()) {
            Ok(snapshot) => snapshot,
            Err(e) => return StepOutcome::Failed(e),
        };

        if step.is_applied(&snapshot) {
            info!(table = %table, step = %description, "already applied, skipping");
            return StepOutcome::Skipped;
        }

        if let Err(message) = step.check_prerequisites(&snapshot) {
            return StepOutcome::Failed(RunError::Application {
                table: table.to_string(),
                step: description,
                message,
            });
        }

        let statements = match step.statements(self.conn.backend(), table) {
            Ok(statements) => statements,
            Err(source) => {
                return StepOutcome::Failed(RunError::InvalidIdentifier {
                    table: table.to_string(),
                    step: description,
                    source,
                })
            }
        };

        for sql in &statements {
            debug!(table = %table, sql = %sql, "executing");
            if let Err(e) = self.conn.execute(sql) {
                let error = match e {
                    DbError::Connection(message) => RunError::Connection(message),
                    DbError::Query(message) => RunError::Application {
                        table: table.to_string(),
                        step: description,
                        message,
                    },
                };
                return StepOutcome::Failed(error);
            }
        }

        info!(table = %table, step = %description, "applied");
        StepOutcome::Applied
    }

    /// Applies `steps` in order, halting at the first failure.
    pub fn run(&mut self, table: &str, steps: &[Box<dyn MigrationStep>]) -> MigrationRun {
        let mut run = MigrationRun::new(table);
        let all_pending = || steps.iter().map(|s| s.describe()).collect::<Vec<_>>();

        let ident = match Identifier::new(table) {
            Ok(ident) => ident,
            Err(source) => {
                let error = RunError::InvalidIdentifier {
                    table: table.to_string(),
                    step: "target table".to_string(),
                    source,
                };
                warn!(table, error = %error, "refusing to run");
                return run.abort(error, all_pending());
            }
        };

        info!(
            table,
            backend = self.conn.backend().name(),
            steps = steps.len(),
            "starting migration run"
        );

        let initial = match self.inspect_schema(table) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(table, error = %e, "inspection failed");
                return run.abort(e, all_pending());
            }
        };

        if !initial.exists {
            run.initial = Some(initial);
            let error = RunError::inspection(table, "table does not exist");
            warn!(table, "table does not exist");
            return run.abort(error, all_pending());
        }

        run.checks = steps
            .iter()
            .map(|step| Check {
                label: step.check_label(),
                satisfied: step.is_applied(&initial),
            })
            .collect();
        run.initial = Some(initial);

        for (i, step) in steps.iter().enumerate() {
            let outcome = self.apply_step(&ident, step.as_ref());
            let failed = outcome.is_failed();

            if let StepOutcome::Failed(ref e) = outcome {
                warn!(table, step = %step.describe(), error = %e, "step failed, halting run");
            }

            run.steps.push(StepRecord {
                description: step.describe(),
                outcome,
            });

            if failed {
                run.not_attempted = steps[i + 1..].iter().map(|s| s.describe()).collect();
                break;
            }
        }

        if run.is_success() {
            info!(table, applied = run.applied(), skipped = run.skipped(), "migration run complete");
        }

        run
    }

    /// Dry run: reports what [`Runner::run`] would do without issuing DDL.
    pub fn plan(
        &mut self,
        table: &str,
        steps: &[Box<dyn MigrationStep>],
    ) -> Result<Vec<PlannedStep>, RunError> {
        let ident = Identifier::new(table).map_err(|source| RunError::InvalidIdentifier {
            table: table.to_string(),
            step: "target table".to_string(),
            source,
        })?;

        let snapshot = self.inspect_schema(table)?;
        if !snapshot.exists {
            return Err(RunError::inspection(table, "table does not exist"));
        }

        let mut planned = Vec::with_capacity(steps.len());
        for step in steps {
            let description = step.describe();
            let already_applied = step.is_applied(&snapshot);
            let statements = if already_applied {
                Vec::new()
            } else {
                step.statements(self.conn.backend(), &ident)
                    .map_err(|source| RunError::InvalidIdentifier {
                        table: table.to_string(),
                        step: description.clone(),
                        source,
                    })?
            };

            planned.push(PlannedStep {
                description,
                already_applied,
                statements,
            });
        }

        Ok(planned)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::backend::{Backend, Postgres};
    use crate::column::{Column, ColumnType, ReferentialAction};
    use crate::schema::ColumnInfo;
    use crate::step::{AddColumn, CreateIndex, Index, RunSql};

    /// In-process stand-in for a database. Understands just enough of the
    /// generated DDL to reflect added columns and indexes.
    #[derive(Default)]
    struct FakeConnection {
        tables: HashMap<String, Vec<ColumnInfo>>,
        indexes: HashMap<String, Vec<String>>,
        executed: Vec<String>,
        inspections: usize,
        fail_execute: Option<DbError>,
        fail_inspect: Option<DbError>,
        /// Column another process adds right after the first inspection.
        concurrent_column: Option<(String, ColumnInfo)>,
    }

    impl FakeConnection {
        fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
            self.tables.insert(
                table.to_string(),
                columns
                    .iter()
                    .map(|c| ColumnInfo::new(*c, "integer", true))
                    .collect(),
            );
            self
        }

        fn quoted_after<'a>(sql: &'a str, marker: &str) -> Option<&'a str> {
            let rest = &sql[sql.find(marker)? + marker.len()..];
            let rest = rest.strip_prefix('"')?;
            Some(&rest[..rest.find('"')?])
        }

        fn table_of(sql: &str) -> Option<String> {
            Self::quoted_after(sql, "ALTER TABLE ")
                .or_else(|| Self::quoted_after(sql, " ON "))
                .map(str::to_string)
        }
    }

    impl SchemaConnection for FakeConnection {
        fn backend(&self) -> &dyn Backend {
            &Postgres
        }

        fn table_exists(&mut self, table: &str) -> Result<bool, DbError> {
            if let Some(ref e) = self.fail_inspect {
                return Err(e.clone());
            }
            self.inspections += 1;
            if self.inspections == 2 {
                if let Some((t, column)) = self.concurrent_column.take() {
                    self.tables.entry(t).or_default().push(column);
                }
            }
            Ok(self.tables.contains_key(table))
        }

        fn columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
            Ok(self.tables.get(table).cloned().unwrap_or_default())
        }

        fn indexes(&mut self, table: &str) -> Result<Vec<String>, DbError> {
            Ok(self.indexes.get(table).cloned().unwrap_or_default())
        }

        fn execute(&mut self, sql: &str) -> Result<(), DbError> {
            self.executed.push(sql.to_string());
            if let Some(ref e) = self.fail_execute {
                return Err(e.clone());
            }

            let table = Self::table_of(sql).unwrap_or_default();
            if let Some(column) = Self::quoted_after(sql, "ADD COLUMN ") {
                self.tables
                    .entry(table.clone())
                    .or_default()
                    .push(ColumnInfo::new(column, "integer", true));
            }
            if let Some(index) = Self::quoted_after(sql, "CREATE INDEX ") {
                self.indexes.entry(table).or_default().push(index.to_string());
            }
            Ok(())
        }
    }

    fn plans_steps() -> Vec<Box<dyn MigrationStep>> {
        vec![
            Box::new(AddColumn::new(
                Column::new("gym_id", ColumnType::Integer)
                    .references("gyms", "id")
                    .on_delete(ReferentialAction::Cascade),
            )),
            Box::new(CreateIndex::new(Index::new("idx_plans_gym_id").column("gym_id"))),
        ]
    }

    fn plans_table() -> Identifier {
        Identifier::new("plans").unwrap()
    }

    #[test]
    fn inspect_schema_of_missing_table_is_empty() {
        let mut runner = Runner::new(FakeConnection::default());
        let snapshot = runner.inspect_schema("plans").unwrap();
        assert!(!snapshot.exists);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn inspect_schema_maps_errors() {
        let conn = FakeConnection {
            fail_inspect: Some(DbError::Query("permission denied".into())),
            ..Default::default()
        };
        let mut runner = Runner::new(conn);
        assert_eq!(
            runner.inspect_schema("plans"),
            Err(RunError::inspection("plans", "permission denied"))
        );

        runner.connection_mut().fail_inspect = Some(DbError::Connection("reset by peer".into()));
        assert_eq!(
            runner.inspect_schema("plans"),
            Err(RunError::Connection("reset by peer".into()))
        );
    }

    #[test]
    fn apply_step_skips_when_present_and_issues_no_ddl() {
        let conn = FakeConnection::default().with_table("plans", &["id", "gym_id"]);
        let mut runner = Runner::new(conn);

        let steps = plans_steps();
        let outcome = runner.apply_step(&plans_table(), steps[0].as_ref());

        assert_eq!(outcome, StepOutcome::Skipped);
        assert!(runner.connection().executed.is_empty());
    }

    #[test]
    fn apply_step_issues_exactly_one_statement_when_absent() {
        let conn = FakeConnection::default().with_table("plans", &["id"]);
        let mut runner = Runner::new(conn);

        let steps = plans_steps();
        let outcome = runner.apply_step(&plans_table(), steps[0].as_ref());

        assert_eq!(outcome, StepOutcome::Applied);
        assert_eq!(runner.connection().executed.len(), 1);
        assert!(runner
            .inspect_schema("plans")
            .unwrap()
            .has_column("gym_id"));
    }

    #[test]
    fn apply_step_rechecks_against_fresh_schema() {
        let mut conn = FakeConnection::default().with_table("plans", &["id"]);
        conn.concurrent_column = Some(("plans".into(), ColumnInfo::new("gym_id", "integer", true)));
        let mut runner = Runner::new(conn);

        let steps = plans_steps();
        let run = runner.run("plans", &steps[..1]);

        assert!(!run.checks[0].satisfied);
        assert_eq!(run.steps[0].outcome, StepOutcome::Skipped);
        assert!(runner.connection().executed.is_empty());
    }

    #[test]
    fn run_applies_in_order() {
        let conn = FakeConnection::default().with_table("plans", &["id", "name"]);
        let mut runner = Runner::new(conn);

        let run = runner.run("plans", &plans_steps());

        assert!(run.is_success());
        assert_eq!(run.exit_code(), 0);
        assert_eq!(run.applied(), 2);
        let executed = &runner.connection().executed;
        assert!(executed[0].contains("ADD COLUMN \"gym_id\""));
        assert!(executed[1].contains("CREATE INDEX \"idx_plans_gym_id\""));
    }

    #[test]
    fn second_run_skips_every_step() {
        let conn = FakeConnection::default().with_table("plans", &["id"]);
        let mut runner = Runner::new(conn);

        let first = runner.run("plans", &plans_steps());
        assert_eq!(first.applied(), 2);

        let second = runner.run("plans", &plans_steps());
        assert!(second.is_success());
        assert_eq!(second.skipped(), 2);
        assert_eq!(second.applied(), 0);
        assert_eq!(runner.connection().executed.len(), 2);
    }

    #[test]
    fn failure_halts_before_dependent_step() {
        let conn = FakeConnection {
            fail_execute: Some(DbError::Query("relation \"gyms\" does not exist".into())),
            ..Default::default()
        }
        .with_table("plans", &["id"]);
        let mut runner = Runner::new(conn);

        let run = runner.run("plans", &plans_steps());

        assert_eq!(run.exit_code(), 1);
        assert_eq!(run.steps.len(), 1);
        assert_eq!(
            run.not_attempted,
            vec!["Create index idx_plans_gym_id on (gym_id)".to_string()]
        );
        assert_eq!(runner.connection().executed.len(), 1);
        assert_eq!(
            run.error(),
            Some(&RunError::Application {
                table: "plans".into(),
                step: "Add column gym_id referencing gyms(id)".into(),
                message: "relation \"gyms\" does not exist".into(),
            })
        );
    }

    #[test]
    fn missing_table_aborts_before_any_step() {
        let mut runner = Runner::new(FakeConnection::default());

        let run = runner.run("plans", &plans_steps());

        assert_eq!(run.exit_code(), 1);
        assert!(run.steps.is_empty());
        assert_eq!(run.not_attempted.len(), 2);
        assert!(runner.connection().executed.is_empty());
        assert!(run.to_string().contains("Table plans does not exist"));
    }

    #[test]
    fn invalid_table_name_is_rejected_without_queries() {
        let mut runner = Runner::new(FakeConnection::default());

        let run = runner.run("plans; DROP TABLE gyms", &plans_steps());

        assert!(matches!(run.error(), Some(RunError::InvalidIdentifier { .. })));
        assert_eq!(runner.connection().inspections, 0);
    }

    #[test]
    fn invalid_column_name_fails_step_before_sql() {
        let conn = FakeConnection::default().with_table("plans", &["id"]);
        let mut runner = Runner::new(conn);
        let steps: Vec<Box<dyn MigrationStep>> = vec![Box::new(AddColumn::new(Column::new(
            "gym_id INTEGER; --",
            ColumnType::Integer,
        )))];

        let run = runner.run("plans", &steps);

        assert!(matches!(run.error(), Some(RunError::InvalidIdentifier { .. })));
        assert!(runner.connection().executed.is_empty());
    }

    fn backfill_step() -> Vec<Box<dyn MigrationStep>> {
        vec![Box::new(RunSql::new(
            "Backfill gym_id",
            "UPDATE plans SET gym_id = 1 WHERE gym_id IS NULL",
            |s: &SchemaSnapshot| s.has_column("gym_id"),
        ))]
    }

    #[test]
    fn run_sql_step_skips_when_precondition_holds() {
        let conn = FakeConnection::default().with_table("plans", &["id", "gym_id"]);
        let mut runner = Runner::new(conn);

        let run = runner.run("plans", &backfill_step());

        assert_eq!(run.skipped(), 1);
        assert!(runner.connection().executed.is_empty());
    }

    #[test]
    fn run_sql_step_executes_when_precondition_fails() {
        let conn = FakeConnection::default().with_table("plans", &["id"]);
        let mut runner = Runner::new(conn);

        let run = runner.run("plans", &backfill_step());

        assert_eq!(run.applied(), 1);
        assert_eq!(
            runner.connection().executed,
            vec!["UPDATE plans SET gym_id = 1 WHERE gym_id IS NULL".to_string()]
        );
    }

    #[test]
    fn index_on_missing_column_fails_without_sql() {
        let conn = FakeConnection::default().with_table("plans", &["id", "name"]);
        let mut runner = Runner::new(conn);
        let steps = plans_steps();

        let run = runner.run("plans", &[steps.into_iter().nth(1).unwrap()]);

        assert_eq!(run.exit_code(), 1);
        assert_eq!(
            run.error(),
            Some(&RunError::Application {
                table: "plans".into(),
                step: "Create index idx_plans_gym_id on (gym_id)".into(),
                message: "column gym_id does not exist on plans".into(),
            })
        );
        assert!(runner.connection().executed.is_empty());
        assert!(!runner.inspect_schema("plans").unwrap().has_index("idx_plans_gym_id"));
    }

    #[test]
    fn plan_reports_without_executing() {
        let conn = FakeConnection::default().with_table("plans", &["id", "gym_id"]);
        let mut runner = Runner::new(conn);

        let plan = runner.plan("plans", &plans_steps()).unwrap();

        assert_eq!(plan.len(), 2);
        assert!(plan[0].already_applied);
        assert!(plan[0].statements.is_empty());
        assert!(!plan[1].already_applied);
        assert!(plan[1].statements[0].contains("CREATE INDEX"));
        assert!(runner.connection().executed.is_empty());
    }

    #[test]
    fn plan_fails_for_missing_table() {
        let mut runner = Runner::new(FakeConnection::default());
        assert_eq!(
            runner.plan("plans", &plans_steps()),
            Err(RunError::inspection("plans", "table does not exist"))
        );
    }

    #[test]
    fn close_releases_connection() {
        let runner = Runner::new(FakeConnection::default());
        assert!(runner.close().is_ok());
    }
}
