use std::fmt;

use crate::error::RunError;
use crate::schema::SchemaSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The precondition held on a fresh inspection; no DDL was issued.
    Skipped,
    Applied,
    Failed(RunError),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub description: String,
    pub outcome: StepOutcome,
}

/// Precondition result for one step against the snapshot taken at run start.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub label: String,
    pub satisfied: bool,
}

/// Result of one [`Runner::run`](crate::runner::Runner::run) invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRun {
    pub table: String,
    pub initial: Option<SchemaSnapshot>,
    pub checks: Vec<Check>,
    pub steps: Vec<StepRecord>,
    /// Steps skipped because an earlier step or the initial inspection failed.
    pub not_attempted: Vec<String>,
    /// Failure raised before any step ran.
    pub aborted: Option<RunError>,
}

impl MigrationRun {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            initial: None,
            checks: Vec::new(),
            steps: Vec::new(),
            not_attempted: Vec::new(),
            aborted: None,
        }
    }

    pub fn abort(mut self, error: RunError, pending: Vec<String>) -> Self {
        self.aborted = Some(error);
        self.not_attempted = pending;
        self
    }

    /// The error that ended the run, if any.
    pub fn error(&self) -> Option<&RunError> {
        self.aborted.as_ref().or_else(|| {
            self.steps.iter().find_map(|s| match s.outcome {
                StepOutcome::Failed(ref e) => Some(e),
                _ => None,
            })
        })
    }

    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Skipped))
    }

    fn count(&self, f: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| f(&s.outcome)).count()
    }
}

impl fmt::Display for MigrationRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref snapshot) = self.initial {
            if snapshot.exists {
                writeln!(f, "Columns in {}:", self.table)?;
                for column in &snapshot.columns {
                    writeln!(f, "  - {}", column)?;
                }
            } else {
                writeln!(f, "Table {} does not exist", self.table)?;
            }
        }

        for check in &self.checks {
            writeln!(f, "{}: {}", check.label, check.satisfied)?;
        }

        for step in &self.steps {
            match step.outcome {
                StepOutcome::Skipped => {
                    writeln!(f, "[skipped] {} (already applied)", step.description)?
                }
                StepOutcome::Applied => writeln!(f, "[applied] {}", step.description)?,
                StepOutcome::Failed(ref e) => {
                    writeln!(f, "[failed] {}: {}", step.description, e)?
                }
            }
        }

        for description in &self.not_attempted {
            writeln!(f, "[not attempted] {}", description)?;
        }

        match self.error() {
            None => writeln!(
                f,
                "Migration of {} completed successfully ({} applied, {} already applied)",
                self.table,
                self.applied(),
                self.skipped()
            ),
            Some(e) => writeln!(f, "Migration of {} failed: {}", self.table, e),
        }
    }
}
