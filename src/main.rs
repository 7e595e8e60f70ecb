use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use idemigrate::catalog::{self, MigrationSet};
use idemigrate::config::DatabaseConfig;
use idemigrate::connection::{PostgresConnection, SchemaConnection};
use idemigrate::runner::Runner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "idemigrate")]
#[command(about = "Apply the gym schema migrations that are not yet present")]
struct Cli {
    /// Which migration set to run
    #[arg(value_enum, default_value_t = SetChoice::All)]
    set: SetChoice,

    /// Inspect and print the planned SQL without changing the schema
    #[arg(long)]
    dry_run: bool,

    /// Overrides DB_HOST, DB_PORT, DB_NAME, DB_USER and DB_PASSWORD
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SetChoice {
    Plans,
    FaceId,
    All,
}

impl SetChoice {
    fn sets(self) -> Vec<MigrationSet> {
        match self {
            SetChoice::Plans => catalog::find("plans").into_iter().collect(),
            SetChoice::FaceId => catalog::find("face-id").into_iter().collect(),
            SetChoice::All => catalog::all(),
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,postgres=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    ExitCode::from(execute(cli, config))
}

/// Connects, runs the selected sets and returns the process exit code.
fn execute(cli: Cli, mut config: DatabaseConfig) -> u8 {
    if cli.database_url.is_some() {
        config.url = cli.database_url;
    }

    tracing::info!(endpoint = %config.describe(), "connecting to database");
    let conn = match PostgresConnection::connect(&config.connection_string()) {
        Ok(conn) => conn,
        Err(e) => {
            println!("Connection error: {}", e);
            return 1;
        }
    };

    let mut runner = Runner::new(conn);
    let code = run_sets(&mut runner, cli.set.sets(), cli.dry_run);

    if let Err(e) = runner.close() {
        tracing::warn!(error = %e, "failed to close connection cleanly");
    }

    code
}

fn run_sets<C: SchemaConnection>(
    runner: &mut Runner<C>,
    sets: Vec<MigrationSet>,
    dry_run: bool,
) -> u8 {
    if dry_run {
        plan_sets(runner, sets)
    } else {
        apply_sets(runner, sets)
    }
}

fn apply_sets<C: SchemaConnection>(runner: &mut Runner<C>, sets: Vec<MigrationSet>) -> u8 {
    for set in sets {
        println!("== {} ({})", set.name, set.table);
        let run = runner.run(set.table, &set.steps);
        print!("{}", run);
        if !run.is_success() {
            return run.exit_code();
        }
    }
    0
}

fn plan_sets<C: SchemaConnection>(runner: &mut Runner<C>, sets: Vec<MigrationSet>) -> u8 {
    for set in sets {
        println!("== {} ({}) [dry run]", set.name, set.table);
        match runner.plan(set.table, &set.steps) {
            Ok(plan) => {
                for step in plan {
                    if step.already_applied {
                        println!("[skip] {} (already applied)", step.description);
                    } else {
                        println!("[apply] {}", step.description);
                        for sql in step.statements {
                            println!("    {};", sql);
                        }
                    }
                }
            }
            Err(e) => {
                println!("Dry run of {} failed: {}", set.table, e);
                return 1;
            }
        }
    }
    0
}
