use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sql_fixture::fixture::schema;
use sql_fixture::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Create, seed, drop and query the users/products fixture schema",
    after_help = "Connection settings come from DB_USER, DB_PASSWORD, DB_HOST, DB_PORT and DB_NAME."
)]
struct Args {
    /// Override DB_POOL_MAX_SIZE
    #[arg(long, global = true)]
    max_size: Option<usize>,
    /// Override DB_POOL_TIMEOUT_MS
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create both tables and insert the seed rows
    Setup,
    /// Drop both tables
    Teardown,
    /// Drop, recreate and reseed
    Reset,
    /// Run one statement and print its rows as JSON
    Query {
        sql: String,
        /// Positional parameters for $1, $2, ...; converted to each placeholder's type
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), SqlFixtureError> {
    let mut config = FixtureConfig::from_env()?;
    if let Some(max_size) = args.max_size {
        config = config.with_max_size(max_size);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_acquire_timeout(Some(Duration::from_millis(ms)));
    }

    let mut pool = DbPool::open(&config)?;
    let outcome = match args.command {
        Command::Setup => schema::setup(&mut pool).await,
        Command::Teardown => schema::teardown(&mut pool).await,
        Command::Reset => schema::reset(&mut pool).await,
        Command::Query { sql, params } => {
            let params: Vec<RowValues> = params.into_iter().map(RowValues::Text).collect();
            let rs = pool.run(&sql, &params).await?;
            let out = serde_json::json!({
                "rows_affected": rs.rows_affected,
                "rows": rs.to_json(),
            });
            let text = serde_json::to_string_pretty(&out)
                .map_err(|e| SqlFixtureError::ExecutionError(e.to_string()))?;
            println!("{text}");
            Ok(())
        }
    };
    pool.close_all();
    outcome
}
