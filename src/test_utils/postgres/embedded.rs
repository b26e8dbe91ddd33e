use postgresql_embedded::PostgreSQL;
use tracing::info;

use super::super::SHARED_RUNTIME;
use crate::config::FixtureConfig;
use crate::pool::DbPool;

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub database_url: String,
    /// Settings that reach the started server, credentials included
    pub config: FixtureConfig,
}

/// Start an embedded `PostgreSQL` server and create `dbname` in it.
///
/// The returned config points at the server with its generated credentials and
/// `max_size`/`acquire_timeout` left at their defaults.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up or started, the database cannot be
/// created, or the post-start connectivity check fails.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let runtime = SHARED_RUNTIME
        .as_ref()
        .map_err(|e| format!("failed to create tokio runtime for test utilities: {e}"))?;
    runtime.block_on(async {
        let mut postgresql = PostgreSQL::default();

        // Setup PostgreSQL binaries (bundled, so no download conflicts)
        postgresql.setup().await?;
        postgresql.start().await?;

        postgresql.create_database(dbname).await?;

        let settings = postgresql.settings();
        let config = FixtureConfig::new(
            settings.username.clone(),
            settings.password.clone(),
            settings.host.clone(),
            settings.port,
            dbname,
        );
        let database_url = config.display_url();
        info!(url = %database_url, "embedded PostgreSQL started");

        // Quick connection test
        let pool = DbPool::open(&config)?;
        pool.run("SELECT 1", &[]).await?;
        pool.close_all();

        Ok(EmbeddedPostgres {
            postgresql,
            database_url,
            config,
        })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    if let Ok(runtime) = SHARED_RUNTIME.as_ref() {
        runtime.block_on(async move {
            let _ = postgresql.stop().await;
        });
    }
}
