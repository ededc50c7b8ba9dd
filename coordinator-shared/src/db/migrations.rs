/// Schema migrations
///
/// The SQL files under the workspace `migrations/` directory are compiled into
/// the binary with `sqlx::migrate!`. `/health` compares what the database has
/// applied against what this build embeds, so a server started against a
/// stale schema shows up as `degraded`.

use serde::Serialize;
use sqlx::{
    migrate::{MigrateDatabase, MigrateError, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::{debug, info, warn};

pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applied schema version relative to this build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub applied: usize,
    pub embedded: usize,
    pub version: Option<i64>,
}

impl SchemaStatus {
    pub fn pending(&self) -> usize {
        self.embedded.saturating_sub(self.applied)
    }

    pub fn is_current(&self) -> bool {
        self.version.is_some() && self.version == latest_embedded_version()
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(embedded = MIGRATOR.iter().count(), "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        warn!(error = %e, "Schema migration failed");
        e
    })?;

    info!("Schema is up to date");
    Ok(())
}

pub fn latest_embedded_version() -> Option<i64> {
    MIGRATOR.iter().map(|m| m.version).max()
}

/// Reads `_sqlx_migrations`; a database never migrated reports zero applied
pub async fn schema_status(pool: &PgPool) -> Result<SchemaStatus, sqlx::Error> {
    let embedded = MIGRATOR.iter().count();

    let tracked: Option<String> = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations')::text")
        .fetch_one(pool)
        .await?;

    if tracked.is_none() {
        debug!("Schema has never been migrated");
        return Ok(SchemaStatus {
            applied: 0,
            embedded,
            version: None,
        });
    }

    let (applied, version): (i64, Option<i64>) =
        sqlx::query_as("SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await?;

    Ok(SchemaStatus {
        applied: usize::try_from(applied).unwrap_or_default(),
        embedded,
        version,
    })
}

/// Creates the target database when it is missing
///
/// Only called when the server is asked to migrate on startup, so a fresh
/// development machine needs nothing beyond a running Postgres.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        return Ok(());
    }

    info!("Database does not exist, creating it");
    Postgres::create_database(database_url).await
}
