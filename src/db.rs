use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_async::{
    AsyncConnection, SimpleAsyncConnection, sync_connection_wrapper::SyncConnectionWrapper,
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::store::StoreError;

/// Migrations embedded into the binary so a fresh deployment only needs the executable.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbConnection = SyncConnectionWrapper<SqliteConnection>;

/// Writers wait this long for the file lock instead of failing with `SQLITE_BUSY`.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

fn busy_timeout_pragma() -> String {
    format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS)
}

/// Opens a new connection to the SQLite file at `database_url`.
pub async fn connect(database_url: &str) -> Result<DbConnection, StoreError> {
    let mut conn = DbConnection::establish(database_url).await?;
    conn.batch_execute(&busy_timeout_pragma()).await?;
    Ok(conn)
}

/// Applies pending migrations on the blocking pool and returns how many were run.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize, StoreError> {
    let database_url = database_url.to_owned();
    tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
        let mut conn = SqliteConnection::establish(&database_url)?;
        conn.batch_execute(&busy_timeout_pragma())?;
        // WAL is persisted in the file, so readers no longer block on a writer's commit.
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(applied.len())
    })
    .await?
}
