/// Embedded schema migrations
///
/// The SQL files in `warden-shared/migrations/` are compiled into the binary
/// with `sqlx::migrate!` and applied at start-up:
///
/// - `..._create_users.sql`: `users` with a unique `email` and `TEXT[]` roles
/// - `..._create_documents.sql`: `documents` with `owner_id` referencing
///   `users(id) ON DELETE CASCADE`

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{info, warn};

/// Applies every pending migration
///
/// # Errors
///
/// Returns an error if a migration fails; the failing migration is rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(available = migrator.iter().count(), "Running database migrations");

    migrator.run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Creates the database named in `database_url` if it is missing
///
/// Intended for development and test set-up.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
