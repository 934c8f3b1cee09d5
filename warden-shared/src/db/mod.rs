/// Database layer for Warden
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a start-up health check
/// - `migrations`: Embedded schema migrations (`warden-shared/migrations`)
///
/// The query code lives in [`crate::store::postgres`].
///
/// # Example
///
/// ```no_run
/// use warden_shared::db::pool::{create_pool, DatabaseConfig};
/// use warden_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
