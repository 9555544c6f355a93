/// Database layer
///
/// Every service owns its own SQLite database file. This module provides the
/// connection pool and the embedded per-service migrations.
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Embedded migration runner, one migration set per service
///
/// # Example
///
/// ```no_run
/// use zhkh_shared::db::migrations::{run_migrations, Schema};
/// use zhkh_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::for_file("data/accounts.db")).await?;
///     run_migrations(&pool, Schema::Accounts).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
