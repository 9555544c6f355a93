/// Database migration runner
///
/// Each service has its own database and therefore its own migration set,
/// embedded at compile time from `migrations/<service>/`:
///
/// ```text
/// migrations/
/// ├── accounts/0001_create_accounts.sql
/// ├── billing/0001_create_bills.sql
/// ├── payments/0001_create_payments.sql
/// ├── reports/0001_create_reports.sql
/// ├── tasks/0001_create_tasks.sql
/// └── users/0001_create_users.sql
/// ```
///
/// # Example
///
/// ```no_run
/// use zhkh_shared::db::migrations::{get_migration_status, run_migrations, Schema};
/// use zhkh_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::in_memory()).await?;
/// run_migrations(&pool, Schema::Tasks).await?;
///
/// let status = get_migration_status(&pool).await?;
/// println!("Applied {} migrations", status.applied_migrations);
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};

static ACCOUNTS: Migrator = sqlx::migrate!("./migrations/accounts");
static BILLING: Migrator = sqlx::migrate!("./migrations/billing");
static PAYMENTS: Migrator = sqlx::migrate!("./migrations/payments");
static REPORTS: Migrator = sqlx::migrate!("./migrations/reports");
static TASKS: Migrator = sqlx::migrate!("./migrations/tasks");
static USERS: Migrator = sqlx::migrate!("./migrations/users");

/// The schema owned by one service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Accounts,
    Billing,
    Payments,
    Reports,
    Tasks,
    Users,
}

impl Schema {
    /// Schema name as used in logs and directory names
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Accounts => "accounts",
            Schema::Billing => "billing",
            Schema::Payments => "payments",
            Schema::Reports => "reports",
            Schema::Tasks => "tasks",
            Schema::Users => "users",
        }
    }

    fn migrator(&self) -> &'static Migrator {
        match self {
            Schema::Accounts => &ACCOUNTS,
            Schema::Billing => &BILLING,
            Schema::Payments => &PAYMENTS,
            Schema::Reports => &REPORTS,
            Schema::Tasks => &TASKS,
            Schema::Users => &USERS,
        }
    }
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version
    pub latest_version: Option<i64>,
}

/// Runs all pending migrations of a schema
///
/// Each migration runs in its own transaction; a failing migration is rolled
/// back and reported.
pub async fn run_migrations(pool: &SqlitePool, schema: Schema) -> Result<(), MigrateError> {
    info!(schema = schema.as_str(), "Starting database migrations");

    match schema.migrator().run(pool).await {
        Ok(()) => {
            info!(schema = schema.as_str(), "All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!(schema = schema.as_str(), "Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
pub async fn get_migration_status(pool: &SqlitePool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}
