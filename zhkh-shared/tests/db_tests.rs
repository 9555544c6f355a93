/// Integration tests for the connection pool and per-service migrations
///
/// Every test runs against a fresh in-memory database or a file in a
/// temporary directory, so no external setup is needed.

use zhkh_shared::db::migrations::{get_migration_status, run_migrations, Schema};
use zhkh_shared::db::pool::{close_pool, create_pool, get_pool_stats, health_check, DatabaseConfig};

#[tokio::test]
async fn test_in_memory_pool_health() {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to create pool");

    assert!(health_check(&pool).await.is_ok());

    let stats = get_pool_stats(&pool);
    assert_eq!(stats.total_connections, 1);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_file_pool_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("accounts.db");

    let pool = create_pool(DatabaseConfig::for_file(path.to_str().unwrap()))
        .await
        .expect("Failed to create pool");

    assert!(path.exists());
    close_pool(pool).await;
}

#[tokio::test]
async fn test_run_migrations_for_every_schema() {
    for schema in [
        Schema::Accounts,
        Schema::Billing,
        Schema::Payments,
        Schema::Reports,
        Schema::Tasks,
        Schema::Users,
    ] {
        let pool = create_pool(DatabaseConfig::in_memory()).await.unwrap();

        let before = get_migration_status(&pool).await.unwrap();
        assert_eq!(before.applied_migrations, 0);
        assert_eq!(before.latest_version, None);

        run_migrations(&pool, schema)
            .await
            .unwrap_or_else(|e| panic!("{} migrations failed: {}", schema.as_str(), e));

        let after = get_migration_status(&pool).await.unwrap();
        assert!(after.applied_migrations > 0);
        assert_eq!(after.latest_version, Some(1));
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let pool = create_pool(DatabaseConfig::in_memory()).await.unwrap();

    run_migrations(&pool, Schema::Tasks).await.unwrap();
    run_migrations(&pool, Schema::Tasks).await.unwrap();

    let status = get_migration_status(&pool).await.unwrap();
    assert_eq!(status.applied_migrations, 1);
}
