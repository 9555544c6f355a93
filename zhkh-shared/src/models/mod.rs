/// Database models for the ZHKH back office
///
/// Each service owns one set of tables; the records and their queries live
/// here so the services stay thin.
///
/// # Models
///
/// - `account`: Billed utility accounts with soft delete
/// - `bill`: Periodic charges per service category
/// - `payment`: Payments against one or more bills
/// - `user`: Back-office users with Argon2id password hashes
/// - `task`: Maintenance requests and their history, comments and ratings
/// - `report`: The report service's snapshot tables and generated receipts
///
/// # Example
///
/// ```no_run
/// use zhkh_shared::models::account::{Account, CreateAccount};
/// use zhkh_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::for_file("data/accounts.db")).await?;
///
/// let account = Account::create(&pool, CreateAccount {
///     number: "ACC-0001".to_string(),
///     address: "Lenina 1, kv. 5".to_string(),
///     owner_full_name: "Ivanov Ivan".to_string(),
///     property_square: 54.3,
///     residents_count: 3,
///     company_name: "UK Dom".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod bill;
pub mod payment;
pub mod report;
pub mod task;
pub mod user;
