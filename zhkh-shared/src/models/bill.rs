/// Bill model and database operations
///
/// A bill is one periodic charge for one service category (`type`), e.g.
/// water or heating. Bills start out `pending` and are flipped to `paid` in
/// bulk by the payment service.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bills (
///     id         INTEGER PRIMARY KEY AUTOINCREMENT,
///     account_id INTEGER NOT NULL,
///     amount     REAL    NOT NULL CHECK (amount > 0),
///     status     TEXT    NOT NULL DEFAULT 'pending',
///     type       TEXT    NOT NULL,
///     created_at TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Bill payment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Not yet paid
    #[default]
    Pending,

    /// Settled by a payment
    Paid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
        }
    }
}

/// Bill record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: i64,

    pub account_id: i64,

    pub created_at: NaiveDateTime,

    pub status: BillStatus,

    /// Service category
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,

    pub amount: f64,
}

/// Input for creating a bill
#[derive(Debug, Clone)]
pub struct CreateBill {
    pub account_id: i64,
    pub amount: f64,
    pub kind: String,
    pub status: BillStatus,
}

impl Bill {
    /// Inserts a bill and returns its ID
    pub async fn create(pool: &SqlitePool, data: CreateBill) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bills (account_id, amount, status, type)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(data.account_id)
        .bind(data.amount)
        .bind(data.status)
        .bind(data.kind)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Bills of an account created within the last `months` months, oldest first
    ///
    /// The window starts at midnight of the day `months` months ago, so every
    /// bill from that day counts regardless of the current time of day.
    pub async fn list_for_account(
        pool: &SqlitePool,
        account_id: i64,
        months: u32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, account_id, created_at, status, type, amount
            FROM bills
            WHERE account_id = ? AND created_at >= date('now', ?)
            ORDER BY created_at, id
            "#,
        )
        .bind(account_id)
        .bind(format!("-{} months", months))
        .fetch_all(pool)
        .await?;

        Ok(bills)
    }

    /// Finds a bill by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bill>(
            "SELECT id, account_id, created_at, status, type, amount FROM bills WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Marks the given bills as paid in a single transaction
    ///
    /// Unknown IDs are ignored. Returns the number of rows touched.
    pub async fn mark_paid(pool: &SqlitePool, ids: &[i64]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE bills SET status = ");
        query.push_bind(BillStatus::Paid).push(" WHERE id IN (");
        let mut list = query.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");

        let result = query.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}
