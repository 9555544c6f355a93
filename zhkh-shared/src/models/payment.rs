/// Payment model and database operations
///
/// # State Machine
///
/// ```text
/// processing → completed
///            → error
/// ```
///
/// A payment is created `processing`. It moves to `error` right away when the
/// billing service cannot mark its bills paid, otherwise the settlement job
/// finalises it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payments (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     account_id  INTEGER NOT NULL,
///     billing_ids TEXT    NOT NULL,  -- JSON array of bill IDs
///     amount      REAL    NOT NULL CHECK (amount > 0),
///     status      TEXT    NOT NULL,
///     created_at  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

/// Payment processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Recorded, waiting for settlement
    Processing,

    /// Settled
    Completed,

    /// Billing update or card settlement failed
    Error,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Error => "error",
        }
    }

    /// Checks if the payment can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Processing)
    }
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,

    pub account_id: i64,

    /// Bills settled by this payment
    pub billing_ids: Json<Vec<i64>>,

    pub amount: f64,

    pub status: PaymentStatus,

    pub created_at: NaiveDateTime,
}

/// Input for creating a payment
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub account_id: i64,
    pub billing_ids: Vec<i64>,
    pub amount: f64,
}

impl Payment {
    /// Records a new payment in `processing` state
    pub async fn create(pool: &SqlitePool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (account_id, billing_ids, amount, status)
            VALUES (?, ?, ?, ?)
            RETURNING id, account_id, billing_ids, amount, status, created_at
            "#,
        )
        .bind(data.account_id)
        .bind(Json(data.billing_ids))
        .bind(data.amount)
        .bind(PaymentStatus::Processing)
        .fetch_one(pool)
        .await?;

        Ok(payment)
    }

    /// Finds a payment by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, account_id, billing_ids, amount, status, created_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Payments of an account, newest first
    pub async fn list_for_account(
        pool: &SqlitePool,
        account_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, account_id, billing_ids, amount, status, created_at
            FROM payments
            WHERE account_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await
    }

    /// Sets the status of a payment
    ///
    /// Returns false if the payment does not exist.
    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: PaymentStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
