/// Report service tables
///
/// The report service works from its own snapshot of accounts, charges and
/// payments, and stores one `reports` row per generated receipt.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (id, number UNIQUE, address, area, residents, management_company, ...);
/// CREATE TABLE charges  (id, account_id, service_type, amount, period_start, period_end, ...);
/// CREATE TABLE payments (id, account_id, payment_date, amount, method, ...);
/// CREATE TABLE reports  (id, account_id, period_start, period_end, total_amount,
///                        services_data, qr_data, file_path, status, created_at, updated_at);
/// ```

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

/// Account as seen by the report service
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportAccount {
    pub id: i64,
    pub number: String,
    pub address: String,

    /// Living area in square metres
    pub area: f64,

    pub residents: i64,
    pub management_company: String,
}

/// Charge for one service in one billing month
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Charge {
    pub id: i64,
    pub account_id: i64,
    pub service_type: String,
    pub amount: f64,

    /// First day of the billed month
    pub period_start: NaiveDate,

    pub period_end: NaiveDate,
}

/// Payment as seen by the report service
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportPayment {
    pub id: i64,
    pub account_id: i64,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub method: String,
}

/// Receipt generation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Generated,
    Failed,
}

/// Stored report metadata
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub id: i64,
    pub account_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount: f64,

    /// Per-service totals as a JSON array of `{type, amount}`
    pub services_data: Json<JsonValue>,

    /// Payload encoded in the receipt QR code
    pub qr_data: String,

    /// Location of the PDF receipt
    pub file_path: String,

    pub status: ReportStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for storing a generated report
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub account_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount: f64,
    pub services_data: JsonValue,
    pub qr_data: String,
    pub file_path: String,
    pub status: ReportStatus,
}

const REPORT_COLUMNS: &str = "id, account_id, period_start, period_end, total_amount, \
                              services_data, qr_data, file_path, status, created_at, updated_at";

impl ReportAccount {
    pub async fn create<'e>(
        executor: impl SqliteExecutor<'e>,
        number: &str,
        address: &str,
        area: f64,
        residents: i64,
        management_company: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ReportAccount>(
            r#"
            INSERT INTO accounts (number, address, area, residents, management_company)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, number, address, area, residents, management_company
            "#,
        )
        .bind(number)
        .bind(address)
        .bind(area)
        .bind(residents)
        .bind(management_company)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportAccount>(
            "SELECT id, number, address, area, residents, management_company FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_number<'e>(
        executor: impl SqliteExecutor<'e>,
        number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportAccount>(
            "SELECT id, number, address, area, residents, management_company FROM accounts WHERE number = ?",
        )
        .bind(number)
        .fetch_optional(executor)
        .await
    }
}

impl Charge {
    pub async fn create<'e>(
        executor: impl SqliteExecutor<'e>,
        account_id: i64,
        service_type: &str,
        amount: f64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO charges (account_id, service_type, amount, period_start, period_end)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(service_type)
        .bind(amount)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(executor)
        .await
    }

    /// Charges of an account for the month starting at `period_start`
    pub async fn list_for_period(
        pool: &SqlitePool,
        account_id: i64,
        period_start: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Charge>(
            r#"
            SELECT id, account_id, service_type, amount, period_start, period_end
            FROM charges
            WHERE account_id = ? AND period_start = ?
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .bind(period_start)
        .fetch_all(pool)
        .await
    }
}

impl ReportPayment {
    pub async fn create<'e>(
        executor: impl SqliteExecutor<'e>,
        account_id: i64,
        payment_date: NaiveDate,
        amount: f64,
        method: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO payments (account_id, payment_date, amount, method)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(payment_date)
        .bind(amount)
        .bind(method)
        .fetch_one(executor)
        .await
    }

    /// All payments of an account, newest first
    pub async fn list_for_account(
        pool: &SqlitePool,
        account_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportPayment>(
            r#"
            SELECT id, account_id, payment_date, amount, method
            FROM payments
            WHERE account_id = ?
            ORDER BY payment_date DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await
    }
}

impl Report {
    pub async fn create(pool: &SqlitePool, data: CreateReport) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO reports (account_id, period_start, period_end, total_amount,
                                 services_data, qr_data, file_path, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(data.account_id)
        .bind(data.period_start)
        .bind(data.period_end)
        .bind(data.total_amount)
        .bind(Json(data.services_data))
        .bind(data.qr_data)
        .bind(data.file_path)
        .bind(data.status)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Report>(&format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reports of an account, newest first
    pub async fn list_for_account(
        pool: &SqlitePool,
        account_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE account_id = ? ORDER BY created_at DESC, id DESC",
            REPORT_COLUMNS
        ))
        .bind(account_id)
        .fetch_all(pool)
        .await
    }
}

/// First day of the month containing `date` and first day of the next month
pub fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = date.with_day(1)?;
    let end = start.checked_add_months(Months::new(1))?;
    Some((start, end))
}

/// Number of the demo account created by [`seed_demo_data`]
pub const DEMO_ACCOUNT_NUMBER: &str = "TEST001";

/// Creates the demo account with current-month charges and two payments
///
/// Does nothing if the demo account already exists. All rows go in one
/// transaction, so a failed seed leaves nothing behind and is retried on the
/// next start. Returns whether data was inserted.
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let today = Utc::now().date_naive();
    let Some((period_start, period_end)) = month_bounds(today) else {
        return Ok(false);
    };

    let mut tx = pool.begin().await?;

    if ReportAccount::find_by_number(&mut *tx, DEMO_ACCOUNT_NUMBER)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let account = ReportAccount::create(
        &mut *tx,
        DEMO_ACCOUNT_NUMBER,
        "ул. Тестовая, д. 1",
        50.5,
        2,
        "ООО \"Тестовая УК\"",
    )
    .await?;

    for (service, amount) in [
        ("Отопление", 1500.0),
        ("Горячая вода", 800.0),
        ("Холодная вода", 300.0),
        ("Электричество", 1200.0),
        ("Вывоз мусора", 200.0),
    ] {
        Charge::create(&mut *tx, account.id, service, amount, period_start, period_end).await?;
    }

    ReportPayment::create(&mut *tx, account.id, today, 3000.0, "Банковская карта").await?;
    ReportPayment::create(
        &mut *tx,
        account.id,
        today - Duration::days(15),
        1000.0,
        "Наличные",
    )
    .await?;

    tx.commit().await?;

    info!(account_id = account.id, "Seeded demo report data");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        let (start, end) = month_bounds(date).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (_, end) = month_bounds(date).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
