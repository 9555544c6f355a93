/// Delayed payment settlement
///
/// After the billing service has accepted a payment, the payment stays
/// `processing` for a fixed delay and is then finalised:
///
/// 1. **Wait**: sleep for the configured settlement delay
/// 2. **Decide**: the declined test card ends in `error`, anything else in `completed`
/// 3. **Store**: write the final status
///
/// The job is detached. It is not retried, cannot be cancelled and is lost
/// if the process stops during the delay.
///
/// # Example
///
/// ```no_run
/// use zhkh_services::settlement::SettlementJob;
/// use std::time::Duration;
/// # use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) {
/// let job = SettlementJob::new(pool, Duration::from_secs(2), "4111111111111112");
/// let handle = job.spawn(42, Some("4111 1111 1111 1111".to_string()));
/// handle.await.ok();
/// # }
/// ```

use crate::config::SettlementConfig;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use zhkh_shared::models::payment::{Payment, PaymentStatus};

/// Settlement job factory
#[derive(Debug, Clone)]
pub struct SettlementJob {
    db: SqlitePool,

    /// Delay before the status is finalised
    delay: Duration,

    /// Card number (without spaces) that is always declined
    declined_card: String,
}

impl SettlementJob {
    pub fn new(db: SqlitePool, delay: Duration, declined_card: &str) -> Self {
        Self {
            db,
            delay,
            declined_card: normalize_card(declined_card),
        }
    }

    pub fn from_config(db: SqlitePool, config: &SettlementConfig) -> Self {
        Self::new(
            db,
            Duration::from_millis(config.delay_ms),
            &config.declined_card_number,
        )
    }

    /// Final status for a payment made with `card_number`
    pub fn outcome(&self, card_number: Option<&str>) -> PaymentStatus {
        match card_number.map(normalize_card) {
            Some(card) if card == self.declined_card => PaymentStatus::Error,
            _ => PaymentStatus::Completed,
        }
    }

    /// Spawns the settlement of one payment
    ///
    /// # Returns
    ///
    /// Join handle of the background task; dropping it does not cancel the job
    pub fn spawn(&self, payment_id: i64, card_number: Option<String>) -> JoinHandle<()> {
        let db = self.db.clone();
        let delay = self.delay;
        let status = self.outcome(card_number.as_deref());

        tokio::spawn(async move {
            sleep(delay).await;

            match Payment::set_status(&db, payment_id, status).await {
                Ok(true) => tracing::info!(
                    payment_id,
                    status = status.as_str(),
                    "Payment settled"
                ),
                Ok(false) => tracing::warn!(payment_id, "Payment disappeared before settlement"),
                Err(e) => tracing::error!(
                    payment_id,
                    error = %e,
                    "Failed to store settlement result"
                ),
            }
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Strips whitespace from a card number
pub fn normalize_card(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhkh_shared::db::pool::{create_pool, DatabaseConfig};

    async fn lazy_pool() -> SqlitePool {
        create_pool(DatabaseConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_normalize_card() {
        assert_eq!(normalize_card("4111 1111 1111 1112"), "4111111111111112");
        assert_eq!(normalize_card(" 4111\t1111 "), "41111111");
    }

    #[tokio::test]
    async fn test_outcome_declined_card() {
        let job = SettlementJob::new(lazy_pool().await, Duration::ZERO, "4111 1111 1111 1112");

        assert_eq!(job.outcome(Some("4111111111111112")), PaymentStatus::Error);
        assert_eq!(job.outcome(Some("4111 1111 1111 1112")), PaymentStatus::Error);
        assert_eq!(job.outcome(Some("4111111111111111")), PaymentStatus::Completed);
        assert_eq!(job.outcome(None), PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_from_config_delay() {
        let config = SettlementConfig {
            delay_ms: 250,
            declined_card_number: "1".to_string(),
        };
        let job = SettlementJob::from_config(lazy_pool().await, &config);
        assert_eq!(job.delay(), Duration::from_millis(250));
    }
}
