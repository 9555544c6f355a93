/// Account model and database operations
///
/// An account is a billed utility-service account: an address, its owner,
/// the living area and the number of residents. Accounts are never removed;
/// deleting one clears `is_active`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id              INTEGER PRIMARY KEY AUTOINCREMENT,
///     number          TEXT    NOT NULL UNIQUE,
///     is_active       INTEGER NOT NULL DEFAULT 1,
///     address         TEXT    NOT NULL,
///     owner_full_name TEXT    NOT NULL,
///     property_square REAL    NOT NULL CHECK (property_square > 0),
///     residents_count INTEGER NOT NULL CHECK (residents_count >= 0),
///     company_name    TEXT    NOT NULL,
///     created_at      TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

const ACCOUNT_COLUMNS: &str = "id, number, is_active, address, owner_full_name, property_square, \
                               residents_count, company_name, created_at";

/// Account record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,

    /// Human-facing account number, unique
    pub number: String,

    /// False once the account has been deleted
    pub is_active: bool,

    pub address: String,

    pub owner_full_name: String,

    /// Living area in square metres
    pub property_square: f64,

    pub residents_count: i64,

    /// Management company serving the address
    pub company_name: String,

    pub created_at: NaiveDateTime,
}

/// Input for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    #[validate(length(min = 1, max = 64, message = "Account number is required"))]
    pub number: String,

    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, message = "Owner full name is required"))]
    pub owner_full_name: String,

    #[validate(range(exclusive_min = 0.0, message = "Property square must be positive"))]
    pub property_square: f64,

    #[validate(range(min = 0, message = "Residents count cannot be negative"))]
    pub residents_count: i64,

    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
}

/// Partial update of an account; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    /// Accepts `true`/`false` as well as `1`/`0`
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_active: Option<bool>,

    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: Option<String>,

    #[validate(length(min = 1, message = "Owner full name cannot be empty"))]
    pub owner_full_name: Option<String>,

    #[validate(range(exclusive_min = 0.0, message = "Property square must be positive"))]
    pub property_square: Option<f64>,

    #[validate(range(min = 0, message = "Residents count cannot be negative"))]
    pub residents_count: Option<i64>,

    #[validate(length(min = 1, message = "Company name cannot be empty"))]
    pub company_name: Option<String>,
}

impl UpdateAccount {
    /// True when the update would not touch any column
    pub fn is_empty(&self) -> bool {
        self.is_active.is_none()
            && self.address.is_none()
            && self.owner_full_name.is_none()
            && self.property_square.is_none()
            && self.residents_count.is_none()
            && self.company_name.is_none()
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Int(0)) => Ok(Some(false)),
        Some(Flag::Int(1)) => Ok(Some(true)),
        Some(Flag::Int(other)) => Err(serde::de::Error::custom(format!(
            "isActive must be a boolean or 0/1, got {}",
            other
        ))),
    }
}

impl Account {
    /// Creates a new active account
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the number is taken and a check
    /// violation for a non-positive area or negative resident count
    pub async fn create(pool: &SqlitePool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (number, address, owner_full_name, property_square,
                                  residents_count, company_name)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(data.number)
        .bind(data.address)
        .bind(data.owner_full_name)
        .bind(data.property_square)
        .bind(data.residents_count)
        .bind(data.company_name)
        .fetch_one(pool)
        .await?;

        Ok(account)
    }

    /// Finds an account by ID, active or not
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Lists accounts ordered by ID, optionally filtered by the active flag
    pub async fn list(pool: &SqlitePool, active: Option<bool>) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS));
        if let Some(active) = active {
            query.push(" WHERE is_active = ").push_bind(active);
        }
        query.push(" ORDER BY id");

        query.build_query_as::<Account>().fetch_all(pool).await
    }

    /// Applies a partial update
    ///
    /// Returns `None` if the account does not exist. An empty update simply
    /// re-reads the row.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: UpdateAccount,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE accounts SET ");
        let mut columns = query.separated(", ");

        if let Some(is_active) = data.is_active {
            columns.push("is_active = ").push_bind_unseparated(is_active);
        }
        if let Some(address) = data.address {
            columns.push("address = ").push_bind_unseparated(address);
        }
        if let Some(owner) = data.owner_full_name {
            columns.push("owner_full_name = ").push_bind_unseparated(owner);
        }
        if let Some(square) = data.property_square {
            columns.push("property_square = ").push_bind_unseparated(square);
        }
        if let Some(residents) = data.residents_count {
            columns.push("residents_count = ").push_bind_unseparated(residents);
        }
        if let Some(company) = data.company_name {
            columns.push("company_name = ").push_bind_unseparated(company);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ACCOUNT_COLUMNS);

        query.build_query_as::<Account>().fetch_optional(pool).await
    }

    /// Soft-deletes an account
    ///
    /// Returns false if no account has this ID. Deleting an already inactive
    /// account succeeds.
    pub async fn deactivate(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_serializes_camel_case() {
        let account = Account {
            id: 1,
            number: "ACC-1".to_string(),
            is_active: true,
            address: "Lenina 1".to_string(),
            owner_full_name: "Ivanov".to_string(),
            property_square: 42.5,
            residents_count: 2,
            company_name: "UK".to_string(),
            created_at: NaiveDateTime::default(),
        };

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["isActive"], true);
        assert_eq!(value["ownerFullName"], "Ivanov");
        assert_eq!(value["propertySquare"], 42.5);
        assert_eq!(value["residentsCount"], 2);
        assert!(value.get("owner_full_name").is_none());
    }

    #[test]
    fn test_update_accepts_numeric_flag() {
        let update: UpdateAccount = serde_json::from_value(json!({"isActive": 0})).unwrap();
        assert_eq!(update.is_active, Some(false));

        let update: UpdateAccount = serde_json::from_value(json!({"isActive": true})).unwrap();
        assert_eq!(update.is_active, Some(true));

        assert!(serde_json::from_value::<UpdateAccount>(json!({"isActive": 7})).is_err());
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateAccount::default().is_empty());

        let update: UpdateAccount = serde_json::from_value(json!({"address": "New"})).unwrap();
        assert!(!update.is_empty());
    }

    #[test]
    fn test_create_validation() {
        let data = CreateAccount {
            number: String::new(),
            address: "a".to_string(),
            owner_full_name: "o".to_string(),
            property_square: 0.0,
            residents_count: -1,
            company_name: "c".to_string(),
        };

        let errors = data.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("number"));
        assert!(fields.contains_key("property_square"));
        assert!(fields.contains_key("residents_count"));
    }

    #[test]
    fn test_update_rejects_non_positive_square() {
        let update = UpdateAccount {
            property_square: Some(-3.5),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("property_square"));

        let update = UpdateAccount {
            property_square: Some(0.5),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
