/// User model and database operations
///
/// Back-office users log in with their email; the username is the email as
/// well. Passwords are stored as Argon2id PHC strings and never leave this
/// module in serialized form.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     is_admin    INTEGER NOT NULL DEFAULT 0,
///     email       TEXT    NOT NULL UNIQUE,
///     description TEXT,
///     username    TEXT    NOT NULL UNIQUE,
///     password    TEXT    NOT NULL,
///     name        TEXT    NOT NULL,
///     sex         INTEGER NOT NULL CHECK (sex IN (0, 1)),
///     created_at  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use zhkh_shared::auth::password::hash_password;
/// use zhkh_shared::models::user::{CreateUser, User};
/// # use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let id = User::create(&pool, CreateUser {
///     email: "operator@example.com".to_string(),
///     name: "Operator".to_string(),
///     sex: 1,
///     description: None,
///     password_hash: hash_password("long-enough-password")?,
/// }).await?;
///
/// let user = User::find_by_id(&pool, id).await?;
/// assert!(user.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// User record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    pub email: String,

    /// Same value as `email`
    pub username: String,

    pub description: Option<String>,

    pub name: String,

    /// 0 or 1
    pub sex: i64,

    pub is_admin: bool,

    /// Argon2id hash, never serialized
    #[serde(skip_serializing, default)]
    pub password: String,

    pub created_at: NaiveDateTime,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub sex: i64,
    pub description: Option<String>,

    /// Already hashed password
    pub password_hash: String,
}

impl User {
    /// Creates a user and returns its ID
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the email is already registered
    pub async fn create(pool: &SqlitePool, data: CreateUser) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, username, description, password, name, sex)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&data.email)
        .bind(&data.email)
        .bind(data.description)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(data.sex)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, description, name, sex, is_admin, password, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email (case-sensitive, as stored)
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, description, name, sex, is_admin, password, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }
}
