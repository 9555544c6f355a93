/// Task model and database operations
///
/// A task is a maintenance request tied to an account (a leaking pipe, a
/// broken elevator). Every change to a task is recorded in its history.
///
/// # State Machine
///
/// ```text
/// new → in_progress → completed → confirmed
/// ```
///
/// Status changes are not restricted to this order; dispatchers may move a
/// task back when work has to be redone.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     number      TEXT    NOT NULL UNIQUE,
///     account_id  INTEGER NOT NULL,
///     category    TEXT    NOT NULL,
///     title       TEXT    NOT NULL,
///     description TEXT,
///     status      TEXT    NOT NULL DEFAULT 'new',
///     priority    TEXT,
///     created_at  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
///
/// -- plus executors, task_assignees, comments, attachments, history, ratings
/// ```
///
/// # Example
///
/// ```no_run
/// use zhkh_shared::models::task::{CreateTask, Task, TaskCategory};
/// # use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), sqlx::Error> {
/// let view = Task::create(&pool, CreateTask {
///     account_id: 12,
///     category: TaskCategory::Plumbing,
///     title: "Leaking riser".to_string(),
///     description: Some("Basement, entrance 2".to_string()),
///     priority: None,
/// }, "system").await?;
///
/// println!("Created {}", view.task.number);
/// # Ok(())
/// # }
/// ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default page size for task searches
pub const DEFAULT_TAKE: i64 = 50;

/// Largest page size a search may request
pub const MAX_TAKE: i64 = 200;

const TASK_COLUMNS: &str =
    "id, number, account_id, category, priority, title, description, status, created_at";

/// Service category of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Plumbing,
    Electricity,
    Cleaning,
    Elevator,
    Other,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Plumbing => "plumbing",
            TaskCategory::Electricity => "electricity",
            TaskCategory::Cleaning => "cleaning",
            TaskCategory::Elevator => "elevator",
            TaskCategory::Other => "other",
        }
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plumbing" => Ok(TaskCategory::Plumbing),
            "electricity" => Ok(TaskCategory::Electricity),
            "cleaning" => Ok(TaskCategory::Cleaning),
            "elevator" => Ok(TaskCategory::Elevator),
            "other" => Ok(TaskCategory::Other),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered, nobody working on it yet
    New,

    InProgress,

    /// Work done, waiting for the resident to confirm
    Completed,

    Confirmed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TaskStatus::New),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "confirmed" => Ok(TaskStatus::Confirmed),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,

    /// `TASK-<year>-<6 upper hex>`
    pub number: String,

    pub account_id: i64,

    pub category: TaskCategory,

    pub priority: Option<String>,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub created_at: NaiveDateTime,
}

/// Person who can be assigned to tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Executor {
    pub id: i64,
    pub name: String,

    /// e.g. "plumber", "electrician"
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub timestamp: NaiveDateTime,
    pub message: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,
    pub filename: String,
}

/// One line of a task's audit trail
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub task_id: i64,
    pub timestamp: NaiveDateTime,
    pub action: String,
    pub user: String,
}

/// Resident feedback on finished work
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,
    pub task_id: i64,
    pub message: Option<String>,

    /// 1..=5
    pub point: i64,
}

/// A task together with everything attached to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<Executor>,
    pub attachments: Vec<Attachment>,
    pub history: Vec<HistoryEntry>,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub account_id: i64,
    pub category: TaskCategory,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
}

/// Search criteria for [`Task::search`]
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Prefix of the task number
    pub number_prefix: Option<String>,

    /// Creation date (UTC)
    pub date: Option<NaiveDate>,

    pub status: Option<TaskStatus>,

    pub category: Option<TaskCategory>,

    pub take: i64,

    pub skip: i64,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            number_prefix: None,
            date: None,
            status: None,
            category: None,
            take: DEFAULT_TAKE,
            skip: 0,
        }
    }
}

/// Generates a task number such as `TASK-2025-3FA9C1`
pub fn generate_task_number() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("TASK-{}-{}", Utc::now().year(), suffix)
}

impl Task {
    /// Creates a task and its `created` history entry in one transaction
    pub async fn create(
        pool: &SqlitePool,
        data: CreateTask,
        user: &str,
    ) -> Result<TaskView, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (number, account_id, category, title, description, priority)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(generate_task_number())
        .bind(data.account_id)
        .bind(data.category)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO history (task_id, action, user) VALUES (?, 'created', ?)")
            .bind(id)
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::find_view(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a bare task row by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads a task with its assignee, attachments, history, comments and ratings
    pub async fn find_view(pool: &SqlitePool, id: i64) -> Result<Option<TaskView>, sqlx::Error> {
        let Some(task) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let assignee = sqlx::query_as::<_, Executor>(
            r#"
            SELECT e.id, e.name, e.role
            FROM task_assignees a
            JOIN executors e ON e.id = a.executor_id
            WHERE a.task_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT id, task_id, filename FROM attachments WHERE task_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let history = sqlx::query_as::<_, HistoryEntry>(
            "SELECT id, task_id, timestamp, action, user FROM history WHERE task_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, task_id, timestamp, message, user FROM comments WHERE task_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, task_id, message, point FROM ratings WHERE task_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(Some(TaskView {
            task,
            assignee,
            attachments,
            history,
            comments,
            ratings,
        }))
    }

    /// Searches tasks, ordered by ID, and loads the full view of each match
    pub async fn search(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<TaskView>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM tasks WHERE 1 = 1");

        if let Some(prefix) = &filter.number_prefix {
            query.push(" AND number LIKE ").push_bind(format!("{}%", prefix));
        }
        if let Some(date) = filter.date {
            query.push(" AND date(created_at) = ").push_bind(date.to_string());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }

        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(filter.take)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let ids: Vec<i64> = query.build_query_scalar().fetch_all(pool).await?;

        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(view) = Self::find_view(pool, id).await? {
                views.push(view);
            }
        }

        Ok(views)
    }

    /// Changes the status and records it in the history
    ///
    /// Returns false if the task does not exist.
    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: TaskStatus,
        user: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO history (task_id, action, user) VALUES (?, ?, ?)")
            .bind(id)
            .bind(format!("status changed to {}", status))
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Replaces the assignee of a task and records it in the history
    ///
    /// Both the task and the executor must exist.
    pub async fn assign(
        pool: &SqlitePool,
        id: i64,
        executor: &Executor,
        user: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO task_assignees (task_id, executor_id)
            VALUES (?, ?)
            ON CONFLICT (task_id) DO UPDATE SET executor_id = excluded.executor_id
            "#,
        )
        .bind(id)
        .bind(executor.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO history (task_id, action, user) VALUES (?, ?, ?)")
            .bind(id)
            .bind(format!("assigned to {}", executor.name))
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl Executor {
    pub async fn create(pool: &SqlitePool, name: &str, role: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Executor>(
            "INSERT INTO executors (name, role) VALUES (?, ?) RETURNING id, name, role",
        )
        .bind(name)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Executor>("SELECT id, name, role FROM executors WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Executor>("SELECT id, name, role FROM executors ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

impl Comment {
    /// Adds a comment and a `commented` history entry
    pub async fn create(
        pool: &SqlitePool,
        task_id: i64,
        message: &str,
        user: &str,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, message, user)
            VALUES (?, ?, ?)
            RETURNING id, task_id, timestamp, message, user
            "#,
        )
        .bind(task_id)
        .bind(message)
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO history (task_id, action, user) VALUES (?, 'commented', ?)")
            .bind(task_id)
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(comment)
    }
}

impl Attachment {
    pub async fn create(pool: &SqlitePool, task_id: i64, filename: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(
            "INSERT INTO attachments (task_id, filename) VALUES (?, ?) RETURNING id, task_id, filename",
        )
        .bind(task_id)
        .bind(filename)
        .fetch_one(pool)
        .await
    }
}

impl Rating {
    pub async fn create(
        pool: &SqlitePool,
        task_id: i64,
        point: i64,
        message: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (task_id, message, point)
            VALUES (?, ?, ?)
            RETURNING id, task_id, message, point
            "#,
        )
        .bind(task_id)
        .bind(message)
        .bind(point)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_number_format() {
        let number = generate_task_number();
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TASK");
        assert_eq!(parts[1], Utc::now().year().to_string());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            TaskStatus::New,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Confirmed,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("elevator".parse::<TaskCategory>().unwrap(), TaskCategory::Elevator);
        assert!("gardening".parse::<TaskCategory>().is_err());
    }

    #[test]
    fn test_view_flattens_task_fields() {
        let view = TaskView {
            task: Task {
                id: 1,
                number: "TASK-2025-ABCDEF".to_string(),
                account_id: 7,
                category: TaskCategory::Cleaning,
                priority: None,
                title: "Stairwell".to_string(),
                description: None,
                status: TaskStatus::InProgress,
                created_at: NaiveDateTime::default(),
            },
            assignee: None,
            attachments: vec![],
            history: vec![],
            comments: vec![],
            ratings: vec![],
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["accountId"], 7);
        assert_eq!(value["status"], "in_progress");
        assert!(value["assignee"].is_null());
        assert!(value["history"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_default_filter_page() {
        let filter = TaskFilter::default();
        assert_eq!(filter.take, DEFAULT_TAKE);
        assert_eq!(filter.skip, 0);
    }
}
