/// Maintenance task endpoints
///
/// # Endpoints
///
/// ```text
/// POST /api/tasks                    create
/// GET  /api/tasks                    search (?q=&date=&status=&category=&take=&skip=)
/// GET  /api/tasks/:id                full view
/// PUT  /api/tasks/:id/status         change status
/// PUT  /api/tasks/:id/assign         replace assignee
/// POST /api/tasks/:id/comments       add comment
/// POST /api/tasks/:id/attachments    add attachment
/// POST /api/tasks/:id/rate           add rating
/// GET  /api/executors                list executors
/// POST /api/executors                create executor
/// ```
///
/// History entries and comments are attributed to the `X-Forwarded-User`
/// header set by the gateway, or to `system` when it is absent.

use crate::app::ServiceState;
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::info;
use zhkh_shared::api::{
    envelope::{created, ok},
    ApiError, ApiResult, Envelope, JsonBody, PathParam, QueryParams,
};
use zhkh_shared::models::task::{
    Attachment, Comment, CreateTask, Executor, Rating, Task, TaskCategory, TaskFilter,
    TaskStatus, TaskView, DEFAULT_TAKE, MAX_TAKE,
};

/// Header carrying the acting user
pub const FORWARDED_USER_HEADER: &str = "x-forwarded-user";

/// User recorded in history when no header is present
pub const SYSTEM_USER: &str = "system";

/// Acting user of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(FORWARDED_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(SYSTEM_USER);

        Ok(ActingUser(user.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(alias = "accountId")]
    pub account_id: i64,
    pub category: String,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,
}

/// Raw search parameters; every value is parsed by hand so that a bad value
/// yields a field-specific message
#[derive(Debug, Default, Deserialize)]
pub struct TaskSearchQuery {
    pub q: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub take: Option<String>,
    pub skip: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Executor ID
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub point: i64,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExecutorRequest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub role: String,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

fn non_blank<'a>(field: &str, value: &'a str, message: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::invalid_field(field, message))
    } else {
        Ok(trimmed)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_category(raw: &str) -> ApiResult<TaskCategory> {
    raw.trim()
        .parse()
        .map_err(|msg: String| ApiError::invalid_field("category", msg))
}

fn parse_status(raw: &str) -> ApiResult<TaskStatus> {
    raw.trim()
        .parse()
        .map_err(|msg: String| ApiError::invalid_field("status", msg))
}

/// Turns raw query parameters into a search filter
pub fn parse_filter(query: TaskSearchQuery) -> ApiResult<TaskFilter> {
    let date = match blank_to_none(query.date) {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            ApiError::invalid_field("date", "Date must be in YYYY-MM-DD format")
        })?),
        None => None,
    };

    let status = blank_to_none(query.status)
        .map(|raw| parse_status(&raw))
        .transpose()?;

    let category = blank_to_none(query.category)
        .map(|raw| parse_category(&raw))
        .transpose()?;

    let take = match blank_to_none(query.take) {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|take| (1..=MAX_TAKE).contains(take))
            .ok_or_else(|| {
                ApiError::invalid_field(
                    "take",
                    format!("take must be between 1 and {}", MAX_TAKE),
                )
            })?,
        None => DEFAULT_TAKE,
    };

    let skip = match blank_to_none(query.skip) {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|skip| *skip >= 0)
            .ok_or_else(|| ApiError::invalid_field("skip", "skip must be zero or more"))?,
        None => 0,
    };

    Ok(TaskFilter {
        number_prefix: blank_to_none(query.q),
        date,
        status,
        category,
        take,
        skip,
    })
}

/// Creates a task
///
/// # Errors
///
/// - `400 Bad Request`: invalid category or blank title
pub async fn create_task(
    State(state): State<ServiceState>,
    ActingUser(user): ActingUser,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<TaskView>>)> {
    if req.account_id <= 0 {
        return Err(ApiError::invalid_field(
            "accountId",
            "Account ID must be a positive number",
        ));
    }
    let category = parse_category(&req.category)?;
    let title = non_blank("title", &req.title, "Title is required")?.to_string();

    let view = Task::create(
        &state.db,
        CreateTask {
            account_id: req.account_id,
            category,
            title,
            description: blank_to_none(req.description),
            priority: blank_to_none(req.priority),
        },
        &user,
    )
    .await?;
    info!(task_id = view.task.id, number = %view.task.number, user = %user, "Task created");

    Ok(created(view))
}

/// Searches tasks
pub async fn list_tasks(
    State(state): State<ServiceState>,
    QueryParams(query): QueryParams<TaskSearchQuery>,
) -> ApiResult<Json<Envelope<Vec<TaskView>>>> {
    let filter = parse_filter(query)?;
    let tasks = Task::search(&state.db, &filter).await?;
    Ok(ok(tasks))
}

/// Full view of one task
pub async fn get_task(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Envelope<TaskView>>> {
    let view = Task::find_view(&state.db, id)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(ok(view))
}

/// Changes the status of a task
pub async fn update_status(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
    ActingUser(user): ActingUser,
    JsonBody(req): JsonBody<StatusRequest>,
) -> ApiResult<Json<Envelope<TaskView>>> {
    let status = parse_status(&req.status)?;

    if !Task::set_status(&state.db, id, status, &user).await? {
        return Err(task_not_found());
    }
    info!(task_id = id, status = %status, user = %user, "Task status changed");

    let view = Task::find_view(&state.db, id)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(ok(view))
}

/// Replaces the assignee of a task
///
/// # Errors
///
/// - `404 Not Found`: unknown task or executor
pub async fn assign_task(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
    ActingUser(user): ActingUser,
    JsonBody(req): JsonBody<AssignRequest>,
) -> ApiResult<Json<Envelope<TaskView>>> {
    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(task_not_found());
    }
    let executor = Executor::find_by_id(&state.db, req.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Executor not found".to_string()))?;

    Task::assign(&state.db, id, &executor, &user).await?;
    info!(task_id = id, executor_id = executor.id, user = %user, "Task assigned");

    let view = Task::find_view(&state.db, id)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(ok(view))
}

pub async fn add_comment(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
    ActingUser(user): ActingUser,
    JsonBody(req): JsonBody<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Comment>>)> {
    let message = non_blank("message", &req.message, "Message is required")?;
    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(task_not_found());
    }

    let comment = Comment::create(&state.db, id, message, &user).await?;
    Ok(created(comment))
}

pub async fn add_attachment(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<AttachmentRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Attachment>>)> {
    let filename = non_blank("filename", &req.filename, "Filename is required")?;
    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(task_not_found());
    }

    let attachment = Attachment::create(&state.db, id, filename).await?;
    Ok(created(attachment))
}

/// Adds a 1..=5 rating
pub async fn rate_task(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<RatingRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Rating>>)> {
    if !(1..=5).contains(&req.point) {
        return Err(ApiError::invalid_field(
            "point",
            "Point must be between 1 and 5",
        ));
    }
    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(task_not_found());
    }

    let rating = Rating::create(&state.db, id, req.point, blank_to_none(req.message)).await?;
    info!(task_id = id, point = req.point, "Task rated");

    Ok(created(rating))
}

pub async fn list_executors(
    State(state): State<ServiceState>,
) -> ApiResult<Json<Envelope<Vec<Executor>>>> {
    let executors = Executor::list(&state.db).await?;
    Ok(ok(executors))
}

pub async fn create_executor(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<CreateExecutorRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Executor>>)> {
    let name = non_blank("name", &req.name, "Name is required")?;
    let role = non_blank("role", &req.role, "Role is required")?;

    let executor = Executor::create(&state.db, name, role).await?;
    info!(executor_id = executor.id, "Executor created");

    Ok(created(executor))
}
