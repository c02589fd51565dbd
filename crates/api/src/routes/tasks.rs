//! Task endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::notification::NotificationKind;
use domain::models::task::{CreateTaskRequest, ListTasksQuery, Task, UpdateTaskRequest};
use domain::services::{apply_update, NotificationPayload};
use persistence::repositories::{TaskListQuery, TaskRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;

/// List tasks.
///
/// GET /api/tasks?region&status&from&to
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ApiError::Validation("'from' must not be after 'to'".to_string()));
        }
    }

    let repo = TaskRepository::new(state.pool.clone());
    let entities = repo
        .list(&TaskListQuery {
            region: query.region_filter(),
            status: query.status,
            from: query.from,
            to: query.to,
        })
        .await?;

    Ok(Json(entities.into_iter().map(Task::from).collect()))
}

/// Fetch one task.
///
/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let repo = TaskRepository::new(state.pool.clone());
    let task = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task.into()))
}

/// Create a task and announce it to subscribers.
///
/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    request.validate()?;

    let now = Utc::now();
    let author = request
        .author_login
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let mut task = Task::new(Uuid::new_v4());
    request.fields.apply_to(&mut task);
    task.created_by = author.clone().or(task.created_by);
    task.auto_created_at = Some(now);
    task.created_at = now;
    task.updated_at = now;

    let repo = TaskRepository::new(state.pool.clone());
    if !repo.insert(&task).await? {
        return Err(ApiError::Conflict("Task already exists".to_string()));
    }

    info!(
        task_id = %task.id,
        request_number = task.request_number.as_deref().unwrap_or(""),
        "Task created"
    );

    state.dispatcher.spawn(
        NotificationKind::NewRequests,
        NotificationPayload::for_task(task.clone(), author),
    );

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task, running the approval flow.
///
/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    request.validate()?;

    let repo = TaskRepository::new(state.pool.clone());
    let mut task: Task = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?
        .into();

    let author = request.author_login.clone();
    let outcome = apply_update(&mut task, request, Utc::now())?;

    let updated: Task = repo
        .update(&task)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?
        .into();

    info!(
        task_id = %updated.id,
        status = %updated.status,
        bonus_latched = outcome.bonus_latched,
        events = outcome.events.len(),
        "Task updated"
    );

    for kind in outcome.events {
        state
            .dispatcher
            .spawn(kind, NotificationPayload::for_task(updated.clone(), author.clone()));
    }

    Ok(Json(updated))
}
