use crate::task::{COLOR_MAX_LEN, TITLE_MAX_LEN, Task, TaskChanges, TaskService, TaskServiceError};
use crate::validation::{self, Constraint, FieldError, FieldRule, Location, Presence};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// JSON representation of a Task for API requests and responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    id: i32,
    /// Title of the task
    title: String,
    /// Color tag of the task, e.g. `#FFFFFF`
    color: String,
    /// Whether the task is completed
    completed: bool,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            color: task.color().to_string(),
            completed: task.completed(),
        }
    }
}

/// JSON response for API errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON response for successful deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// JSON response for failed request validation, listing every violated rule.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorsResponse {
    pub errors: Vec<FieldError>,
}

/// Error type for task API handlers, mapped onto conventional status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents one or more failed validation rules.
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),
    /// Represents a body whose shape changed between validation and decoding.
    #[error("Malformed request body")]
    MalformedBody(#[from] serde_json::Error),
    /// Represents a task service error.
    #[error("Task service error")]
    Service(#[from] TaskServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorsResponse { errors }),
            )
                .into_response(),
            ApiError::MalformedBody(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Malformed request body".to_string(),
                }),
            )
                .into_response(),
            ApiError::Service(TaskServiceError::TaskNotFound(_)) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Task not found".to_string(),
                }),
            )
                .into_response(),
            ApiError::Service(err) => {
                tracing::error!("Task persistence failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

const ID_RULE: FieldRule = FieldRule {
    field: "id",
    label: "ID",
    location: Location::Path,
    presence: Presence::Required,
    constraint: Constraint::Integer,
};

const GET_TASK_RULES: &[FieldRule] = &[ID_RULE];

const DELETE_TASK_RULES: &[FieldRule] = &[ID_RULE];

const CREATE_TASK_RULES: &[FieldRule] = &[
    FieldRule {
        field: "title",
        label: "Title",
        location: Location::Body,
        presence: Presence::Required,
        constraint: Constraint::Text {
            max_len: Some(TITLE_MAX_LEN),
            hint: None,
        },
    },
    FieldRule {
        field: "color",
        label: "Color",
        location: Location::Body,
        presence: Presence::Required,
        constraint: Constraint::Text {
            max_len: Some(COLOR_MAX_LEN),
            hint: Some("e.g., #FFFFFF"),
        },
    },
];

const UPDATE_TASK_RULES: &[FieldRule] = &[
    ID_RULE,
    FieldRule {
        field: "title",
        label: "Title",
        location: Location::Body,
        presence: Presence::Optional,
        constraint: Constraint::Text {
            max_len: Some(TITLE_MAX_LEN),
            hint: None,
        },
    },
    FieldRule {
        field: "color",
        label: "Color",
        location: Location::Body,
        presence: Presence::Optional,
        constraint: Constraint::Text {
            max_len: Some(COLOR_MAX_LEN),
            hint: Some("e.g., #FFFFFF"),
        },
    },
    FieldRule {
        field: "completed",
        label: "Completed",
        location: Location::Body,
        presence: Presence::Optional,
        constraint: Constraint::Boolean,
    },
];

#[derive(Debug, Deserialize)]
struct CreateTaskPayload {
    title: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskPayload {
    title: Option<String>,
    color: Option<String>,
    completed: Option<bool>,
}

/// Handler for GET /tasks - Returns every task in JSON format.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = Vec<TaskJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskJson>>, ApiError> {
    let service = TaskService::new(&state.db);
    let tasks = service.get_all_tasks().await?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for GET /tasks/{id} - Returns a single task by its ID.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(
        ("id" = String, Path, description = "ID of the task to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the task", body = TaskJson),
        (status = 400, description = "Invalid task ID", body = ValidationErrorsResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let id = validation::evaluate(GET_TASK_RULES, Some(&id), &Value::Null)
        .require_path_id()
        .map_err(ApiError::Validation)?;

    let service = TaskService::new(&state.db);
    let task = service.get_task_by_id(id).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for POST /tasks - Creates a new, not yet completed task.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/tasks",
    responses(
        (status = 201, description = "Successfully created the task", body = TaskJson),
        (status = 400, description = "Invalid task fields", body = ValidationErrorsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    validation::evaluate(CREATE_TASK_RULES, None, &body)
        .into_result()
        .map_err(ApiError::Validation)?;
    let payload: CreateTaskPayload = serde_json::from_value(body)?;

    let service = TaskService::new(&state.db);
    let task = service.create_task(payload.title, payload.color).await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for PUT /tasks/{id} - Updates any subset of a task's fields.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(
        ("id" = String, Path, description = "ID of the task to update")
    ),
    responses(
        (status = 200, description = "Successfully updated the task", body = TaskJson),
        (status = 400, description = "Invalid task fields", body = ValidationErrorsResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<TaskJson>, ApiError> {
    let id = validation::evaluate(UPDATE_TASK_RULES, Some(&id), &body)
        .require_path_id()
        .map_err(ApiError::Validation)?;
    let payload: UpdateTaskPayload = serde_json::from_value(body)?;

    let service = TaskService::new(&state.db);
    let task = service
        .update_task_by_id(
            id,
            TaskChanges {
                title: payload.title,
                color: payload.color,
                completed: payload.completed,
            },
        )
        .await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /tasks/{id} - Deletes a task by its ID.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(
        ("id" = String, Path, description = "ID of the task to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the task", body = MessageResponse),
        (status = 400, description = "Invalid task ID", body = ValidationErrorsResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validation::evaluate(DELETE_TASK_RULES, Some(&id), &Value::Null)
        .require_path_id()
        .map_err(ApiError::Validation)?;

    let service = TaskService::new(&state.db);
    service.delete_task_by_id(id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}

/// Creates and returns the tasks router with all task-related routes.
pub fn create_task_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
