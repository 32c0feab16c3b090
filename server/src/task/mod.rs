use crate::entities::*;
use sea_orm::*;

pub mod api;

/// Maximum length accepted for a task title.
pub const TITLE_MAX_LEN: usize = 255;
/// Maximum length accepted for a task color (a hex code such as `#FFFFFF`).
pub const COLOR_MAX_LEN: usize = 7;

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Task {
    id: i32,
    title: String,
    color: String,
    completed: bool,
}

impl Task {
    pub fn new(id: i32, title: String, color: String, completed: bool) -> Self {
        Self {
            id,
            title,
            color,
            completed,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title of the task.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the color tag of the task.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns whether the task is completed.
    pub fn completed(&self) -> bool {
        self.completed
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(model.id, model.title, model.color, model.completed)
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Field-by-field changes for a partial update. A `None` field keeps the
/// persisted value.
#[derive(Debug, Default, Clone)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub color: Option<String>,
    pub completed: Option<bool>,
}

pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskService {
        TaskService { db }
    }

    /// Retrieves all tasks from the database.
    ///
    /// # Returns
    ///
    /// A `Result` containing a vector of `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves a task by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to retrieve.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_model = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        Ok(Task::from(task_model))
    }

    /// Creates a new task in the database. New tasks always start out
    /// not completed.
    ///
    /// # Arguments
    ///
    /// * `title` - The title of the task.
    /// * `color` - The color tag of the task.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        title: String,
        color: String,
    ) -> Result<Task, TaskServiceError> {
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(title),
            color: ActiveValue::Set(color),
            completed: ActiveValue::Set(false),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Updates a task by its ID, touching only the fields supplied in
    /// `changes`.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `changes` - The fields to change; `None` fields are left untouched.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update_task_by_id(
        &self,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Task, TaskServiceError> {
        let task_to_update = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = changes.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(color) = changes.color {
            active_model.color = ActiveValue::Set(color);
        }
        if let Some(completed) = changes.completed {
            active_model.completed = ActiveValue::Set(completed);
        }
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Deletes a task by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to delete.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task_by_id(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_to_delete = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let task_copy = Task::from(task_to_delete.clone());
        task::Entity::delete_by_id(id).exec(self.db).await?;
        Ok(task_copy)
    }
}
