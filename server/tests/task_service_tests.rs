use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection};
use taskboard_server::entities::task;
use taskboard_server::task::{TaskChanges, TaskService, TaskServiceError};
use testcontainers_modules::{postgres, testcontainers};

mod common;

pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    Ok(TestContext { db, container })
}

/// Test helper to insert a task directly through the entity and return its ID.
async fn insert_task(db: &DatabaseConnection, title: &str, color: &str, completed: bool) -> i32 {
    let active_model = task::ActiveModel {
        title: ActiveValue::Set(title.to_string()),
        color: ActiveValue::Set(color.to_string()),
        completed: ActiveValue::Set(completed),
        ..Default::default()
    };
    let model = active_model.insert(db).await.expect("Failed to seed task");
    model.id
}

#[tokio::test]
async fn can_create_task() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let created_task = task_service
        .create_task("Buy milk".to_string(), "#00FF00".to_string())
        .await
        .expect("Failed to create task");

    assert_eq!(created_task.title(), "Buy milk");
    assert_eq!(created_task.color(), "#00FF00");
    assert!(!created_task.completed());
    assert!(created_task.id() > 0);
}

#[tokio::test]
async fn created_tasks_get_distinct_ids() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let first = task_service
        .create_task("First".to_string(), "#111111".to_string())
        .await
        .expect("Failed to create first task");
    let second = task_service
        .create_task("Second".to_string(), "#222222".to_string())
        .await
        .expect("Failed to create second task");

    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn can_get_task_by_id() {
    let state = setup().await.expect("Failed to setup test context");
    let id = insert_task(&state.db, "Water plants", "#AABBCC", false).await;
    let task_service = TaskService::new(&state.db);

    let task = task_service
        .get_task_by_id(id)
        .await
        .expect("Failed to get task");

    assert_eq!(task.id(), id);
    assert_eq!(task.title(), "Water plants");
    assert_eq!(task.color(), "#AABBCC");
    assert!(!task.completed());
}

#[tokio::test]
async fn get_task_by_id_reports_missing_task() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let result = task_service.get_task_by_id(999).await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(999))));
}

#[tokio::test]
async fn can_get_all_tasks() {
    let state = setup().await.expect("Failed to setup test context");
    insert_task(&state.db, "First", "#111111", false).await;
    insert_task(&state.db, "Second", "#222222", true).await;
    let task_service = TaskService::new(&state.db);

    let tasks = task_service
        .get_all_tasks()
        .await
        .expect("Failed to get tasks");

    assert_eq!(tasks.len(), 2);
}

#[tokio::test]
async fn get_all_tasks_returns_empty_vec_for_empty_table() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let tasks = task_service
        .get_all_tasks()
        .await
        .expect("Failed to get tasks");

    assert!(tasks.is_empty());
}

#[tokio::test]
async fn partial_update_leaves_other_fields_unchanged() {
    let state = setup().await.expect("Failed to setup test context");
    let id = insert_task(&state.db, "Walk the dog", "#00FF00", false).await;
    let task_service = TaskService::new(&state.db);

    let updated_task = task_service
        .update_task_by_id(
            id,
            TaskChanges {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task");

    assert_eq!(updated_task.title(), "Walk the dog");
    assert_eq!(updated_task.color(), "#00FF00");
    assert!(updated_task.completed());
}

#[tokio::test]
async fn can_update_every_field() {
    let state = setup().await.expect("Failed to setup test context");
    let id = insert_task(&state.db, "Old title", "#000000", false).await;
    let task_service = TaskService::new(&state.db);

    let updated_task = task_service
        .update_task_by_id(
            id,
            TaskChanges {
                title: Some("New title".to_string()),
                color: Some("#FFFFFF".to_string()),
                completed: Some(true),
            },
        )
        .await
        .expect("Failed to update task");

    assert_eq!(updated_task.id(), id);
    assert_eq!(updated_task.title(), "New title");
    assert_eq!(updated_task.color(), "#FFFFFF");
    assert!(updated_task.completed());
}

#[tokio::test]
async fn update_reports_missing_task() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let result = task_service
        .update_task_by_id(
            999,
            TaskChanges {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(999))));
}

#[tokio::test]
async fn can_delete_task() {
    let state = setup().await.expect("Failed to setup test context");
    let id = insert_task(&state.db, "Throwaway", "#FF0000", false).await;
    let task_service = TaskService::new(&state.db);

    let deleted_task = task_service
        .delete_task_by_id(id)
        .await
        .expect("Failed to delete task");
    assert_eq!(deleted_task.id(), id);

    let result = task_service.get_task_by_id(id).await;
    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(_))));
}

#[tokio::test]
async fn deleting_twice_reports_missing_task() {
    let state = setup().await.expect("Failed to setup test context");
    let id = insert_task(&state.db, "Throwaway", "#FF0000", false).await;
    let task_service = TaskService::new(&state.db);

    task_service
        .delete_task_by_id(id)
        .await
        .expect("Failed to delete task");
    let second_delete = task_service.delete_task_by_id(id).await;

    assert!(matches!(
        second_delete,
        Err(TaskServiceError::TaskNotFound(_))
    ));
}
