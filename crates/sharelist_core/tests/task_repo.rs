use sharelist_core::{
    DocumentStore, ListId, ListRepository, NewTask, NormalizedEmail, RepoError,
    SqliteListRepository, SqliteTaskRepository, Task, TaskPatch, TaskRepository, UserId,
    ValidationError,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn setup() -> (SqliteListRepository, SqliteTaskRepository, ListId) {
    let store = DocumentStore::open_in_memory().unwrap();
    let lists = SqliteListRepository::new(Arc::clone(&store));
    let tasks = SqliteTaskRepository::new(store);
    let list_id = lists
        .create_list(
            &UserId::new("u1"),
            &NormalizedEmail::parse("o@x.com").unwrap(),
            "Groceries",
        )
        .unwrap();
    (lists, tasks, list_id)
}

fn new_task(title: &str, description: &str) -> NewTask {
    NewTask::new(title, description, UserId::new("u1"))
}

#[test]
fn add_then_update_description_keeps_other_fields() {
    let (_, tasks, list_id) = setup();
    let task_id = tasks.add_task(list_id, &new_task("Buy milk", "")).unwrap();
    let before = tasks.get_task(list_id, task_id).unwrap().unwrap();

    tasks
        .update_task(list_id, task_id, &TaskPatch::description("2%"))
        .unwrap();

    let snapshots: Arc<Mutex<Vec<Vec<Task>>>> = Arc::default();
    let sink = Arc::clone(&snapshots);
    let subscription = tasks
        .watch_tasks(list_id, move |rows| sink.lock().unwrap().push(rows))
        .unwrap();

    let snapshots = snapshots.lock().unwrap();
    let task = &snapshots[0][0];
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, "2%");
    assert!(!task.completed);
    assert_eq!(task.id, before.id);
    assert_eq!(task.list_id, before.list_id);
    assert_eq!(task.created_by, before.created_by);
    assert_eq!(task.created_at, before.created_at);
    drop(subscription);
}

#[test]
fn add_trims_and_rejects_blank_title() {
    let (_, tasks, list_id) = setup();
    let task_id = tasks
        .add_task(list_id, &new_task("  Eggs ", "  dozen "))
        .unwrap();
    let task = tasks.get_task(list_id, task_id).unwrap().unwrap();
    assert_eq!(task.title, "Eggs");
    assert_eq!(task.description, "dozen");
    assert!(!task.completed);
    assert_eq!(task.created_by.as_str(), "u1");

    assert!(matches!(
        tasks.add_task(list_id, &new_task("   ", "x")),
        Err(RepoError::Validation(ValidationError::EmptyTaskTitle))
    ));
}

#[test]
fn update_only_touches_provided_fields() {
    let (_, tasks, list_id) = setup();
    let task_id = tasks.add_task(list_id, &new_task("Bread", "rye")).unwrap();

    tasks
        .update_task(list_id, task_id, &TaskPatch::title(" Sourdough "))
        .unwrap();
    let task = tasks.get_task(list_id, task_id).unwrap().unwrap();
    assert_eq!(task.title, "Sourdough");
    assert_eq!(task.description, "rye");

    tasks
        .update_task(list_id, task_id, &TaskPatch::default())
        .unwrap();
    assert_eq!(tasks.get_task(list_id, task_id).unwrap().unwrap(), task);

    assert!(matches!(
        tasks.update_task(list_id, task_id, &TaskPatch::title("")),
        Err(RepoError::Validation(ValidationError::EmptyTaskTitle))
    ));
}

#[test]
fn toggle_sets_completed_flag() {
    let (_, tasks, list_id) = setup();
    let task_id = tasks.add_task(list_id, &new_task("Milk", "")).unwrap();

    tasks.toggle_task(list_id, task_id, true).unwrap();
    assert!(tasks.get_task(list_id, task_id).unwrap().unwrap().completed);
    tasks.toggle_task(list_id, task_id, false).unwrap();
    assert!(!tasks.get_task(list_id, task_id).unwrap().unwrap().completed);
}

#[test]
fn writes_report_missing_list_before_missing_task() {
    let (lists, tasks, list_id) = setup();
    let missing_task = Uuid::new_v4();

    assert!(matches!(
        tasks.toggle_task(list_id, missing_task, true),
        Err(RepoError::TaskNotFound { task_id, .. }) if task_id == missing_task
    ));
    assert!(matches!(
        tasks.delete_task(list_id, missing_task),
        Err(RepoError::TaskNotFound { .. })
    ));

    let task_id = tasks.add_task(list_id, &new_task("Milk", "")).unwrap();
    lists.delete_with_tasks(list_id).unwrap();

    assert!(matches!(
        tasks.update_task(list_id, task_id, &TaskPatch::title("Oat milk")),
        Err(RepoError::ListNotFound(id)) if id == list_id
    ));
    assert!(matches!(
        tasks.add_task(list_id, &new_task("Late", "")),
        Err(RepoError::ListNotFound(_))
    ));
}

#[test]
fn delete_removes_only_that_task() {
    let (_, tasks, list_id) = setup();
    let keep = tasks.add_task(list_id, &new_task("Keep", "")).unwrap();
    let drop_id = tasks.add_task(list_id, &new_task("Drop", "")).unwrap();

    tasks.delete_task(list_id, drop_id).unwrap();

    assert!(tasks.get_task(list_id, drop_id).unwrap().is_none());
    assert!(tasks.get_task(list_id, keep).unwrap().is_some());
}

#[test]
fn task_serializes_with_document_field_names() {
    let (_, tasks, list_id) = setup();
    let task_id = tasks.add_task(list_id, &new_task("Milk", "")).unwrap();
    let task = tasks.get_task(list_id, task_id).unwrap().unwrap();

    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(value["title"], "Milk");
    assert_eq!(value["completed"], false);
    assert_eq!(value["createdBy"], "u1");
    assert!(value["createdAt"].is_i64());
}
