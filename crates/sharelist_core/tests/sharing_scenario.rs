use sharelist_core::{
    AccessLevel, DocumentStore, ErrorKind, ListAction, ListService, MemberService, Notice,
    NormalizedEmail, PermissionError, Role, ServiceError, SessionUser, SqliteListRepository,
    SqliteTaskRepository, Task, TaskPatch, TaskService, TodoList, UserAction, ValidationError,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct App {
    lists: ListService<SqliteListRepository>,
    members: MemberService<SqliteListRepository>,
    tasks: TaskService<SqliteListRepository, SqliteTaskRepository>,
}

fn app() -> App {
    let store = DocumentStore::open_in_memory().unwrap();
    let list_repo = SqliteListRepository::new(Arc::clone(&store));
    let task_repo = SqliteTaskRepository::new(store);
    App {
        lists: ListService::new(list_repo.clone()),
        members: MemberService::new(list_repo.clone()),
        tasks: TaskService::new(list_repo, task_repo),
    }
}

fn user(id: &str, email: &str) -> SessionUser {
    SessionUser::new(id, email).unwrap()
}

fn email(value: &str) -> NormalizedEmail {
    NormalizedEmail::parse(value).unwrap()
}

#[test]
fn owner_shares_with_viewer_who_can_toggle_but_not_edit() {
    let app = app();
    let owner = user("u", "U@x.com");
    let viewer = user("v", "v@x.com");

    let list_id = app.lists.create_list(&owner, "Groceries").unwrap();
    let roster = app.members.roster(&owner, list_id).unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].email.as_str(), "u@x.com");
    assert_eq!(roster[0].role, Role::Admin);

    let invited = app
        .members
        .invite_member(&owner, list_id, " V@X.com ", Role::Viewer)
        .unwrap();
    assert_eq!(invited, viewer.email);

    let seen: Arc<Mutex<Vec<TodoList>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let _watch = app
        .lists
        .watch_lists(&viewer, move |lists| *sink.lock().unwrap() = lists)
        .unwrap();
    let visible = seen.lock().unwrap().clone();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, list_id);

    let access = AccessLevel::evaluate(&viewer.email, &visible[0]);
    assert!(!access.can_admin);
    assert!(access.can_view());

    let task_id = app
        .tasks
        .add_task(&owner, list_id, "Buy milk", "")
        .unwrap();
    app.tasks
        .toggle_task(&viewer, list_id, task_id, true)
        .unwrap();

    let err = app
        .tasks
        .edit_task(&viewer, list_id, task_id, &TaskPatch::title("Buy oat milk"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Permission(PermissionError::NotAllowed(ListAction::EditTask))
    ));

    let tasks: Arc<Mutex<Vec<Task>>> = Arc::default();
    let sink = Arc::clone(&tasks);
    let _tasks_watch = app
        .tasks
        .watch_tasks(&viewer, list_id, move |rows| *sink.lock().unwrap() = rows)
        .unwrap();
    let tasks = tasks.lock().unwrap();
    assert_eq!(tasks[0].title, "Buy milk");
    assert!(tasks[0].completed);
}

#[test]
fn viewer_is_refused_every_admin_action() {
    let app = app();
    let owner = user("u", "u@x.com");
    let viewer = user("v", "v@x.com");
    let list_id = app.lists.create_list(&owner, "Trip").unwrap();
    app.members
        .invite_member(&owner, list_id, "v@x.com", Role::Viewer)
        .unwrap();
    let task_id = app.tasks.add_task(&owner, list_id, "Pack", "").unwrap();

    let outcomes = [
        app.lists.rename_list(&viewer, list_id, "Mine now").map(|_| ()),
        app.lists.delete_list(&viewer, list_id),
        app.tasks.add_task(&viewer, list_id, "Sneaky", "").map(|_| ()),
        app.tasks.delete_task(&viewer, list_id, task_id),
        app.members
            .invite_member(&viewer, list_id, "x@x.com", Role::Admin)
            .map(|_| ()),
        app.members
            .change_member_role(&viewer, list_id, &viewer.email, Role::Admin),
        app.members.remove_member(&viewer, list_id, &owner.email),
    ];
    for outcome in outcomes {
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
    }
}

#[test]
fn stranger_cannot_see_or_toggle() {
    let app = app();
    let owner = user("u", "u@x.com");
    let stranger = user("s", "s@x.com");
    let list_id = app.lists.create_list(&owner, "Private").unwrap();
    let task_id = app.tasks.add_task(&owner, list_id, "Secret", "").unwrap();

    assert!(matches!(
        app.tasks.toggle_task(&stranger, list_id, task_id, true),
        Err(ServiceError::Permission(PermissionError::NotAllowed(
            ListAction::ToggleTask
        )))
    ));
    assert!(matches!(
        app.tasks.watch_tasks(&stranger, list_id, |_| {}),
        Err(ServiceError::Permission(PermissionError::NotVisible))
    ));
    assert!(matches!(
        app.members.roster(&stranger, list_id),
        Err(ServiceError::Permission(PermissionError::NotVisible))
    ));
}

#[test]
fn owner_protection_holds_even_for_other_admins() {
    let app = app();
    let owner = user("u", "u@x.com");
    let admin = user("a", "a@x.com");
    let list_id = app.lists.create_list(&owner, "Shared").unwrap();
    app.members
        .invite_member(&owner, list_id, "a@x.com", Role::Admin)
        .unwrap();

    let demote = app
        .members
        .change_member_role(&admin, list_id, &owner.email, Role::Viewer);
    assert_eq!(
        Notice::for_outcome(UserAction::ChangeMemberRole, &demote).message,
        "Owner must remain admin"
    );

    let remove = app.members.remove_member(&admin, list_id, &owner.email);
    assert_eq!(
        Notice::for_outcome(UserAction::RemoveMember, &remove).message,
        "Cannot remove owner"
    );

    let invite_owner_as_viewer =
        app.members
            .invite_member(&owner, list_id, "u@x.com", Role::Viewer);
    assert!(matches!(
        invite_owner_as_viewer,
        Err(ServiceError::Permission(PermissionError::OwnerMustRemainAdmin))
    ));

    let (list, access) = app.lists.open_list(&owner, list_id).unwrap();
    assert!(access.is_owner);
    assert_eq!(list.role_of(&owner.email), Some(Role::Admin));
}

#[test]
fn admin_member_manages_roles_and_removal() {
    let app = app();
    let owner = user("u", "u@x.com");
    let admin = user("a", "a@x.com");
    let list_id = app.lists.create_list(&owner, "Team").unwrap();
    app.members
        .invite_member(&owner, list_id, "a@x.com", Role::Admin)
        .unwrap();
    app.members
        .invite_member(&admin, list_id, "v@x.com", Role::Viewer)
        .unwrap();

    app.members
        .change_member_role(&admin, list_id, &email("v@x.com"), Role::Admin)
        .unwrap();
    app.members
        .remove_member(&admin, list_id, &email("v@x.com"))
        .unwrap();

    let roster = app.members.roster(&admin, list_id).unwrap();
    let emails: Vec<_> = roster.iter().map(|entry| entry.email.as_str()).collect();
    assert_eq!(emails, vec!["u@x.com", "a@x.com"]);
}

#[test]
fn invite_validates_email_before_anything_else() {
    let app = app();
    let owner = user("u", "u@x.com");
    let list_id = app.lists.create_list(&owner, "Team").unwrap();

    let blank = app.members.invite_member(&owner, list_id, "   ", Role::Viewer);
    assert!(matches!(
        blank,
        Err(ServiceError::Validation(ValidationError::EmptyEmail))
    ));

    let malformed = app
        .members
        .invite_member(&owner, list_id, "not-an-email", Role::Viewer);
    assert_eq!(malformed.as_ref().unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(
        Notice::for_outcome(UserAction::InviteMember, &malformed).message,
        "Invalid email"
    );
}

#[test]
fn rename_is_a_no_op_when_title_is_unchanged() {
    let app = app();
    let owner = user("u", "u@x.com");
    let list_id = app.lists.create_list(&owner, "Groceries").unwrap();

    assert!(!app.lists.rename_list(&owner, list_id, " Groceries ").unwrap());
    assert!(app.lists.rename_list(&owner, list_id, "Food").unwrap());
    let (list, _) = app.lists.open_list(&owner, list_id).unwrap();
    assert_eq!(list.title, "Food");

    let blank = app.lists.rename_list(&owner, list_id, "  ");
    assert_eq!(blank.unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn every_mutation_yields_exactly_one_notice() {
    let app = app();
    let owner = user("u", "u@x.com");

    let created = app.lists.create_list(&owner, "Groceries");
    assert_eq!(
        Notice::for_outcome(UserAction::CreateList, &created),
        Notice::success("List created")
    );
    let list_id = created.unwrap();

    let added = app.tasks.add_task(&owner, list_id, "  ", "");
    let notice = Notice::for_outcome(UserAction::AddTask, &added);
    assert!(!notice.is_success());
    assert_eq!(notice.message, "Title is required");

    let deleted = app.lists.delete_list(&owner, list_id);
    assert_eq!(
        Notice::for_outcome(UserAction::DeleteList, &deleted).message,
        "List deleted"
    );

    let deleted_again = app.lists.delete_list(&owner, list_id);
    assert_eq!(deleted_again.as_ref().unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        Notice::for_outcome(UserAction::DeleteList, &deleted_again).message,
        "Delete failed"
    );

    let missing_task = app
        .tasks
        .toggle_task(&owner, Uuid::new_v4(), Uuid::new_v4(), true);
    assert_eq!(missing_task.unwrap_err().kind(), ErrorKind::NotFound);
}
