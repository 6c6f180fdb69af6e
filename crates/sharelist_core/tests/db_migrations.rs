use sharelist_core::db::migrations::latest_version;
use sharelist_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "lists");
    assert_table_exists(&conn, "list_members");
    assert_table_exists(&conn, "tasks");
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO tasks (id, list_id, title, created_by, created_at)
         VALUES ('t1', 'missing-list', 'Orphan', 'u1', 1);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn schema_rejects_unknown_roles_and_blank_titles() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO lists (id, title, owner_id, owner_email, created_at)
         VALUES ('l1', 'Groceries', 'u1', 'owner@x.com', 1);",
        [],
    )
    .unwrap();

    let bad_role = conn.execute(
        "INSERT INTO list_members (list_id, email, role) VALUES ('l1', 'v@x.com', 'owner');",
        [],
    );
    assert!(bad_role.is_err());

    let blank_title = conn.execute(
        "INSERT INTO lists (id, title, owner_id, owner_email, created_at)
         VALUES ('l2', '   ', 'u1', 'owner@x.com', 2);",
        [],
    );
    assert!(blank_title.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sharelist.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "lists");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_under_missing_directory_reports_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("lists.db");

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Open { target, .. } => assert_eq!(target, &path.display().to_string()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn failed_migration_names_its_version_and_leaves_schema_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clashing.db");

    // A stray `lists` table makes migration 1 fail.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE lists (id TEXT PRIMARY KEY);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Migration { version: 1, .. }), "{err}");

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let members: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'list_members';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(members, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
