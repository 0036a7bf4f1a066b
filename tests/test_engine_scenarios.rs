use flintdb::catalog::Registry;
use flintdb::executor::run;
use flintdb::storage::Value;
use flintdb::Error;
use tempfile::TempDir;

#[test]
fn test_unique_violation_leaves_one_row() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    run(&db, "CREATE TABLE accounts (id int, name string UNIQUE)").unwrap();
    run(&db, "INSERT INTO accounts VALUES (1, 'alice')").unwrap();

    let err = run(&db, "INSERT INTO accounts VALUES (2, 'alice')").unwrap_err();
    assert!(matches!(err, Error::UniqueConstraintViolation { .. }));

    let result = run(&db, "SELECT * FROM accounts").unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("id"), Some(&Value::Integer(1)));
}

#[test]
fn test_delete_then_select_is_empty() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    run(&db, "CREATE TABLE notes (id int, body string)").unwrap();
    run(&db, "INSERT INTO notes VALUES (1, 'first')").unwrap();
    run(&db, "DELETE FROM notes WHERE id = 1").unwrap();

    let result = run(&db, "SELECT * FROM notes WHERE id = 1").unwrap();
    assert!(result.rows.is_empty());
    let result = run(&db, "SELECT * FROM notes").unwrap();
    assert!(result.rows.is_empty());

    // The id is free for reuse after the delete.
    run(&db, "INSERT INTO notes VALUES (1, 'second')").unwrap();
    let result = run(&db, "SELECT * FROM notes WHERE id = 1").unwrap();
    assert_eq!(result.rows[0].get("body"), Some(&Value::from("second")));
}

#[test]
fn test_join_pairs_matching_rows_only() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    run(&db, "CREATE TABLE users (id int, name string)").unwrap();
    run(&db, "CREATE TABLE orders (id int, user_id int, item string)").unwrap();
    run(&db, "INSERT INTO users VALUES (1, 'alice')").unwrap();
    run(&db, "INSERT INTO users VALUES (2, 'bob')").unwrap();
    run(&db, "INSERT INTO orders VALUES (10, 1, 'book')").unwrap();

    let result = run(
        &db,
        "SELECT * FROM users JOIN orders ON users.id = orders.user_id",
    )
    .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("users.name"), Some(&Value::from("alice")));
    assert_eq!(result.rows[0].get("orders.item"), Some(&Value::from("book")));
    assert_eq!(result.rows[0].get("orders.user_id"), Some(&Value::Integer(1)));
}

#[test]
fn test_join_with_empty_side_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    run(&db, "CREATE TABLE users (id int, name string)").unwrap();
    run(&db, "CREATE TABLE orders (id int, user_id int)").unwrap();
    run(&db, "INSERT INTO users VALUES (1, 'alice')").unwrap();

    let result = run(
        &db,
        "SELECT * FROM users JOIN orders ON users.id = orders.user_id",
    )
    .unwrap();
    assert!(result.rows.is_empty());
}

#[test]
fn test_update_replaces_row_in_place() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    run(&db, "CREATE TABLE users (id int, name string, age int)").unwrap();
    run(&db, "INSERT INTO users VALUES (1, 'alice', 30)").unwrap();
    run(&db, "UPDATE users SET name = 'alicia', age = 31 WHERE id = 1").unwrap();

    let result = run(&db, "SELECT * FROM users").unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("name"), Some(&Value::from("alicia")));
    assert_eq!(result.rows[0].get("age"), Some(&Value::Integer(31)));
}

#[test]
fn test_update_unique_conflict_preserves_old_row() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    run(&db, "CREATE TABLE users (id int, name string UNIQUE)").unwrap();
    run(&db, "INSERT INTO users VALUES (1, 'alice')").unwrap();
    run(&db, "INSERT INTO users VALUES (2, 'bob')").unwrap();

    let err = run(&db, "UPDATE users SET name = 'alice' WHERE id = 2").unwrap_err();
    assert!(matches!(err, Error::UniqueConstraintViolation { .. }));

    let result = run(&db, "SELECT * FROM users WHERE id = 2").unwrap();
    assert_eq!(result.rows[0].get("name"), Some(&Value::from("bob")));
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let registry = Registry::new(dir.path()).unwrap();
        let db = registry.create_database("main").unwrap();
        run(&db, "CREATE TABLE users (id int, name string UNIQUE)").unwrap();
        run(&db, "INSERT INTO users VALUES (1, 'alice')").unwrap();
        run(&db, "INSERT INTO users VALUES (2, 'bob')").unwrap();
        run(&db, "DELETE FROM users WHERE id = 2").unwrap();
    }

    // A fresh registry over the same directory rebuilds indexes from the
    // table files.
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();
    run(&db, "CREATE TABLE users (id int, name string UNIQUE)").unwrap();

    let result = run(&db, "SELECT * FROM users").unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("name"), Some(&Value::from("alice")));

    // The unique index was rebuilt too.
    let err = run(&db, "INSERT INTO users VALUES (3, 'alice')").unwrap_err();
    assert!(matches!(err, Error::UniqueConstraintViolation { .. }));

    // The deleted name is available again.
    run(&db, "INSERT INTO users VALUES (2, 'bob')").unwrap();
}

#[test]
fn test_unknown_leading_keyword_is_rejected() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.create_database("main").unwrap();

    let err = run(&db, "VACUUM users").unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(_)));
}

#[test]
fn test_bootstrap_seed_queryable_through_commands() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::new(dir.path()).unwrap();
    let db = registry.bootstrap_default().unwrap();

    let result = run(&db, "SELECT * FROM users").unwrap();
    assert_eq!(result.rows.len(), 2);

    let result = run(
        &db,
        "SELECT * FROM users JOIN orders ON users.id = orders.user_id",
    )
    .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(
        result.rows[0].get("users.username"),
        Some(&Value::from("John Doe"))
    );
    assert_eq!(
        result.rows[0].get("orders.item"),
        Some(&Value::from("Laptop"))
    );
}
