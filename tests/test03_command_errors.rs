use serde_json::json;
use sql_mapper::prelude::*;

fn setup() -> Result<Connection, SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(
        "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT NOT NULL, qty INTEGER);
         INSERT INTO item (id, name, qty) VALUES (1, 'bolt', 10);",
    )?;
    Ok(conn)
}

#[test]
fn bad_sql_is_a_prepare_error() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let err = conn.execute("INSERT INTO missing VALUES (?)", &[1.into()]).unwrap_err();
    assert!(matches!(err, SqlMapperError::PrepareError(_)), "{err:?}");
    let err = conn.execute("SELEKT 1", &[]).unwrap_err();
    assert!(matches!(err, SqlMapperError::PrepareError(_)));
    assert_eq!(conn.outstanding_statements(), 0);
    Ok(())
}

#[test]
fn not_null_violation_carries_extended_code() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let err = conn
        .execute(
            "INSERT INTO item (id, name) VALUES (?, ?)",
            &[2.into(), SqlValue::Null],
        )
        .unwrap_err();
    match err {
        SqlMapperError::NotNullConstraintViolation { code, ref message } => {
            assert_eq!(code, rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL);
            assert!(message.contains("item.name"), "{message}");
        }
        other => panic!("expected constraint violation, got {other:?}"),
    }
    assert_eq!(conn.outstanding_statements(), 0);
    Ok(())
}

#[test]
fn unsupported_parameter_never_steps_the_statement() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let err = conn
        .execute(
            "INSERT INTO item (id, name, qty) VALUES (?, ?, ?)",
            &[3.into(), "washer".into(), SqlValue::Json(json!([1, 2, 3]))],
        )
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::UnsupportedParameterType(_)));

    let rows: Option<i64> = conn.execute_scalar("SELECT COUNT(*) FROM item", &[])?;
    assert_eq!(rows, Some(1));
    assert_eq!(conn.outstanding_statements(), 0);
    Ok(())
}

#[test]
fn non_query_that_returns_rows_is_an_execute_error() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let err = conn.execute("SELECT * FROM item", &[]).unwrap_err();
    assert!(matches!(err, SqlMapperError::ExecuteError { .. }), "{err:?}");
    assert_eq!(err.code(), Some(rusqlite::ffi::SQLITE_ROW));
    Ok(())
}

#[test]
fn named_and_positional_bindings_mix() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let mut cmd = conn.create_command(
        "INSERT INTO item (id, qty, name) VALUES (?1, ?2, :name)",
        &[],
    );
    cmd.bind(5).bind_named(":name", "nut").bind(25);
    assert_eq!(cmd.execute_non_query()?, 1);
    assert_eq!(cmd.bindings()[1].index, 3);
    assert_eq!(cmd.bindings()[2].index, 2);

    let qty: Option<i32> =
        conn.execute_scalar("SELECT qty FROM item WHERE name = ?", &["nut".into()])?;
    assert_eq!(qty, Some(25));

    let mut unknown = conn.create_command("SELECT :a", &[]);
    unknown.bind_named(":b", 1);
    assert!(matches!(
        unknown.execute_scalar::<i32>(),
        Err(SqlMapperError::ParameterError(_))
    ));
    Ok(())
}

#[test]
fn scalar_of_empty_result_is_none() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let name: Option<String> =
        conn.execute_scalar("SELECT name FROM item WHERE id = ?", &[99.into()])?;
    assert_eq!(name, None);
    let qty: Option<i32> = conn.execute_scalar("SELECT NULL", &[])?;
    assert_eq!(qty, None);
    Ok(())
}

#[test]
fn prepared_statements_are_counted_until_dropped() -> Result<(), SqlMapperError> {
    let conn = setup()?;
    let mut cmd = conn.create_command("SELECT qty FROM item WHERE id = ?", &[1.into()]);
    let stmt = cmd.prepare()?;
    assert_eq!(conn.outstanding_statements(), 1);
    drop(stmt);
    assert_eq!(conn.outstanding_statements(), 0);

    let mut insert = PreparedInsertCommand::new(&conn, "INSERT INTO item (id, name) VALUES (?, ?)");
    assert!(!insert.is_prepared());
    insert.execute_non_query(&[10.into(), "a".into()])?;
    insert.execute_non_query(&[11.into(), "b".into()])?;
    assert!(insert.is_prepared());
    assert_eq!(conn.outstanding_statements(), 1);
    drop(insert);
    assert_eq!(conn.outstanding_statements(), 0);

    let rows: Option<i64> = conn.execute_scalar("SELECT COUNT(*) FROM item", &[])?;
    assert_eq!(rows, Some(3));
    Ok(())
}

#[test]
fn reused_insert_rejects_short_argument_lists() -> Result<(), SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("CREATE TABLE pair (a INTEGER, b TEXT);")?;
    let mut insert = PreparedInsertCommand::new(&conn, "INSERT INTO pair (a, b) VALUES (?, ?)");
    assert_eq!(insert.execute_non_query(&[1.into(), "x".into()])?, 1);

    let err = insert.execute_non_query(&[2.into()]).unwrap_err();
    assert!(matches!(err, SqlMapperError::ParameterError(_)), "{err:?}");
    let err = insert
        .execute_non_query(&[3.into(), "y".into(), "z".into()])
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ParameterError(_)), "{err:?}");

    // the earlier row's values were not reused for a second insert
    let rows: Option<i64> = conn.execute_scalar("SELECT COUNT(*) FROM pair", &[])?;
    assert_eq!(rows, Some(1));

    assert_eq!(insert.execute_non_query(&[4.into(), SqlValue::Null])?, 1);
    let b: Option<String> = conn.execute_scalar("SELECT b FROM pair WHERE a = ?", &[4.into()])?;
    assert_eq!(b, None);
    drop(insert);
    assert_eq!(conn.outstanding_statements(), 0);
    Ok(())
}
