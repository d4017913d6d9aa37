use sql_mapper::prelude::*;
use tempfile::tempdir;

#[derive(Debug, Default, Clone, PartialEq)]
struct Task {
    id: i64,
    title: String,
    done: bool,
    notes: Option<String>,
}

impl Model for Task {
    fn attributes() -> Vec<AttributeInfo> {
        vec![
            AttributeInfo::table_name("tasks"),
            AttributeInfo::primary_key("id"),
            AttributeInfo::auto_increment("id"),
            AttributeInfo::indexed("title"),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        model_fields!(Task { id, title, done, notes })
    }
}

/// Keyed by a natural key rather than a generated one.
#[derive(Debug, Default, Clone, PartialEq)]
struct Setting {
    key: String,
    value: String,
}

impl Model for Setting {
    fn attributes() -> Vec<AttributeInfo> {
        vec![AttributeInfo::primary_key("key")]
    }

    fn fields() -> Vec<Field<Self>> {
        model_fields!(Setting { key, value })
    }
}

#[derive(Debug, Default, Clone)]
struct Event {
    name: String,
}

impl Model for Event {
    fn fields() -> Vec<Field<Self>> {
        model_fields!(Event { name })
    }
}

/// Table and column names that are SQL keywords.
#[derive(Debug, Default, Clone, PartialEq)]
struct Order {
    id: i64,
    group: String,
}

impl Model for Order {
    fn attributes() -> Vec<AttributeInfo> {
        vec![
            AttributeInfo::primary_key("id"),
            AttributeInfo::auto_increment("id"),
            AttributeInfo::indexed("group"),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        model_fields!(Order { id, group })
    }
}

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

fn task(title: &str) -> Task {
    Task {
        title: title.to_string(),
        ..Task::default()
    }
}

#[test]
fn insert_get_update_delete() -> Result<(), SqlMapperError> {
    let conn = ConnectionOptionsBuilder::new(unique_db_path("crud"))
        .wal(true)
        .open()?;
    conn.create_table::<Task>()?;

    let mut first = task("write docs");
    assert_eq!(conn.insert(&mut first)?, 1);
    assert_eq!(first.id, conn.last_insert_rowid());

    first.done = true;
    first.notes = Some("shipped".into());
    assert_eq!(conn.update(&first)?, 1);
    assert_eq!(conn.changes(), 1);
    assert_eq!(conn.get::<Task>(first.id)?, Some(first.clone()));

    assert_eq!(conn.delete(&first)?, 1);
    assert_eq!(conn.get::<Task>(first.id)?, None);
    assert_eq!(conn.delete(&first)?, 0);
    Ok(())
}

#[test]
fn insert_all_reuses_one_statement() -> Result<(), SqlMapperError> {
    let conn = Connection::open_path(unique_db_path("batch"))?;
    conn.create_table::<Task>()?;

    let mut batch: Vec<Task> = ["a", "b", "c"].into_iter().map(task).collect();
    assert_eq!(conn.insert_all(&mut batch)?, 3);
    assert_eq!(batch.iter().map(|t| t.id).collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(conn.outstanding_statements(), 0);
    assert_eq!(conn.table::<Task>().count(), 3);

    assert_eq!(conn.delete_by_primary_key::<Task>(2_i64)?, 1);
    assert_eq!(conn.table::<Task>().count(), 2);
    assert_eq!(conn.delete_all::<Task>()?, 2);
    assert_eq!(conn.changes(), 2);
    assert_eq!(conn.table::<Task>().count(), 0);
    Ok(())
}

#[test]
fn natural_keys_insert_or_replace_and_upsert() -> Result<(), SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    conn.create_table::<Setting>()?;

    let mut theme = Setting {
        key: "theme".into(),
        value: "dark".into(),
    };
    assert_eq!(conn.insert(&mut theme)?, 1);
    let err = conn.insert(&mut theme).unwrap_err();
    assert!(matches!(err, SqlMapperError::NotNullConstraintViolation { .. }), "{err:?}");

    theme.value = "light".into();
    conn.insert_or_replace(&theme)?;
    assert_eq!(conn.get::<Setting>("theme")?.map(|s| s.value), Some("light".into()));

    theme.value = "solarized".into();
    assert_eq!(conn.insert_or_update(&mut theme)?, 1);
    let mut font = Setting {
        key: "font".into(),
        value: "mono".into(),
    };
    assert_eq!(conn.insert_or_update(&mut font)?, 1);

    let all = conn.query::<Setting>("SELECT * FROM Setting ORDER BY key", &[])?;
    assert_eq!(all, [font, theme]);
    Ok(())
}

#[test]
fn tables_without_primary_key_reject_keyed_writes() -> Result<(), SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    conn.create_table::<Event>()?;
    let mut event = Event {
        name: "boot".into(),
    };
    conn.insert(&mut event)?;

    assert!(matches!(conn.update(&event), Err(SqlMapperError::SchemaError(_))));
    assert!(matches!(conn.delete(&event), Err(SqlMapperError::SchemaError(_))));
    // lookup without a key returns some row
    assert_eq!(conn.get::<Event>(SqlValue::Null)?.map(|e| e.name), Some("boot".into()));
    Ok(())
}

#[test]
fn keyword_named_tables_and_columns_round_trip() -> Result<(), SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    conn.create_table::<Order>()?;

    let mut first = Order {
        id: 0,
        group: "b".into(),
    };
    let mut batch = vec![Order {
        id: 0,
        group: "a".into(),
    }];
    conn.insert(&mut first)?;
    conn.insert_all(&mut batch)?;
    assert_eq!((first.id, batch[0].id), (1, 2));

    assert_eq!(conn.get::<Order>(1_i64)?, Some(first.clone()));
    let orders = conn.table::<Order>();
    assert_eq!(orders.count(), 2);
    assert_eq!(orders.distinct(["group"]).count(), 2);
    let sorted = orders.order_by_asc("group").to_list()?;
    assert_eq!(sorted, [batch[0].clone(), first.clone()]);

    first.group = "c".into();
    assert_eq!(conn.update(&first)?, 1);
    assert_eq!(conn.insert_or_update(&mut first)?, 1);
    assert_eq!(conn.get::<Order>(1_i64)?.map(|o| o.group), Some("c".into()));

    assert_eq!(conn.delete(&first)?, 1);
    assert_eq!(conn.delete_all::<Order>()?, 1);
    assert_eq!(orders.count(), 0);
    conn.drop_table::<Order>()?;
    Ok(())
}

#[test]
fn invalid_options_are_rejected() {
    let err = ConnectionOptionsBuilder::new("").open().unwrap_err();
    assert!(matches!(err, SqlMapperError::ConfigError(_)));

    let missing = unique_db_path("never-created");
    let err = ConnectionOptionsBuilder::new(missing).create(false).open().unwrap_err();
    assert!(matches!(err, SqlMapperError::OpenDatabaseError { .. }), "{err:?}");
}
