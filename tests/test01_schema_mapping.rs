use sql_mapper::prelude::*;
use sql_mapper::types::DataType;

#[derive(Debug, Default, Clone, PartialEq)]
struct Customer {
    id: i64,
    email: String,
    nickname: Option<String>,
    score: f64,
}

impl Model for Customer {
    fn attributes() -> Vec<AttributeInfo> {
        vec![
            AttributeInfo::table_name("customers"),
            AttributeInfo::primary_key("id"),
            AttributeInfo::auto_increment("id"),
            AttributeInfo::indexed("email"),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        model_fields!(Customer { id, email, nickname, score })
    }
}

#[derive(Debug, Default)]
struct LogLine {
    message: String,
    level: i32,
}

impl Model for LogLine {
    fn fields() -> Vec<Field<Self>> {
        model_fields!(LogLine { message, level })
    }
}

#[derive(Debug, Default)]
struct TwoKeys {
    first: i32,
    second: i32,
}

impl Model for TwoKeys {
    fn attributes() -> Vec<AttributeInfo> {
        vec![
            AttributeInfo::primary_key("second"),
            AttributeInfo::primary_key("first"),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        model_fields!(TwoKeys { first, second })
    }
}

#[test]
fn mapping_derivation_is_idempotent() {
    let a = TableMapping::<Customer>::derive();
    let b = TableMapping::<Customer>::derive();
    assert_eq!(a, b);
    assert_eq!(a.table_name(), "customers");
    assert_eq!(
        a.columns().iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        ["id", "email", "nickname", "score"]
    );
    assert_eq!(a.columns()[3].data_type(), Some(DataType::Real));
    assert!(a.columns()[2].is_nullable);
    assert!(!a.columns()[1].is_nullable);
}

#[test]
fn first_primary_key_in_field_order_wins() {
    let map = TableMapping::<TwoKeys>::derive();
    assert_eq!(map.primary_key().map(|c| c.name.as_str()), Some("first"));
    assert_eq!(map.query_by_primary_key_sql(), r#"SELECT * FROM "TwoKeys" WHERE "first" = ?"#);
}

#[test]
fn model_without_key_looks_up_any_row() {
    let map = TableMapping::<LogLine>::derive();
    assert!(map.primary_key().is_none());
    assert!(!map.has_auto_increment_primary_key());
    assert_eq!(map.query_by_primary_key_sql(), r#"SELECT * FROM "LogLine" LIMIT 1"#);
}

#[test]
fn connection_caches_one_mapping_per_type() -> Result<(), SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    let first = conn.mapping::<Customer>();
    let second = conn.mapping::<Customer>();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(conn.mapping::<LogLine>().table_name(), "LogLine");
    Ok(())
}

#[test]
fn create_table_builds_table_and_indexes() -> Result<(), SqlMapperError> {
    let conn = Connection::open_in_memory()?;
    conn.create_table::<Customer>()?;
    // IF NOT EXISTS makes a second call harmless
    conn.create_table::<Customer>()?;

    let tables: Option<i64> = conn.execute_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        &[SqlValue::from("customers")],
    )?;
    assert_eq!(tables, Some(1));

    let index: Option<String> = conn.execute_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?",
        &[SqlValue::from("customers")],
    )?;
    assert_eq!(index.as_deref(), Some("customers_email_idx"));

    conn.drop_table::<Customer>()?;
    let tables: Option<i64> = conn.execute_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE name = 'customers'",
        &[],
    )?;
    assert_eq!(tables, Some(0));
    Ok(())
}
