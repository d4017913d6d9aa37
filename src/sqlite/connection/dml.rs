use tracing::debug;

use crate::error::SqlMapperError;
use crate::mapping::{quote_identifier, TableMapping};
use crate::model::Model;
use crate::sqlite::prepared::PreparedInsertCommand;
use crate::types::SqlValue;

use super::Connection;

/// Which columns an INSERT writes and how it treats conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertMode {
    /// Every column except the autoincrement key
    Plain,
    /// Every column, replacing conflicting rows
    Replace,
    /// Every column, skipping conflicting rows
    Ignore,
}

fn insert_sql<M>(map: &TableMapping<M>, mode: InsertMode) -> (String, Vec<usize>) {
    let indices: Vec<usize> = match mode {
        InsertMode::Plain => map.insert_columns().map(|(idx, _)| idx).collect(),
        InsertMode::Replace | InsertMode::Ignore => (0..map.columns().len()).collect(),
    };
    let verb = match mode {
        InsertMode::Plain => "INSERT",
        InsertMode::Replace => "INSERT OR REPLACE",
        InsertMode::Ignore => "INSERT OR IGNORE",
    };
    if indices.is_empty() {
        return (
            format!("{verb} INTO {} DEFAULT VALUES", map.quoted_table_name()),
            indices,
        );
    }
    let names: Vec<String> = indices
        .iter()
        .map(|&idx| map.columns()[idx].quoted_name())
        .collect();
    let placeholders = vec!["?"; indices.len()].join(", ");
    let sql = format!(
        "{verb} INTO {} ({}) VALUES ({placeholders})",
        map.quoted_table_name(),
        names.join(", ")
    );
    (sql, indices)
}

fn values_at<M>(map: &TableMapping<M>, indices: &[usize], obj: &M) -> Vec<SqlValue> {
    indices.iter().filter_map(|&idx| map.value_of(idx, obj)).collect()
}

fn require_primary_key<'m, M>(
    map: &'m TableMapping<M>,
    action: &str,
) -> Result<(usize, &'m str), SqlMapperError> {
    let pk = map.primary_key().ok_or_else(|| {
        SqlMapperError::SchemaError(format!(
            "Could not {action} table {} without primary key",
            map.table_name()
        ))
    })?;
    let (idx, col) = map
        .find_column(&pk.name)
        .ok_or_else(|| SqlMapperError::SchemaError(format!("missing column {}", pk.name)))?;
    Ok((idx, col.name.as_str()))
}

impl Connection {
    /// Create the table of `M` and its indexes if they do not exist yet.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if the mapping cannot be expressed as
    /// DDL, or an execution error from the engine.
    pub fn create_table<M: Model>(&self) -> Result<(), SqlMapperError> {
        let map = self.mapping::<M>();
        let ddl = map.create_table_sql()?;
        debug!(table = map.table_name(), ddl = %ddl, "create table");
        self.execute(&ddl, &[])?;
        for index in map.create_index_sql() {
            self.execute(&index, &[])?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns an execution error from the engine.
    pub fn drop_table<M: Model>(&self) -> Result<(), SqlMapperError> {
        let map = self.mapping::<M>();
        self.execute(&format!("DROP TABLE IF EXISTS {}", map.quoted_table_name()), &[])?;
        Ok(())
    }

    /// Insert `obj`, writing the generated rowid back into its autoincrement
    /// primary key. Returns rows inserted.
    ///
    /// # Errors
    /// Returns `SqlMapperError::NotNullConstraintViolation` for constraint
    /// failures and `SqlMapperError::ExecuteError` for other engine failures.
    pub fn insert<M: Model>(&self, obj: &mut M) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        let affected = self.insert_with_mode(&map, obj, InsertMode::Plain)?;
        if affected > 0 {
            map.set_auto_increment_primary_key(obj, self.last_insert_rowid())?;
        }
        Ok(affected)
    }

    /// Insert every object through one reusable prepared statement.
    ///
    /// Rows inserted before a failure stay inserted.
    ///
    /// # Errors
    /// Same as [`Connection::insert`], for the first failing object.
    pub fn insert_all<M: Model>(&self, objs: &mut [M]) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        let (sql, indices) = insert_sql(&map, InsertMode::Plain);
        let mut cmd = PreparedInsertCommand::new(self, sql);
        let mut total = 0;
        for obj in objs.iter_mut() {
            let values = values_at(&map, &indices, obj);
            let affected = cmd.execute_non_query(&values)?;
            if affected > 0 {
                map.set_auto_increment_primary_key(obj, self.last_insert_rowid())?;
            }
            total += affected;
        }
        debug!(table = map.table_name(), rows = total, "batch insert");
        Ok(total)
    }

    /// Insert `obj` including its primary key, replacing any row with the same key.
    ///
    /// # Errors
    /// Returns an execution error from the engine.
    pub fn insert_or_replace<M: Model>(&self, obj: &M) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        self.insert_with_mode(&map, obj, InsertMode::Replace)
    }

    fn insert_with_mode<M: Model>(
        &self,
        map: &TableMapping<M>,
        obj: &M,
        mode: InsertMode,
    ) -> Result<usize, SqlMapperError> {
        let (sql, indices) = insert_sql(map, mode);
        self.execute(&sql, &values_at(map, &indices, obj))
    }

    /// Update every non-key column of the row whose primary key matches `obj`.
    /// Returns rows updated.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if `M` has no primary key, or an
    /// execution error from the engine.
    pub fn update<M: Model>(&self, obj: &M) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        let (pk_idx, pk_name) = require_primary_key(&map, "update")?;
        let mut cols: Vec<usize> = (0..map.columns().len()).filter(|&i| i != pk_idx).collect();
        if cols.is_empty() {
            return Ok(0);
        }
        let sets = cols
            .iter()
            .map(|&i| format!("{} = ?", map.columns()[i].quoted_name()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {sets} WHERE {} = ?",
            map.quoted_table_name(),
            quote_identifier(pk_name)
        );
        // the key binds last, after every SET value
        cols.push(pk_idx);
        self.execute(&sql, &values_at(&map, &cols, obj))
    }

    /// Insert `obj`, or update the existing row with the same primary key.
    ///
    /// An object whose autoincrement key is still unassigned (zero or NULL) is
    /// always inserted. Otherwise the row is inserted with its key and
    /// `INSERT OR IGNORE`; when that changes nothing, the row is updated.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if `M` has no primary key, or an
    /// execution error from the engine.
    pub fn insert_or_update<M: Model>(&self, obj: &mut M) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        require_primary_key(&map, "insert or update")?;
        if map.is_unsaved(obj) {
            return self.insert(obj);
        }
        let inserted = self.insert_with_mode(&map, obj, InsertMode::Ignore)?;
        if inserted > 0 {
            return Ok(inserted);
        }
        self.update(obj)
    }

    /// Delete the row whose primary key matches `obj`. Returns rows deleted.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if `M` has no primary key, or an
    /// execution error from the engine.
    pub fn delete<M: Model>(&self, obj: &M) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        require_primary_key(&map, "delete from")?;
        let key = map.primary_key_value(obj).unwrap_or(SqlValue::Null);
        self.delete_by_primary_key::<M>(key)
    }

    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if `M` has no primary key, or an
    /// execution error from the engine.
    pub fn delete_by_primary_key<M: Model>(
        &self,
        key: impl Into<SqlValue>,
    ) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        let (_, pk_name) = require_primary_key(&map, "delete from")?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            map.quoted_table_name(),
            quote_identifier(pk_name)
        );
        self.execute(&sql, &[key.into()])
    }

    /// Delete every row of `M`'s table. Returns rows deleted.
    ///
    /// # Errors
    /// Returns an execution error from the engine.
    pub fn delete_all<M: Model>(&self) -> Result<usize, SqlMapperError> {
        let map = self.mapping::<M>();
        self.execute(&format!("DELETE FROM {}", map.quoted_table_name()), &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeInfo;
    use crate::model::Field;

    #[derive(Debug, Default)]
    struct Note {
        id: i64,
        body: String,
    }

    impl Model for Note {
        fn attributes() -> Vec<AttributeInfo> {
            vec![
                AttributeInfo::primary_key("id"),
                AttributeInfo::auto_increment("id"),
            ]
        }

        fn fields() -> Vec<Field<Self>> {
            crate::model_fields!(Note { id, body })
        }
    }

    #[test]
    fn insert_statement_shapes() {
        let map = TableMapping::<Note>::derive();
        assert_eq!(
            insert_sql(&map, InsertMode::Plain).0,
            r#"INSERT INTO "Note" ("body") VALUES (?)"#
        );
        assert_eq!(
            insert_sql(&map, InsertMode::Replace).0,
            r#"INSERT OR REPLACE INTO "Note" ("id", "body") VALUES (?, ?)"#
        );
        assert_eq!(insert_sql(&map, InsertMode::Ignore).1, [0, 1]);
    }
}
