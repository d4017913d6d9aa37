//! Schema derivation: table name, ordered columns and key columns of a model.

use std::fmt;
use std::marker::PhantomData;

use crate::attribute::AttributeInfo;
use crate::error::SqlMapperError;
use crate::model::{Field, Model};
use crate::types::{DataType, SqlValue, ValueKind};

/// Quote `name` as an SQL identifier, doubling any embedded `"`.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema metadata of one model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_indexed: bool,
}

impl Column {
    /// Native column type, `None` for kinds without a mapping.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        self.kind.data_type()
    }

    /// The column name as a quoted identifier.
    #[must_use]
    pub fn quoted_name(&self) -> String {
        quote_identifier(&self.name)
    }

    /// Column declaration used by `CREATE TABLE`.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if the column's kind has no native type.
    pub fn declaration(&self) -> Result<String, SqlMapperError> {
        let data_type = self.data_type().ok_or_else(|| {
            SqlMapperError::SchemaError(format!(
                "column `{}` has no SQL type for {:?} values",
                self.name, self.kind
            ))
        })?;
        let mut decl = format!("{} {data_type}", self.quoted_name());
        if self.is_primary_key {
            decl.push_str(" PRIMARY KEY");
        }
        if self.is_auto_increment {
            decl.push_str(" AUTOINCREMENT");
        }
        if !self.is_nullable {
            decl.push_str(" NOT NULL");
        }
        Ok(decl)
    }
}

/// Derived, read-only schema description of a model type.
///
/// Column order is the field table's order and never changes for the lifetime
/// of the mapping; result columns are matched against it by name.
pub struct TableMapping<M> {
    table_name: String,
    columns: Vec<Column>,
    fields: Vec<Field<M>>,
    primary_key: Option<usize>,
    auto_increment_primary_key: Option<usize>,
    query_by_primary_key_sql: String,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> TableMapping<M> {
    /// Derive the mapping of `M` from its field table and attributes.
    #[must_use]
    pub fn derive() -> Self {
        Self::from_parts(M::type_name(), M::fields(), &M::attributes())
    }
}

impl<M> TableMapping<M> {
    /// Derive a mapping from an explicit field table and attribute list.
    ///
    /// The first `TableName` attribute overrides `type_name`. When several
    /// fields are marked as primary key the first one in field order wins.
    #[must_use]
    pub fn from_parts(type_name: &str, fields: Vec<Field<M>>, attributes: &[AttributeInfo]) -> Self {
        let table_name = AttributeInfo::table_name_override(attributes)
            .unwrap_or(type_name)
            .to_string();

        let columns: Vec<Column> = fields
            .iter()
            .map(|field| {
                let caps = AttributeInfo::capabilities(field.name(), attributes);
                Column {
                    name: field.name().to_string(),
                    kind: field.kind(),
                    is_nullable: field.is_nullable(),
                    is_primary_key: caps.is_primary_key,
                    is_auto_increment: caps.is_auto_increment,
                    is_indexed: caps.is_indexed,
                }
            })
            .collect();

        let mut primary_key = None;
        let mut auto_increment_primary_key = None;
        for (idx, col) in columns.iter().enumerate() {
            if col.is_primary_key && primary_key.is_none() {
                primary_key = Some(idx);
            }
            if col.is_primary_key && col.is_auto_increment && auto_increment_primary_key.is_none() {
                auto_increment_primary_key = Some(idx);
            }
        }

        let quoted_table = quote_identifier(&table_name);
        let query_by_primary_key_sql = match primary_key {
            Some(idx) => format!(
                "SELECT * FROM {quoted_table} WHERE {} = ?",
                columns[idx].quoted_name()
            ),
            None => format!("SELECT * FROM {quoted_table} LIMIT 1"),
        };

        Self {
            table_name,
            columns,
            fields,
            primary_key,
            auto_increment_primary_key,
            query_by_primary_key_sql,
            _model: PhantomData,
        }
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The table name as a quoted identifier.
    #[must_use]
    pub fn quoted_table_name(&self) -> String {
        quote_identifier(&self.table_name)
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&Column> {
        self.primary_key.map(|idx| &self.columns[idx])
    }

    #[must_use]
    pub fn auto_increment_primary_key(&self) -> Option<&Column> {
        self.auto_increment_primary_key.map(|idx| &self.columns[idx])
    }

    #[must_use]
    pub fn has_auto_increment_primary_key(&self) -> bool {
        self.auto_increment_primary_key.is_some()
    }

    #[must_use]
    pub fn query_by_primary_key_sql(&self) -> &str {
        &self.query_by_primary_key_sql
    }

    /// Position and metadata of the column called `name`.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, col)| col.name == name)
    }

    /// Columns written by a plain `INSERT`: everything except the
    /// autoincrement primary key.
    pub fn insert_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, col)| !(col.is_primary_key && col.is_auto_increment))
    }

    /// Current value of the column at `index` in `obj`, `None` past the last
    /// column. Does not touch the mapping.
    #[must_use]
    pub fn value_of(&self, index: usize, obj: &M) -> Option<SqlValue> {
        self.fields.get(index).map(|field| field.get(obj))
    }

    /// Value of the primary key in `obj`.
    #[must_use]
    pub fn primary_key_value(&self, obj: &M) -> Option<SqlValue> {
        self.primary_key.and_then(|idx| self.value_of(idx, obj))
    }

    /// Write a decoded value into the field at `index`.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if `index` is not a column, or
    /// `SqlMapperError::DecodeError` if the value does not fit the field.
    pub fn assign(&self, index: usize, obj: &mut M, value: SqlValue) -> Result<(), SqlMapperError> {
        let field = self.fields.get(index).ok_or_else(|| {
            SqlMapperError::SchemaError(format!(
                "table {} has no column at index {index}",
                self.table_name
            ))
        })?;
        field.set(obj, value)
    }

    /// Store a generated rowid in the autoincrement primary key of `obj`.
    /// A no-op for tables without one.
    ///
    /// # Errors
    /// Returns `SqlMapperError::DecodeError` if the key field cannot hold `rowid`.
    pub fn set_auto_increment_primary_key(&self, obj: &mut M, rowid: i64) -> Result<(), SqlMapperError> {
        match self.auto_increment_primary_key {
            Some(idx) => self.assign(idx, obj, SqlValue::Integer(rowid)),
            None => Ok(()),
        }
    }

    /// Whether the autoincrement key of `obj` is still unassigned (NULL or zero).
    #[must_use]
    pub fn is_unsaved(&self, obj: &M) -> bool {
        self.auto_increment_primary_key
            .and_then(|idx| self.value_of(idx, obj))
            .is_some_and(|v| v.is_null() || v.as_integer() == Some(0))
    }

    /// Check the schema invariants `CREATE TABLE` relies on.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` on the first violated invariant.
    pub fn validate(&self) -> Result<(), SqlMapperError> {
        let auto: Vec<&Column> = self.columns.iter().filter(|c| c.is_auto_increment).collect();
        if auto.len() > 1 {
            return Err(SqlMapperError::SchemaError(format!(
                "table `{}` declares {} autoincrement columns",
                self.table_name,
                auto.len()
            )));
        }
        if let Some(col) = auto.first()
            && !(col.is_primary_key && col.data_type() == Some(DataType::Integer))
        {
            return Err(SqlMapperError::SchemaError(format!(
                "autoincrement column `{}` must be an integer primary key",
                col.name
            )));
        }
        Ok(())
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this mapping.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SchemaError` if the schema is invalid or a
    /// column has no native type.
    pub fn create_table_sql(&self) -> Result<String, SqlMapperError> {
        self.validate()?;
        let decls = self
            .columns
            .iter()
            .map(Column::declaration)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quoted_table_name(),
            decls.join(", ")
        ))
    }

    /// One `CREATE INDEX IF NOT EXISTS` statement per indexed column.
    #[must_use]
    pub fn create_index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_indexed)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    quote_identifier(&format!("{}_{}_idx", self.table_name, c.name)),
                    self.quoted_table_name(),
                    c.quoted_name()
                )
            })
            .collect()
    }
}

impl<M> PartialEq for TableMapping<M> {
    fn eq(&self, other: &Self) -> bool {
        self.table_name == other.table_name
            && self.columns == other.columns
            && self.primary_key == other.primary_key
            && self.auto_increment_primary_key == other.auto_increment_primary_key
            && self.query_by_primary_key_sql == other.query_by_primary_key_sql
    }
}

impl<M> fmt::Debug for TableMapping<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableMapping")
            .field("table_name", &self.table_name)
            .field("columns", &self.columns)
            .field("primary_key", &self.primary_key)
            .field("auto_increment_primary_key", &self.auto_increment_primary_key)
            .field("query_by_primary_key_sql", &self.query_by_primary_key_sql)
            .finish_non_exhaustive()
    }
}
