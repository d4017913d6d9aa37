use std::fmt;
use std::sync::Arc;

use crate::mapping::{quote_identifier, TableMapping};
use crate::sqlite::Connection;
use crate::types::SqlValue;

mod select;

/// Sort direction of one ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub direction: Direction,
}

impl Ordering {
    #[must_use]
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// The term as it appears in SQL, e.g. `"age" DESC`.
    #[must_use]
    pub fn declaration(&self) -> String {
        format!("{} {}", quote_identifier(&self.column), self.direction.as_sql())
    }
}

/// Accumulated clauses of a [`TableQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub orderings: Vec<Ordering>,
    /// Raw WHERE fragments, AND-joined
    pub predicates: Vec<String>,
    /// Parameters for the `?` placeholders in `predicates`, in order
    pub params: Vec<SqlValue>,
    /// Column list for `SELECT DISTINCT`
    pub distinct: Option<Vec<String>>,
}

/// Fluent, copy-on-write query over one model's table.
///
/// Builder methods take `&self` and return a new query, so a base query can
/// be specialized several ways without being changed. No SQL is generated or
/// run until a terminal method (`count`, `to_list`, `first`, `filter`) is called.
///
/// ```rust,no_run
/// # use sql_mapper::prelude::*;
/// # #[derive(Default)] struct User { id: i64, age: i32 }
/// # impl Model for User {
/// #     fn fields() -> Vec<Field<Self>> { model_fields!(User { id, age }) }
/// # }
/// # fn demo(conn: &Connection) -> Result<(), SqlMapperError> {
/// let adults = conn.table::<User>().where_clause("age >= ?", &[SqlValue::from(18)]);
/// let youngest = adults.order_by_asc("age").limit(3).to_list()?;
/// let total = adults.count();
/// # let _ = (youngest, total);
/// # Ok(())
/// # }
/// ```
pub struct TableQuery<'conn, M> {
    conn: &'conn Connection,
    mapping: Arc<TableMapping<M>>,
    state: QueryState,
}

impl<'conn, M> TableQuery<'conn, M> {
    pub(crate) fn new(conn: &'conn Connection, mapping: Arc<TableMapping<M>>) -> Self {
        Self {
            conn,
            mapping,
            state: QueryState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    #[must_use]
    pub fn mapping(&self) -> &TableMapping<M> {
        &self.mapping
    }

    fn with(&self, change: impl FnOnce(&mut QueryState)) -> Self {
        let mut state = self.state.clone();
        change(&mut state);
        Self {
            conn: self.conn,
            mapping: Arc::clone(&self.mapping),
            state,
        }
    }

    #[must_use]
    pub fn limit(&self, n: usize) -> Self {
        self.with(|state| state.limit = Some(n))
    }

    #[must_use]
    pub fn offset(&self, n: usize) -> Self {
        self.with(|state| state.offset = Some(n))
    }

    /// Append an ORDER BY term after any existing ones.
    #[must_use]
    pub fn order_by(&self, column: impl Into<String>, direction: Direction) -> Self {
        let ordering = Ordering::new(column, direction);
        self.with(|state| state.orderings.push(ordering))
    }

    #[must_use]
    pub fn order_by_asc(&self, column: impl Into<String>) -> Self {
        self.order_by(column, Direction::Asc)
    }

    #[must_use]
    pub fn order_by_desc(&self, column: impl Into<String>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// Add a raw SQL condition with `?` placeholders bound from `params`.
    ///
    /// Several conditions are AND-joined.
    #[must_use]
    pub fn where_clause(&self, fragment: impl Into<String>, params: &[SqlValue]) -> Self {
        let fragment = fragment.into();
        self.with(|state| {
            state.predicates.push(fragment);
            state.params.extend_from_slice(params);
        })
    }

    /// Select only distinct combinations of `columns`.
    #[must_use]
    pub fn distinct<S: Into<String>>(&self, columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.with(|state| state.distinct = Some(columns))
    }
}

impl<M> Clone for TableQuery<'_, M> {
    fn clone(&self) -> Self {
        self.with(|_| {})
    }
}

impl<M> fmt::Debug for TableQuery<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableQuery")
            .field("table", &self.mapping.table_name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
