use tracing::{debug, warn};

use crate::error::SqlMapperError;
use crate::mapping::quote_identifier;
use crate::model::Model;

use super::TableQuery;

impl<M> TableQuery<'_, M> {
    /// WHERE, ORDER BY, LIMIT and OFFSET, each only when set, with a leading space.
    fn clauses(&self, with_ordering: bool) -> String {
        let state = &self.state;
        let mut sql = String::new();
        if !state.predicates.is_empty() {
            let joined = state
                .predicates
                .iter()
                .map(|p| format!("({p})"))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&joined);
        }
        if with_ordering && !state.orderings.is_empty() {
            let terms = state
                .orderings
                .iter()
                .map(super::Ordering::declaration)
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms);
        }
        match (state.limit, state.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // -1 is the engine's "no limit"; OFFSET is only valid after LIMIT
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
        sql
    }

    fn projection(&self) -> String {
        match self.state.distinct {
            Some(ref columns) if !columns.is_empty() => {
                let quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
                format!("DISTINCT {}", quoted.join(", "))
            }
            _ => "*".to_string(),
        }
    }

    /// The SELECT statement `to_list` would run.
    #[must_use]
    pub fn sql(&self) -> String {
        format!(
            "SELECT {} FROM {}{}",
            self.projection(),
            self.mapping.quoted_table_name(),
            self.clauses(true)
        )
    }

    /// The statement `count` would run.
    ///
    /// A distinct, limited or offset query is counted through a sub-select so
    /// the count matches the rows `to_list` returns.
    #[must_use]
    pub fn count_sql(&self) -> String {
        let state = &self.state;
        if state.distinct.is_some() || state.limit.is_some() || state.offset.is_some() {
            format!("SELECT COUNT(*) FROM ({})", self.sql())
        } else {
            format!(
                "SELECT COUNT(*) FROM {}{}",
                self.mapping.quoted_table_name(),
                self.clauses(false)
            )
        }
    }

    /// Number of rows the query selects.
    ///
    /// Any failure is logged and reported as 0.
    #[must_use]
    pub fn count(&self) -> usize {
        let sql = self.count_sql();
        match self.conn.execute_scalar::<i64>(&sql, &self.state.params) {
            Ok(n) => n
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, sql = %sql, "count failed; reporting 0");
                0
            }
        }
    }
}

impl<M: Model> TableQuery<'_, M> {
    /// Run the query and decode every row.
    ///
    /// # Errors
    /// Returns the prepare, execute or decode error of the underlying command.
    pub fn to_list(&self) -> Result<Vec<M>, SqlMapperError> {
        let sql = self.sql();
        debug!(sql = %sql, "table query");
        self.conn
            .create_command(&sql, &self.state.params)
            .execute_query(&self.mapping)
    }

    /// The first row of the query, if any.
    ///
    /// # Errors
    /// See [`TableQuery::to_list`].
    pub fn first(&self) -> Result<Option<M>, SqlMapperError> {
        Ok(self.limit(1).to_list()?.into_iter().next())
    }

    /// Rows of the query for which `predicate` holds.
    ///
    /// The predicate runs in memory over the decoded rows. Any failure is
    /// logged and reported as no rows.
    pub fn filter<F>(&self, predicate: F) -> Vec<M>
    where
        F: Fn(&M) -> bool,
    {
        match self.to_list() {
            Ok(rows) => rows.into_iter().filter(|row| predicate(row)).collect(),
            Err(err) => {
                warn!(error = %err, table = self.mapping.table_name(), "filter failed; reporting no rows");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Field, Model};
    use crate::query_builder::Direction;
    use crate::sqlite::Connection;
    use crate::types::SqlValue;

    #[derive(Debug, Default)]
    struct Player {
        id: i64,
        name: String,
        age: i32,
    }

    impl Model for Player {
        fn fields() -> Vec<Field<Self>> {
            crate::model_fields!(Player { id, name, age })
        }
    }

    #[test]
    fn builder_methods_leave_receiver_unchanged() {
        let conn = Connection::open_in_memory().unwrap();
        let base = conn.table::<Player>();
        let limited = base.limit(3);
        let ordered = limited.order_by_desc("age");
        assert_eq!(base.sql(), r#"SELECT * FROM "Player""#);
        assert_eq!(limited.sql(), r#"SELECT * FROM "Player" LIMIT 3"#);
        assert_eq!(ordered.sql(), r#"SELECT * FROM "Player" ORDER BY "age" DESC LIMIT 3"#);
        assert_eq!(base.state().limit, None);
    }

    #[test]
    fn clauses_assemble_in_order() {
        let conn = Connection::open_in_memory().unwrap();
        let query = conn
            .table::<Player>()
            .offset(2)
            .where_clause("age > ?", &[SqlValue::from(10)])
            .order_by("name", Direction::Asc)
            .order_by_desc("age")
            .where_clause("name <> ?", &[SqlValue::from("x")])
            .limit(5);
        assert_eq!(
            query.sql(),
            r#"SELECT * FROM "Player" WHERE (age > ?) AND (name <> ?) ORDER BY "name" ASC, "age" DESC LIMIT 5 OFFSET 2"#
        );
        assert_eq!(query.state().params.len(), 2);
    }

    #[test]
    fn offset_without_limit_is_unbounded() {
        let conn = Connection::open_in_memory().unwrap();
        let query = conn.table::<Player>().offset(4);
        assert_eq!(query.sql(), r#"SELECT * FROM "Player" LIMIT -1 OFFSET 4"#);
    }

    #[test]
    fn count_statement_shapes() {
        let conn = Connection::open_in_memory().unwrap();
        let base = conn.table::<Player>().order_by_asc("age");
        assert_eq!(base.count_sql(), r#"SELECT COUNT(*) FROM "Player""#);
        assert_eq!(
            base.distinct(["age"]).count_sql(),
            r#"SELECT COUNT(*) FROM (SELECT DISTINCT "age" FROM "Player" ORDER BY "age" ASC)"#
        );
    }

    #[test]
    fn count_and_filter_degrade_on_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let query = conn.table::<Player>();
        assert_eq!(query.count(), 0);
        assert!(query.filter(|_| true).is_empty());
        assert!(query.to_list().is_err());
        assert_eq!(conn.outstanding_statements(), 0);
    }
}
