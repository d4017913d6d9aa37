use crate::error::SqlMapperError;
use crate::model::Model;
use crate::query_builder::TableQuery;
use crate::types::SqlValue;

use super::Connection;

impl Connection {
    /// Look up the row of `M` whose primary key equals `key`.
    ///
    /// For a model without a primary key this returns an arbitrary row, if any.
    ///
    /// # Errors
    /// Returns an execution or decode error from the underlying query.
    pub fn get<M: Model>(&self, key: impl Into<SqlValue>) -> Result<Option<M>, SqlMapperError> {
        let map = self.mapping::<M>();
        let mut cmd = self.create_command(map.query_by_primary_key_sql(), &[]);
        if map.primary_key().is_some() {
            cmd.bind(key);
        }
        Ok(cmd.execute_query(&map)?.into_iter().next())
    }

    /// Start a query over every row of `M`'s table.
    #[must_use]
    pub fn table<M: Model>(&self) -> TableQuery<'_, M> {
        TableQuery::new(self, self.mapping::<M>())
    }

    /// Run arbitrary SQL and decode its rows into `M` by column name.
    ///
    /// # Errors
    /// See [`Command::execute_query`](crate::sqlite::Command::execute_query).
    pub fn query<M: Model>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<M>, SqlMapperError> {
        let map = self.mapping::<M>();
        self.create_command(sql, params).execute_query(&map)
    }
}
