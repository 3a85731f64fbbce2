//! Prepared statement wrapper: lazy preparation, re-binding and result
//! materialization

use crate::error::{Error, Result};
use crate::executor::{Connection, Statement};
use crate::params::{coerce_int, Binding, ParamKey, Params, Slot};
use crate::row::{FetchMap, MapOption, Row};
use crate::value::Value;
use serde::de::DeserializeOwned;
use std::fmt;

/// Options carried from the builder to the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Default grouping for [`Query::fetch_map`], set by `select_map`
    pub fetch_map: Option<MapOption>,
}

/// SQL text plus bindings, prepared on first execution.
///
/// The driver handle is created lazily and reused: executing again only
/// releases the previous cursor and re-binds slot parameters. Switching to a
/// different connection discards the handle and prepares a new one. The
/// handle is released when the query is closed or dropped.
pub struct Query<'c, C: Connection> {
    sql: String,
    params: Params,
    options: QueryOptions,
    connection: Option<&'c C>,
    last_connection: Option<&'c C>,
    statement: Option<C::Statement>,
}

impl<'c, C: Connection> Query<'c, C> {
    /// Wrap hand-written SQL. Named keys match `:name` placeholders,
    /// positional keys are 1-based and match `?` placeholders.
    pub fn new(sql: impl Into<String>, params: impl Into<Params>) -> Self {
        Self {
            sql: sql.into(),
            params: params.into(),
            options: QueryOptions::default(),
            connection: None,
            last_connection: None,
            statement: None,
        }
    }

    /// Builder-style [`Query::set_connection`]
    pub fn on(mut self, connection: &'c C) -> Self {
        self.connection = Some(connection);
        self
    }

    pub(crate) fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `connection` for the next execution
    pub fn set_connection(&mut self, connection: &'c C) {
        self.connection = Some(connection);
    }

    pub fn sql_text(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Bind a value, re-binding on the live handle if there is one
    pub fn bind_value(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Result<()> {
        self.bind(key.into(), Binding::Value(value.into()))
    }

    /// Bind a value coerced to an integer
    pub fn bind_int_value(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Result<()> {
        self.bind(key.into(), Binding::Value(coerce_int(&value.into())))
    }

    /// Bind a slot; its current value is read at every execution
    pub fn bind_slot(&mut self, key: impl Into<ParamKey>, slot: &Slot) -> Result<()> {
        self.bind(key.into(), Binding::Slot(slot.clone()))
    }

    /// Bind a slot whose value is coerced to an integer at every execution
    pub fn bind_int_slot(&mut self, key: impl Into<ParamKey>, slot: &Slot) -> Result<()> {
        self.bind(key.into(), Binding::IntSlot(slot.clone()))
    }

    fn bind(&mut self, key: ParamKey, binding: Binding) -> Result<()> {
        if let Some(statement) = self.statement.as_mut() {
            statement.close_cursor();
            let value = binding.current();
            statement.bind_value(&key, &value, value.param_type())?;
        }
        self.params.bind(key, binding);
        Ok(())
    }

    /// Replace every binding; the live handle is closed
    pub fn set_bind_values(&mut self, params: impl Into<Params>) {
        self.params = params.into();
        self.close();
    }

    /// Release the driver handle
    pub fn close(&mut self) {
        if let Some(mut statement) = self.statement.take() {
            statement.close_cursor();
        }
    }

    fn ensure_prepared(&mut self) -> Result<()> {
        let connection = self.connection.ok_or(Error::MissingConnection)?;

        if let Some(last) = self.last_connection {
            if self.statement.is_some() && !std::ptr::eq(last, connection) {
                tracing::debug!(
                    target: "quarry.sql",
                    sql = %self.sql,
                    "connection changed, preparing again"
                );
                self.close();
            }
        }

        let statement = match self.statement.take() {
            Some(mut statement) => {
                statement.close_cursor();
                let slots = self.params.iter().filter(|(_, b)| b.is_slot());
                if let Err(e) = bind_all(&mut statement, slots) {
                    statement.close_cursor();
                    return Err(e);
                }
                statement
            }
            None => {
                tracing::debug!(
                    target: "quarry.sql",
                    sql = %self.sql,
                    param_count = self.params.len(),
                    "preparing statement"
                );
                let mut statement = connection.prepare(&self.sql)?;
                if let Err(e) = bind_all(&mut statement, self.params.iter()) {
                    statement.close_cursor();
                    return Err(e);
                }
                self.last_connection = Some(connection);
                statement
            }
        };

        self.statement = Some(statement);
        Ok(())
    }

    fn run(&mut self) -> Result<(u64, &mut C::Statement)> {
        self.ensure_prepared()?;
        let Self { sql, statement, .. } = self;
        let statement = statement.as_mut().ok_or(Error::MissingConnection)?;
        let affected = statement.execute()?;
        tracing::trace!(target: "quarry.sql", sql = %sql, affected, "executed");
        Ok((affected, statement))
    }

    /// Run the statement, returning the affected row count
    pub fn execute(&mut self) -> Result<u64> {
        Ok(self.run()?.0)
    }

    /// All rows, addressable by column name and position
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.run()?.1.fetch_all()
    }

    /// All rows as positional value lists
    pub fn fetch_all_num(&mut self) -> Result<Vec<Vec<Value>>> {
        Ok(self
            .fetch_all()?
            .into_iter()
            .map(Row::into_values)
            .collect())
    }

    /// All rows mapped onto `T` by column name
    pub fn fetch_all_object<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        self.fetch_all()?.iter().map(Row::deserialize).collect()
    }

    /// First row, if any
    pub fn fetch_row(&mut self) -> Result<Option<Row>> {
        self.run()?.1.fetch()
    }

    pub fn fetch_row_num(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.fetch_row()?.map(Row::into_values))
    }

    /// First row mapped onto `T`; `None` when there is no row
    pub fn fetch_row_object<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.fetch_row()?.map(|row| row.deserialize()).transpose()
    }

    /// First column of every row
    pub fn fetch_column(&mut self) -> Result<Vec<Value>> {
        Ok(self
            .fetch_all()?
            .into_iter()
            .map(|row| row.into_values().into_iter().next().unwrap_or(Value::Null))
            .collect())
    }

    /// First column of the first row; `None` when the result set is empty
    pub fn fetch_scalar(&mut self) -> Result<Option<Value>> {
        self.run()?.1.fetch_column()
    }

    /// Group the result set by a key column. Without an explicit option
    /// the one registered by `select_map` is used.
    pub fn fetch_map(&mut self, option: Option<MapOption>) -> Result<FetchMap> {
        let option = option
            .or_else(|| self.options.fetch_map.clone())
            .ok_or(Error::MissingFetchMapOption)?;
        let rows = self.fetch_all()?;
        FetchMap::build(&option, rows)
    }

    /// Last insert id of the connection this query last ran on; `None` if it
    /// never ran.
    pub fn inserted_id(&self) -> Result<Option<Value>> {
        self.last_connection
            .map(|connection| connection.last_insert_id())
            .transpose()
    }
}

fn bind_all<'a, S: Statement>(
    statement: &mut S,
    bindings: impl Iterator<Item = (&'a ParamKey, &'a Binding)>,
) -> Result<()> {
    for (key, binding) in bindings {
        let value = binding.current();
        statement.bind_value(key, &value, value.param_type())?;
    }
    Ok(())
}

impl<'c, C: Connection> Drop for Query<'c, C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<'c, C: Connection> fmt::Debug for Query<'c, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("options", &self.options)
            .field("prepared", &self.statement.is_some())
            .finish()
    }
}
