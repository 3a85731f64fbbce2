//! Statement builder: table, projection, joins and values on top of
//! [`Criteria`], rendered per command

mod delete;
mod insert;
mod select;
mod update;

use crate::condition::Condition;
use crate::config::BuilderConfig;
use crate::criteria::{Criteria, Limit, Sort};
use crate::error::{Error, Result};
use crate::executor::Connection;
use crate::params::Params;
use crate::query::{Query, QueryOptions};
use crate::row::MapOption;
use crate::Value;
use std::fmt::{self, Display};
use std::str::FromStr;

/// SQL command a builder renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Select => "SELECT",
            Command::Insert => "INSERT",
            Command::Update => "UPDATE",
            Command::Delete => "DELETE",
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "SELECT" => Ok(Command::Select),
            "INSERT" => Ok(Command::Insert),
            "UPDATE" => Ok(Command::Update),
            "DELETE" => Ok(Command::Delete),
            _ => Err(Error::unsupported_command(s)),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `SQL_CACHE` / `SQL_NO_CACHE` hint for SELECT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlCache {
    #[default]
    Default,
    Cache,
    NoCache,
}

impl From<Option<bool>> for SqlCache {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => SqlCache::Cache,
            Some(false) => SqlCache::NoCache,
            None => SqlCache::Default,
        }
    }
}

/// One JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: String,
    pub table: String,
    pub on: Condition,
}

/// One INSERT / UPDATE value entry
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// `column => value`, always parameterized
    Column { column: String, value: Value },
    /// Raw `"col=expr"` text
    Expr(Value),
}

/// Values for INSERT and UPDATE, kept in insertion order.
///
/// Raw expressions follow the `"col=expr"` form. For INSERT the right-hand
/// side is classified: `:name` is an external placeholder, `{:EXPR` is raw
/// SQL, anything else is a literal that gets parameterized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<Assignment>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column; an existing entry for the column is replaced in place
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Assignment::Column {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Append a raw `"col=expr"` entry
    pub fn expr(mut self, expr: impl Into<Value>) -> Self {
        self.push(Assignment::Expr(expr.into()));
        self
    }

    fn push(&mut self, entry: Assignment) {
        if let Assignment::Column { column, .. } = &entry {
            let existing = self
                .entries
                .iter()
                .position(|e| matches!(e, Assignment::Column { column: c, .. } if c == column));
            if let Some(i) = existing {
                self.entries[i] = entry;
                return;
            }
        }
        self.entries.push(entry);
    }

    /// Merge another set: columns override, raw entries are appended
    pub fn merge(&mut self, other: Values) {
        for entry in other.entries {
            self.push(entry);
        }
    }

    pub fn entries(&self) -> &[Assignment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Values {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().fold(Values::new(), |v, (k, val)| v.set(k, val))
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Values {
    fn from(pairs: [(K, V); N]) -> Self {
        Values::from(Vec::from(pairs))
    }
}

impl From<&str> for Values {
    fn from(expr: &str) -> Self {
        Values::new().expr(expr)
    }
}

impl From<String> for Values {
    fn from(expr: String) -> Self {
        Values::new().expr(expr)
    }
}

impl From<Vec<&str>> for Values {
    fn from(exprs: Vec<&str>) -> Self {
        exprs.into_iter().fold(Values::new(), |v, e| v.expr(e))
    }
}

impl<const N: usize> From<[&str; N]> for Values {
    fn from(exprs: [&str; N]) -> Self {
        Values::from(Vec::from(exprs))
    }
}

/// Trait for types that can name a table, optionally with an alias
pub trait IntoTable {
    fn into_table(self) -> String;
}

impl IntoTable for &str {
    fn into_table(self) -> String {
        self.trim().to_string()
    }
}

impl IntoTable for String {
    fn into_table(self) -> String {
        self.trim().to_string()
    }
}

impl IntoTable for &String {
    fn into_table(self) -> String {
        self.trim().to_string()
    }
}

/// `(name, alias)`; the alias is ignored when the name already has one
impl IntoTable for (&str, &str) {
    fn into_table(self) -> String {
        let (name, alias) = (self.0.trim(), self.1.trim());
        if alias.is_empty() || name.contains(' ') {
            name.to_string()
        } else {
            format!("{} {}", name, alias)
        }
    }
}

/// Trait for types that can be converted to a projection list
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

/// Fluent builder for SELECT / INSERT / UPDATE / DELETE statements.
///
/// Every setter consumes and returns the builder. Rendered SQL is cached
/// until the next setter call.
///
/// ```
/// use quarry_core::{table, Conditions};
///
/// let mut query = table(("book", "b"))
///     .select(["b.id", "b.name AS title", "a.name AS author"])
///     .left_join(("author", "a"), "a.id = b.author_id")
///     .where_(Conditions::new().add("b.on_shelf", 1))
///     .limit(20);
/// assert_eq!(
///     query.get_sql_text().unwrap(),
///     "SELECT b.id,b.name AS title,a.name AS author FROM book b \
///      LEFT JOIN author a ON a.id = b.author_id WHERE b.on_shelf = :dy0 LIMIT 20"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    criteria: Criteria,
    command: Command,
    table: Option<String>,
    columns: Vec<String>,
    force_index: Option<String>,
    joins: Vec<Join>,
    values: Values,
    cache: SqlCache,
    replace: bool,
    options: QueryOptions,
    rendered: Option<(String, Params)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from deserialized settings; unknown commands are rejected
    pub fn from_config(config: BuilderConfig) -> Result<Self> {
        let mut builder = QueryBuilder::new();
        if let Some(command) = config.command {
            builder = builder.command(command.parse()?);
        }
        if let Some(table) = config.table {
            builder = match config.alias {
                Some(alias) => builder.table((table.as_str(), alias.as_str())),
                None => builder.table(table),
            };
        }
        if let Some(select) = config.select {
            builder = builder.columns(select);
        }
        if let Some(index) = config.force_index {
            builder = builder.force_index(index);
        }
        if let Some(condition) = config.where_clause {
            builder = builder.where_(condition);
        }
        if let Some(group) = config.group {
            builder = builder.group(group);
        }
        if let Some(sort) = config.sort {
            builder = builder.sort(sort);
        }
        if let Some(limit) = config.limit {
            builder = builder.limit(limit);
        }
        Ok(builder)
    }

    fn touch(&mut self) {
        self.rendered = None;
    }

    pub fn command(mut self, command: Command) -> Self {
        self.command = command;
        self.replace = false;
        self.touch();
        self
    }

    /// Set the main table, e.g. `"user"`, `"user u"` or `("user", "u")`
    pub fn table(mut self, table: impl IntoTable) -> Self {
        self.table = Some(table.into_table());
        self.touch();
        self
    }

    /// Alias of [`QueryBuilder::table`]
    pub fn from(self, table: impl IntoTable) -> Self {
        self.table(table)
    }

    /// Set the projection without changing the command
    pub fn columns(mut self, columns: impl IntoColumns) -> Self {
        self.columns = columns
            .into_columns()
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self.touch();
        self
    }

    /// Set the projection and switch to SELECT
    pub fn select(self, columns: impl IntoColumns) -> Self {
        self.columns(columns).command(Command::Select)
    }

    pub fn force_index(mut self, index: impl Into<String>) -> Self {
        self.force_index = Some(index.into());
        self.touch();
        self
    }

    /// Add a join; `kind` is uppercased (`"left join"` -> `LEFT JOIN`)
    pub fn join(mut self, kind: &str, table: impl IntoTable, on: impl Into<Condition>) -> Self {
        self.joins.push(Join {
            kind: kind.trim().to_uppercase(),
            table: table.into_table(),
            on: on.into(),
        });
        self.touch();
        self
    }

    pub fn left_join(self, table: impl IntoTable, on: impl Into<Condition>) -> Self {
        self.join("LEFT JOIN", table, on)
    }

    pub fn inner_join(self, table: impl IntoTable, on: impl Into<Condition>) -> Self {
        self.join("INNER JOIN", table, on)
    }

    pub fn right_join(self, table: impl IntoTable, on: impl Into<Condition>) -> Self {
        self.join("RIGHT JOIN", table, on)
    }

    /// Replace the INSERT / UPDATE values
    pub fn values(mut self, values: impl Into<Values>) -> Self {
        self.values = values.into();
        self.touch();
        self
    }

    /// Merge into the INSERT / UPDATE values
    pub fn merge_values(mut self, values: impl Into<Values>) -> Self {
        self.values.merge(values.into());
        self.touch();
        self
    }

    /// Alias of [`QueryBuilder::values`]
    pub fn set(self, values: impl Into<Values>) -> Self {
        self.values(values)
    }

    /// `Some(true)` adds `SQL_CACHE`, `Some(false)` adds `SQL_NO_CACHE`,
    /// `None` leaves the server default
    pub fn cache(mut self, flag: Option<bool>) -> Self {
        self.cache = flag.into();
        self.touch();
        self
    }

    pub fn insert(self) -> Self {
        self.command(Command::Insert)
    }

    /// INSERT into `table` with `values` in one call
    pub fn insert_into(self, table: impl IntoTable, values: impl Into<Values>) -> Self {
        self.table(table).values(values).insert()
    }

    /// INSERT rendered as `REPLACE INTO`
    pub fn replace(mut self) -> Self {
        self = self.command(Command::Insert);
        self.replace = true;
        self
    }

    pub fn update(self) -> Self {
        self.command(Command::Update)
    }

    /// UPDATE `table` with `values` where `condition`, in one call
    pub fn update_table(
        self,
        table: impl IntoTable,
        values: impl Into<Values>,
        condition: impl Into<Condition>,
    ) -> Self {
        self.table(table).values(values).where_(condition).update()
    }

    pub fn delete(self) -> Self {
        self.command(Command::Delete)
    }

    /// DELETE from `table` where `condition`, in one call
    pub fn delete_from(self, table: impl IntoTable, condition: impl Into<Condition>) -> Self {
        self.table(table).where_(condition).delete()
    }

    pub fn where_(mut self, condition: impl Into<Condition>) -> Self {
        self.criteria.set_where(condition.into());
        self.touch();
        self
    }

    /// Replace the WHERE condition and merge named parameters it uses
    pub fn where_with(mut self, condition: impl Into<Condition>, params: impl Into<Params>) -> Self {
        self.criteria.set_where(condition.into());
        self.criteria.extend_params(&params.into());
        self.touch();
        self
    }

    pub fn and_where(mut self, condition: impl Into<Condition>) -> Self {
        self.criteria.add_where(condition.into());
        self.touch();
        self
    }

    pub fn and_where_with(mut self, condition: impl Into<Condition>, params: impl Into<Params>) -> Self {
        self.criteria.add_where(condition.into());
        self.criteria.extend_params(&params.into());
        self.touch();
        self
    }

    /// Replace caller-supplied named parameters
    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.criteria.set_params(params.into());
        self.touch();
        self
    }

    pub fn merge_params(mut self, params: impl Into<Params>) -> Self {
        self.criteria.extend_params(&params.into());
        self.touch();
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.criteria.set_limit(Some(limit.into()));
        self.touch();
        self
    }

    pub fn sort(mut self, sort: impl Into<Sort>) -> Self {
        self.criteria.set_sort(sort.into());
        self.touch();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.criteria.set_group(group.into());
        self.touch();
        self
    }

    pub fn having(mut self, condition: impl Into<Condition>) -> Self {
        self.criteria.set_having(condition.into(), None);
        self.touch();
        self
    }

    pub fn having_with(mut self, condition: impl Into<Condition>, params: impl Into<Params>) -> Self {
        self.criteria.set_having(condition.into(), Some(params.into()));
        self.touch();
        self
    }

    pub fn command_value(&self) -> Command {
        self.command
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Projection as rendered, `*` when empty
    pub fn projection(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn values_ref(&self) -> &Values {
        &self.values
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Default grouping registered by `select_map`
    pub fn map_option(&self) -> Option<&MapOption> {
        self.options.fetch_map.as_ref()
    }

    fn table_sql(&self) -> Result<String> {
        self.table
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(Error::MissingTable)
    }

    fn render_joins(&mut self, params: &mut Params) -> Result<String> {
        let mut sql = String::new();
        for join in &self.joins {
            let on = join.on.compile(&mut self.criteria.placer(params))?;
            sql.push_str(&format!(" {} {} ON {}", join.kind, join.table, on));
        }
        Ok(sql)
    }

    fn render(&mut self) -> Result<(String, Params)> {
        let mut params = self.criteria.bound_params();
        let sql = match self.command {
            Command::Select => self.render_select(&mut params)?,
            Command::Insert => self.render_insert(&mut params)?,
            Command::Update => self.render_update(&mut params)?,
            Command::Delete => self.render_delete(&mut params)?,
        };
        Ok((sql, params))
    }

    /// Rendered SQL and parameters, cached until the next setter call
    pub fn to_sql(&mut self) -> Result<(String, Params)> {
        if let Some(rendered) = &self.rendered {
            return Ok(rendered.clone());
        }
        let rendered = self.render()?;
        self.rendered = Some(rendered.clone());
        Ok(rendered)
    }

    pub fn get_sql_text(&mut self) -> Result<String> {
        Ok(self.to_sql()?.0)
    }

    /// Parameters of the rendered statement
    pub fn rendered_params(&mut self) -> Result<Params> {
        Ok(self.to_sql()?.1)
    }

    /// Build a query with no connection attached yet
    pub fn build<'c, C: Connection>(&mut self) -> Result<Query<'c, C>> {
        let (sql, params) = self.to_sql()?;
        Ok(Query::new(sql, params).with_options(self.options.clone()))
    }

    /// Build a query bound to `connection`
    pub fn build_with<'c, C: Connection>(&mut self, connection: &'c C) -> Result<Query<'c, C>> {
        Ok(self.build()?.on(connection))
    }

    /// Build and run a mutation, returning the affected row count
    pub fn execute<C: Connection>(&mut self, connection: &C) -> Result<u64> {
        if self.command == Command::Select {
            return Err(Error::WrongCommandForExecute);
        }
        self.build_with(connection)?.execute()
    }

    /// `COUNT(1)` over the current criteria
    pub fn count<C: Connection>(&self, connection: &C) -> Result<i64> {
        self.count_column(connection, "1")
    }

    /// `COUNT(column)` over the current criteria; the builder is unchanged
    pub fn count_column<C: Connection>(&self, connection: &C, column: &str) -> Result<i64> {
        let mut counting = self.clone().select(format!("COUNT({})", column));
        let scalar = counting
            .build_with(connection)?
            .fetch_scalar()?
            .ok_or_else(|| Error::query_failed(format!("COUNT({}) returned no row", column)))?;
        Ok(scalar
            .as_i64()
            .or_else(|| scalar.as_f64().map(|f| f as i64))
            .unwrap_or(0))
    }

    /// Whether any row matches the current criteria; the builder is unchanged
    pub fn exists<C: Connection>(&self, connection: &C) -> Result<bool> {
        let mut counting = self.clone().select("1").limit(1);
        let scalar = counting.build_with(connection)?.fetch_scalar()?;
        Ok(scalar.is_some())
    }
}
