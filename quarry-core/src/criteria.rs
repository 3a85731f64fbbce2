//! WHERE / GROUP BY / HAVING / ORDER BY / LIMIT modifiers shared by every
//! statement kind

use crate::condition::{Condition, Placer};
use crate::error::Result;
use crate::params::Params;
use serde::Deserialize;

/// LIMIT clause
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Limit {
    /// `LIMIT n`, rendered only when `n > 0`
    Count(i64),
    /// `LIMIT n [OFFSET m]`
    Page { limit: i64, offset: Option<i64> },
    /// Appended verbatim, e.g. `LIMIT :limit`
    Raw(String),
}

impl Limit {
    pub fn page(limit: i64, offset: i64) -> Self {
        Limit::Page {
            limit,
            offset: Some(offset),
        }
    }

    fn render(&self) -> Option<String> {
        match self {
            Limit::Count(n) if *n > 0 => Some(format!("LIMIT {}", n)),
            Limit::Count(_) => None,
            Limit::Page { limit, offset } => Some(match offset {
                Some(offset) => format!("LIMIT {} OFFSET {}", limit, offset),
                None => format!("LIMIT {}", limit),
            }),
            Limit::Raw(sql) if sql.trim().is_empty() => None,
            Limit::Raw(sql) => Some(sql.clone()),
        }
    }
}

impl From<i64> for Limit {
    fn from(n: i64) -> Self {
        Limit::Count(n)
    }
}

impl From<i32> for Limit {
    fn from(n: i32) -> Self {
        Limit::Count(i64::from(n))
    }
}

impl From<u32> for Limit {
    fn from(n: u32) -> Self {
        Limit::Count(i64::from(n))
    }
}

impl From<&str> for Limit {
    fn from(sql: &str) -> Self {
        Limit::Raw(sql.to_string())
    }
}

impl From<String> for Limit {
    fn from(sql: String) -> Self {
        Limit::Raw(sql)
    }
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sort {
    /// Raw text; `ORDER BY ` is prepended unless already present
    Raw(String),
    /// Column to direction pairs; directions are not validated
    Columns(Vec<(String, String)>),
}

impl Sort {
    fn render(&self) -> Option<String> {
        match self {
            Sort::Raw(sql) if sql.trim().is_empty() => None,
            Sort::Raw(sql) if sql.to_uppercase().contains("ORDER BY") => Some(sql.clone()),
            Sort::Raw(sql) => Some(format!("ORDER BY {}", sql)),
            Sort::Columns(columns) if columns.is_empty() => None,
            Sort::Columns(columns) => Some(format!(
                "ORDER BY {}",
                columns
                    .iter()
                    .map(|(column, direction)| format!("{} {}", column, direction))
                    .collect::<Vec<_>>()
                    .join(",")
            )),
        }
    }
}

impl From<&str> for Sort {
    fn from(sql: &str) -> Self {
        Sort::Raw(sql.to_string())
    }
}

impl From<String> for Sort {
    fn from(sql: String) -> Self {
        Sort::Raw(sql)
    }
}

impl<C: Into<String>, D: Into<String>> From<Vec<(C, D)>> for Sort {
    fn from(columns: Vec<(C, D)>) -> Self {
        Sort::Columns(
            columns
                .into_iter()
                .map(|(c, d)| (c.into(), d.into()))
                .collect(),
        )
    }
}

impl<C: Into<String>, D: Into<String>, const N: usize> From<[(C, D); N]> for Sort {
    fn from(columns: [(C, D); N]) -> Self {
        Sort::from(Vec::from(columns))
    }
}

/// Modifier bundle independent of table and command.
///
/// ```
/// use quarry_core::{Criteria, Conditions};
///
/// let mut criteria = Criteria::new()
///     .where_(Conditions::new().add("status", 1))
///     .sort([("id", "DESC")])
///     .limit(10);
/// let (sql, params) = criteria.to_sql().unwrap();
/// assert_eq!(sql, " WHERE `status` = :dy0 ORDER BY id DESC LIMIT 10");
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    where_clause: Option<Condition>,
    params: Params,
    limit: Option<Limit>,
    sort: Option<Sort>,
    group: Option<String>,
    having: Option<Condition>,
    having_params: Params,
    sequence: usize,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the WHERE condition
    pub fn where_(mut self, condition: impl Into<Condition>) -> Self {
        self.set_where(condition.into());
        self
    }

    /// Replace the WHERE condition and merge caller-supplied parameters
    pub fn where_with(mut self, condition: impl Into<Condition>, params: impl Into<Params>) -> Self {
        self.set_where(condition.into());
        self.params.merge(&params.into());
        self
    }

    /// Combine with the existing WHERE condition, see [`Condition::and`]
    pub fn and_where(mut self, condition: impl Into<Condition>) -> Self {
        self.add_where(condition.into());
        self
    }

    pub fn and_where_with(mut self, condition: impl Into<Condition>, params: impl Into<Params>) -> Self {
        self.add_where(condition.into());
        self.params.merge(&params.into());
        self
    }

    /// Replace the caller-supplied parameters
    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = params.into();
        self
    }

    /// Merge caller-supplied parameters into the existing ones
    pub fn merge_params(mut self, params: impl Into<Params>) -> Self {
        self.params.merge(&params.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<Sort>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn having(mut self, condition: impl Into<Condition>) -> Self {
        self.having = Some(condition.into());
        self
    }

    /// Set HAVING with its own parameter bucket
    pub fn having_with(mut self, condition: impl Into<Condition>, params: impl Into<Params>) -> Self {
        self.having = Some(condition.into());
        self.having_params = params.into();
        self
    }

    pub(crate) fn set_where(&mut self, condition: Condition) {
        self.where_clause = Some(condition);
    }

    pub(crate) fn add_where(&mut self, condition: Condition) {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn extend_params(&mut self, params: &Params) {
        self.params.merge(params);
    }

    pub(crate) fn set_limit(&mut self, limit: Option<Limit>) {
        self.limit = limit;
    }

    pub(crate) fn set_sort(&mut self, sort: Sort) {
        self.sort = Some(sort);
    }

    pub(crate) fn set_group(&mut self, group: String) {
        self.group = Some(group);
    }

    pub(crate) fn set_having(&mut self, condition: Condition, params: Option<Params>) {
        self.having = Some(condition);
        if let Some(params) = params {
            self.having_params = params;
        }
    }

    /// Placer drawing from this criteria's placeholder sequence
    pub(crate) fn placer<'a>(&'a mut self, params: &'a mut Params) -> Placer<'a> {
        Placer::new(&mut self.sequence, params)
    }

    pub fn where_condition(&self) -> Option<&Condition> {
        self.where_clause.as_ref()
    }

    pub fn limit_value(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn sort_value(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn group_value(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Caller-supplied parameters, WHERE and HAVING buckets merged
    pub fn bound_params(&self) -> Params {
        let mut params = self.params.clone();
        params.merge(&self.having_params);
        params
    }

    /// Number of `:dyN` placeholders handed out so far
    pub fn placeholder_sequence(&self) -> usize {
        self.sequence
    }

    /// Render the WHERE condition body, without the keyword
    pub fn render_where(&mut self, params: &mut Params) -> Result<String> {
        match &self.where_clause {
            Some(condition) if !condition.is_empty() => {
                condition.compile(&mut Placer::new(&mut self.sequence, params))
            }
            _ => Ok(String::new()),
        }
    }

    /// Render the HAVING condition body, without the keyword
    pub fn render_having(&mut self, params: &mut Params) -> Result<String> {
        params.merge(&self.having_params);
        match &self.having {
            Some(condition) if !condition.is_empty() => {
                condition.compile(&mut Placer::new(&mut self.sequence, params))
            }
            _ => Ok(String::new()),
        }
    }

    /// Render `GROUP BY`, `HAVING`, `ORDER BY` and `LIMIT`, space separated
    pub fn render_options(&mut self, params: &mut Params) -> Result<String> {
        let mut parts = Vec::new();

        if let Some(group) = self.group.as_deref().filter(|g| !g.trim().is_empty()) {
            parts.push(format!("GROUP BY {}", group));
        }

        let having = self.render_having(params)?;
        if !having.is_empty() {
            parts.push(format!("HAVING {}", having));
        }

        if let Some(sort) = self.sort.as_ref().and_then(Sort::render) {
            parts.push(sort);
        }

        if let Some(limit) = self.limit.as_ref().and_then(Limit::render) {
            parts.push(limit);
        }

        Ok(parts.join(" "))
    }

    /// Render ` WHERE ...` followed by ` <options>`, each omitted when empty,
    /// placing values into the caller's accumulator.
    pub fn render(&mut self, params: &mut Params) -> Result<String> {
        let mut sql = String::new();

        let where_sql = self.render_where(params)?;
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        let options = self.render_options(params)?;
        if !options.is_empty() {
            sql.push(' ');
            sql.push_str(&options);
        }

        Ok(sql)
    }

    /// Render with a fresh accumulator seeded with the caller-supplied
    /// parameters.
    pub fn to_sql(&mut self) -> Result<(String, Params)> {
        let mut params = self.params.clone();
        let sql = self.render(&mut params)?;
        Ok((sql, params))
    }
}
