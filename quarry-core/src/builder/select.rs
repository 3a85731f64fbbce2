use super::{QueryBuilder, SqlCache};
use crate::error::Result;
use crate::params::Params;
use crate::row::{MapFields, MapOption};

impl QueryBuilder {
    pub(super) fn render_select(&mut self, params: &mut Params) -> Result<String> {
        let table = self.table_sql()?;
        let mut sql = String::from("SELECT");
        match self.cache {
            SqlCache::Cache => sql.push_str(" SQL_CACHE"),
            SqlCache::NoCache => sql.push_str(" SQL_NO_CACHE"),
            SqlCache::Default => {}
        }
        sql.push(' ');
        sql.push_str(&self.projection());
        sql.push_str(" FROM ");
        sql.push_str(&table);

        if let Some(index) = self.force_index.as_deref().filter(|i| !i.trim().is_empty()) {
            sql.push_str(&format!(" FORCE INDEX ({})", index));
        }

        let joins = self.render_joins(params)?;
        sql.push_str(&joins);
        sql.push_str(&self.criteria.render(params)?);
        Ok(sql)
    }

    /// Select a key column plus value columns and register the grouping
    /// `fetch_map` uses by default.
    ///
    /// A key ending in `[]` groups rows sharing a key into lists. Result
    /// column names are resolved from the select expressions, so aliases
    /// and qualified names work as keys:
    ///
    /// ```
    /// use quarry_core::table;
    ///
    /// let builder = table(("book", "b"))
    ///     .left_join(("author", "a"), "a.id = b.author_id")
    ///     .select_map("a.name AS author", "COUNT(b.id) AS books")
    ///     .group("a.id");
    /// let option = builder.map_option().unwrap();
    /// assert_eq!(option.key(), "author");
    /// assert_eq!(builder.projection(), "a.name AS author,COUNT(b.id) AS books");
    /// ```
    pub fn select_map(mut self, key: &str, fields: impl Into<MapFields>) -> Self {
        let key = key.trim();
        let (key, as_list) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.trim_end(), true),
            None => (key, false),
        };
        let fields = fields.into();

        let projection = match &fields {
            MapFields::All => vec!["*".to_string()],
            MapFields::Single(field) => dedup([key.to_string(), field.clone()]),
            MapFields::Many(many) => dedup(std::iter::once(key.to_string()).chain(many.iter().cloned())),
        };

        let resolved_fields = match fields {
            MapFields::All => MapFields::All,
            MapFields::Single(field) => MapFields::Single(resolve_column_name(&field)),
            MapFields::Many(many) => {
                MapFields::Many(many.iter().map(|f| resolve_column_name(f)).collect())
            }
        };

        self.options.fetch_map = Some(MapOption::resolved(
            resolve_column_name(key),
            as_list,
            resolved_fields,
        ));
        self.select(projection)
    }
}

fn dedup(columns: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for column in columns {
        if !seen.contains(&column) {
            seen.push(column);
        }
    }
    seen
}

/// Column name a select expression produces in the result set.
///
/// `expr AS alias` gives `alias` (only an `AS` outside parentheses counts),
/// `DISTINCT x` and `DISTINCT(x)` give `x`, and a qualified identifier such
/// as `` u.`name` `` gives `name`. Anything else is returned unchanged.
pub(crate) fn resolve_column_name(select: &str) -> String {
    let select = select.trim();

    if let Some(pos) = top_level_alias(select) {
        return select[pos + 4..]
            .trim_matches(|c| c == '`' || c == ' ')
            .to_string();
    }

    let mut select = select;
    let lower = select.to_ascii_lowercase();
    if lower.starts_with("distinct ") || lower.starts_with("distinct(") {
        select = select[8..].trim_matches(|c| matches!(c, '`' | ' ' | '(' | ')'));
    }

    let bare = select
        .chars()
        .all(|c| c == '.' || c == '_' || c == '`' || c.is_ascii_alphanumeric());
    if bare && !select.is_empty() {
        if let Some(pos) = select.rfind('.') {
            return select[pos + 1..]
                .trim_matches(|c| c == '`' || c == ' ')
                .to_string();
        }
    }

    select.to_string()
}

/// Byte offset of the last ` AS ` at parenthesis depth zero
fn top_level_alias(select: &str) -> Option<usize> {
    let upper = select.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut depth = 0i32;
    let mut found = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b' ' if depth == 0 && bytes[i..].starts_with(b" AS ") => found = Some(i),
            _ => {}
        }
    }
    found
}
