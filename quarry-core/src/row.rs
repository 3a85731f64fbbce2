//! Result rows and the shapes they are materialized into

use crate::error::{Error, Result};
use crate::value::{MapKey, Value};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// One result row: column names shared across the result set, plus values.
///
/// A row answers both by column name and by position, so it covers the
/// associative, numeric and "both" fetch modes at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<C, V>(pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self::new(columns.into(), values)
    }

    /// Value of the named column; with duplicate names the last one wins
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the named column, or `ColumnNotFound`
    pub fn try_get(&self, column: &str) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| Error::column_not_found(column))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Keep only the given columns, in the given order
    pub fn project(&self, columns: &[String]) -> Result<Row> {
        let values = columns
            .iter()
            .map(|c| self.try_get(c).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::new(columns.to_vec().into(), values))
    }

    /// The row as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }

    /// Map the row onto a type's fields by column name
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

/// The field side of a map option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapFields {
    /// One column: map values are plain values
    Single(String),
    /// Several columns: map values are row subsets
    Many(Vec<String>),
    /// `*`: map values are whole rows
    All,
}

impl From<&str> for MapFields {
    fn from(field: &str) -> Self {
        if field.trim() == "*" {
            MapFields::All
        } else {
            MapFields::Single(field.to_string())
        }
    }
}

impl From<String> for MapFields {
    fn from(field: String) -> Self {
        MapFields::from(field.as_str())
    }
}

impl From<Vec<String>> for MapFields {
    fn from(fields: Vec<String>) -> Self {
        MapFields::Many(fields)
    }
}

impl From<Vec<&str>> for MapFields {
    fn from(fields: Vec<&str>) -> Self {
        MapFields::Many(fields.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MapFields {
    fn from(fields: [&str; N]) -> Self {
        MapFields::Many(fields.iter().map(|f| f.to_string()).collect())
    }
}

/// How `fetch_map` groups a result set.
///
/// A key spelled `name[]` collects every row sharing a key into a list;
/// otherwise the last row with a given key wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOption {
    key: String,
    as_list: bool,
    fields: MapFields,
}

impl MapOption {
    pub fn new(key: &str, fields: impl Into<MapFields>) -> Self {
        let key = key.trim();
        let (key, as_list) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.trim_end(), true),
            None => (key, false),
        };
        Self {
            key: key.to_string(),
            as_list,
            fields: fields.into(),
        }
    }

    pub(crate) fn resolved(key: String, as_list: bool, fields: MapFields) -> Self {
        Self { key, as_list, fields }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn as_list(&self) -> bool {
        self.as_list
    }

    pub fn fields(&self) -> &MapFields {
        &self.fields
    }
}

/// Output of `fetch_map`, one variant per grouping shape.
///
/// Keys keep the order in which they first appear in the result set.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchMap {
    /// Single field, last row wins
    Values(IndexMap<MapKey, Value>),
    /// Several fields or `*`, last row wins
    Rows(IndexMap<MapKey, Row>),
    /// Single field, list key
    ValueLists(IndexMap<MapKey, Vec<Value>>),
    /// Several fields or `*`, list key
    RowLists(IndexMap<MapKey, Vec<Row>>),
}

impl FetchMap {
    /// Group `rows` according to `option`
    pub fn build(option: &MapOption, rows: Vec<Row>) -> Result<FetchMap> {
        let key_of = |row: &Row| row.try_get(&option.key).map(MapKey::from);

        let map = match (&option.fields, option.as_list) {
            (MapFields::Single(field), false) => {
                let mut map = IndexMap::new();
                for row in &rows {
                    map.insert(key_of(row)?, row.try_get(field)?.clone());
                }
                FetchMap::Values(map)
            }
            (MapFields::Single(field), true) => {
                let mut map: IndexMap<MapKey, Vec<Value>> = IndexMap::new();
                for row in &rows {
                    map.entry(key_of(row)?)
                        .or_default()
                        .push(row.try_get(field)?.clone());
                }
                FetchMap::ValueLists(map)
            }
            (fields, false) => {
                let mut map = IndexMap::new();
                for row in rows {
                    let key = key_of(&row)?;
                    map.insert(key, shape_row(fields, row)?);
                }
                FetchMap::Rows(map)
            }
            (fields, true) => {
                let mut map: IndexMap<MapKey, Vec<Row>> = IndexMap::new();
                for row in rows {
                    let key = key_of(&row)?;
                    map.entry(key).or_default().push(shape_row(fields, row)?);
                }
                FetchMap::RowLists(map)
            }
        };

        Ok(map)
    }

    pub fn len(&self) -> usize {
        match self {
            FetchMap::Values(m) => m.len(),
            FetchMap::Rows(m) => m.len(),
            FetchMap::ValueLists(m) => m.len(),
            FetchMap::RowLists(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_values(&self) -> Option<&IndexMap<MapKey, Value>> {
        match self {
            FetchMap::Values(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&IndexMap<MapKey, Row>> {
        match self {
            FetchMap::Rows(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_value_lists(&self) -> Option<&IndexMap<MapKey, Vec<Value>>> {
        match self {
            FetchMap::ValueLists(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_row_lists(&self) -> Option<&IndexMap<MapKey, Vec<Row>>> {
        match self {
            FetchMap::RowLists(m) => Some(m),
            _ => None,
        }
    }
}

fn shape_row(fields: &MapFields, row: Row) -> Result<Row> {
    match fields {
        MapFields::All => Ok(row),
        MapFields::Many(columns) => row.project(columns),
        MapFields::Single(column) => row.project(std::slice::from_ref(column)),
    }
}
