//! Condition descriptions and their compilation into parameterized SQL

use crate::error::{Error, Result};
use crate::operator::{ConditionKey, Operator};
use crate::params::{ParamKey, Params};
use crate::Value;

/// Right-hand side of a structured condition entry
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// One bound parameter
    Scalar(Value),
    /// A list, for `IN` / `NOT IN` / `BETWEEN`
    List(Vec<Value>),
    /// A `(low, high)` pair for `BETWEEN`
    Range(Value, Value),
}

impl ConditionValue {
    /// The values as a list, if this is not a scalar
    pub fn as_list(&self) -> Option<Vec<Value>> {
        match self {
            ConditionValue::Scalar(_) => None,
            ConditionValue::List(values) => Some(values.clone()),
            ConditionValue::Range(low, high) => Some(vec![low.clone(), high.clone()]),
        }
    }
}

macro_rules! impl_scalar_condition_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ConditionValue {
                fn from(val: $t) -> Self {
                    ConditionValue::Scalar(Value::from(val))
                }
            }
        )*
    };
}

impl_scalar_condition_value!(
    (), bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, &str, &String
);

impl From<Value> for ConditionValue {
    fn from(val: Value) -> Self {
        ConditionValue::Scalar(val)
    }
}

impl<T: Into<Value>> From<Option<T>> for ConditionValue {
    fn from(opt: Option<T>) -> Self {
        ConditionValue::Scalar(Value::from(opt))
    }
}

impl<T: Into<Value>> From<Vec<T>> for ConditionValue {
    fn from(values: Vec<T>) -> Self {
        ConditionValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for ConditionValue {
    fn from(values: [T; N]) -> Self {
        ConditionValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for ConditionValue {
    fn from(values: &[T]) -> Self {
        ConditionValue::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for ConditionValue {
    fn from((low, high): (A, B)) -> Self {
        ConditionValue::Range(low.into(), high.into())
    }
}

/// One entry of a structured condition
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEntry {
    /// `field[:OP[:suffix]]` compared against a value
    Field { key: String, value: ConditionValue },
    /// Trusted SQL inserted verbatim
    Raw(String),
    /// Literal `(`
    Open,
    /// Literal `)`
    Close,
}

/// Ordered list of condition entries, joined with `AND`.
///
/// ```
/// use quarry_core::Conditions;
///
/// let conditions = Conditions::new()
///     .add("status", 1)
///     .add("id:IN", vec![3, 5, 8])
///     .add("age:BETWEEN", (18, 30))
///     .raw("deleted_at IS NULL");
/// assert_eq!(conditions.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<ConditionEntry>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `key => value` entry; an existing entry with the same key is
    /// replaced in place.
    pub fn add(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.push(ConditionEntry::Field {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a raw SQL fragment
    pub fn raw(mut self, sql: impl Into<String>) -> Self {
        self.push(ConditionEntry::Raw(sql.into()));
        self
    }

    /// Open a parenthesized group
    pub fn open(mut self) -> Self {
        self.push(ConditionEntry::Open);
        self
    }

    /// Close a parenthesized group
    pub fn close(mut self) -> Self {
        self.push(ConditionEntry::Close);
        self
    }

    pub fn push(&mut self, entry: ConditionEntry) {
        if let ConditionEntry::Field { key, value } = &entry {
            if let Some(existing) = self.entries.iter_mut().find(
                |e| matches!(e, ConditionEntry::Field { key: k, .. } if k == key),
            ) {
                *existing = ConditionEntry::Field {
                    key: key.clone(),
                    value: value.clone(),
                };
                return;
            }
        }
        self.entries.push(entry);
    }

    /// Merge another set: field entries override same-keyed ones, the rest
    /// is appended.
    pub fn merge(&mut self, other: Conditions) {
        for entry in other.entries {
            self.push(entry);
        }
    }

    pub fn entries(&self) -> &[ConditionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile into a SQL fragment, placing every value through `placer`
    pub fn compile(&self, placer: &mut Placer<'_>) -> Result<String> {
        let mut sql = String::new();
        let mut joinable = false;

        for entry in &self.entries {
            match entry {
                ConditionEntry::Open => {
                    if joinable {
                        sql.push_str(" AND ");
                    }
                    sql.push('(');
                    joinable = false;
                }
                ConditionEntry::Close => {
                    sql.push(')');
                    joinable = true;
                }
                ConditionEntry::Raw(fragment) => {
                    if joinable {
                        sql.push_str(" AND ");
                    }
                    sql.push_str(fragment);
                    joinable = true;
                }
                ConditionEntry::Field { key, value } => {
                    // a key spelled with " OR " supplies its own connective
                    if joinable && !key.contains(" OR ") {
                        sql.push_str(" AND ");
                    }
                    sql.push_str(&compile_field(key, value, placer)?);
                    joinable = true;
                }
            }
        }

        Ok(sql)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Conditions
where
    K: Into<String>,
    V: Into<ConditionValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .fold(Conditions::new(), |c, (k, v)| c.add(k, v))
    }
}

fn compile_field(key: &str, value: &ConditionValue, placer: &mut Placer<'_>) -> Result<String> {
    let ConditionKey {
        field,
        operator,
        suffix,
    } = ConditionKey::parse(key);

    let mut sql = match &operator {
        Operator::In | Operator::NotIn => {
            let values = value.as_list().ok_or_else(|| {
                Error::invalid_condition(format!("{} on {} expects a list of values", operator, field))
            })?;
            if values.is_empty() {
                let fragment = if operator == Operator::In { "1=0" } else { "1=1" };
                fragment.to_string()
            } else {
                format!("{} {} ({})", field, operator, placer.place_list(values))
            }
        }
        Operator::Between => {
            let (low, high) = match value {
                ConditionValue::Range(low, high) => (low.clone(), high.clone()),
                ConditionValue::List(values) => match values.as_slice() {
                    [low, high] => (low.clone(), high.clone()),
                    _ => {
                        return Err(Error::invalid_condition(format!(
                            "BETWEEN on {} expects exactly 2 values, got {}",
                            field,
                            values.len()
                        )))
                    }
                },
                ConditionValue::Scalar(_) => {
                    return Err(Error::invalid_condition(format!(
                        "BETWEEN on {} expects a pair of values",
                        field
                    )))
                }
            };
            let low = placer.place(low);
            let high = placer.place(high);
            format!("{} BETWEEN {} AND {}", field, low, high)
        }
        Operator::Eq | Operator::Other(_) => match value {
            ConditionValue::Scalar(v) => format!("{} {} {}", field, operator, placer.place(v.clone())),
            _ => {
                return Err(Error::invalid_condition(format!(
                    "{} on {} expects a single value",
                    operator, field
                )))
            }
        },
    };

    if let Some(suffix) = suffix {
        sql.push(' ');
        sql.push_str(&suffix);
    }
    Ok(sql)
}

/// A WHERE or HAVING description: trusted raw SQL, or structured entries
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Raw(String),
    Structured(Conditions),
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Raw(sql) => sql.trim().is_empty(),
            Condition::Structured(conditions) => conditions.is_empty(),
        }
    }

    /// Compile into a SQL fragment; raw text passes through unchanged
    pub fn compile(&self, placer: &mut Placer<'_>) -> Result<String> {
        match self {
            Condition::Raw(sql) => Ok(sql.clone()),
            Condition::Structured(conditions) => conditions.compile(placer),
        }
    }

    /// Combine with another condition. Two structured sets merge key-wise,
    /// two raw strings become `existing AND (new)`, a raw string mixed with
    /// a structured set becomes one of its raw entries.
    pub fn and(self, other: Condition) -> Condition {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        match (self, other) {
            (Condition::Raw(existing), Condition::Raw(new)) => {
                Condition::Raw(format!("{} AND ({})", existing, new))
            }
            (Condition::Structured(mut existing), Condition::Structured(new)) => {
                existing.merge(new);
                Condition::Structured(existing)
            }
            (Condition::Raw(existing), Condition::Structured(new)) => {
                let mut merged = Conditions::new().raw(existing);
                merged.merge(new);
                Condition::Structured(merged)
            }
            (Condition::Structured(mut existing), Condition::Raw(new)) => {
                existing.push(ConditionEntry::Raw(new));
                Condition::Structured(existing)
            }
        }
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::Raw(sql.to_string())
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::Raw(sql)
    }
}

impl From<Conditions> for Condition {
    fn from(conditions: Conditions) -> Self {
        Condition::Structured(conditions)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Condition
where
    K: Into<String>,
    V: Into<ConditionValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Condition::Structured(Conditions::from(pairs))
    }
}

/// Hands out `:dyN` placeholder names and records the placed values.
///
/// The sequence is owned by the caller (a `Criteria` or `QueryBuilder`), so
/// names stay unique across every fragment rendered by that owner.
pub struct Placer<'a> {
    sequence: &'a mut usize,
    params: &'a mut Params,
}

impl<'a> Placer<'a> {
    pub fn new(sequence: &'a mut usize, params: &'a mut Params) -> Self {
        Self { sequence, params }
    }

    /// Place one value and return its placeholder. Names already bound in
    /// the accumulator, such as caller-supplied `:dyN` parameters, are skipped.
    pub fn place(&mut self, value: Value) -> String {
        let key = loop {
            let key = ParamKey::Named(format!(":dy{}", *self.sequence));
            *self.sequence += 1;
            if !self.params.contains(&key) {
                break key;
            }
        };
        let name = key.to_string();
        self.params.set(key, value);
        name
    }

    /// Place each value, returning the comma-joined placeholders
    pub fn place_list(&mut self, values: Vec<Value>) -> String {
        values
            .into_iter()
            .map(|v| self.place(v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(condition: impl Into<Condition>) -> Result<(String, Params, usize)> {
        let mut sequence = 0;
        let mut params = Params::new();
        let sql = condition
            .into()
            .compile(&mut Placer::new(&mut sequence, &mut params))?;
        Ok((sql, params, sequence))
    }

    #[test]
    fn test_raw_passes_through() {
        let (sql, params, _) = compile("a = 1 OR b = 2").unwrap();
        assert_eq!(sql, "a = 1 OR b = 2");
        assert!(params.is_empty());
    }

    #[test]
    fn test_simple_equality() {
        let (sql, params, _) = compile([("id", 5)]).unwrap();
        assert_eq!(sql, "`id` = :dy0");
        assert_eq!(params.value(&":dy0".into()), Some(Value::Int(5)));
    }

    #[test]
    fn test_qualified_fields_not_quoted() {
        let (sql, _, _) = compile(Conditions::new().add("u.id", 1).add("`name`", "x")).unwrap();
        assert_eq!(sql, "u.id = :dy0 AND `name` = :dy1");
    }

    #[test]
    fn test_in_and_not_in() {
        let (sql, params, _) = compile(Conditions::new().add("id:IN", vec![1, 2, 3])).unwrap();
        assert_eq!(sql, "`id` IN (:dy0,:dy1,:dy2)");
        assert_eq!(params.len(), 3);

        let (sql, _, _) = compile(Conditions::new().add("id:not in", [7])).unwrap();
        assert_eq!(sql, "`id` NOT IN (:dy0)");
    }

    #[test]
    fn test_empty_lists_collapse() {
        let empty: Vec<i64> = Vec::new();
        let (sql, params, _) = compile(Conditions::new().add("id:IN", empty.clone())).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());

        let (sql, _, _) = compile(Conditions::new().add("id:NOT IN", empty)).unwrap();
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn test_between() {
        let (sql, params, _) = compile([("age:BETWEEN", [18, 30])]).unwrap();
        assert_eq!(sql, "`age` BETWEEN :dy0 AND :dy1");
        assert_eq!(params.value(&":dy0".into()), Some(Value::Int(18)));
        assert_eq!(params.value(&":dy1".into()), Some(Value::Int(30)));

        let (sql, _, _) = compile(Conditions::new().add("age:BETWEEN", (1, 2))).unwrap();
        assert_eq!(sql, "`age` BETWEEN :dy0 AND :dy1");
    }

    #[test]
    fn test_invalid_shapes() {
        let err = compile([("age:BETWEEN", vec![1, 2, 3])]).unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { .. }));

        let err = compile([("id:IN", 5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { .. }));

        let err = compile([("age:BETWEEN", 5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { .. }));
    }

    #[test]
    fn test_other_operators_and_suffix() {
        let (sql, _, _) = compile(
            Conditions::new()
                .add("score:>=", 60)
                .add("name:like", "%li%")
                .add("code:=:COLLATE utf8_bin", "ab"),
        )
        .unwrap();
        assert_eq!(
            sql,
            "`score` >= :dy0 AND `name` LIKE :dy1 AND `code` = :dy2 COLLATE utf8_bin"
        );
    }

    #[test]
    fn test_or_key_suppresses_and() {
        let (sql, _, _) = compile(
            Conditions::new()
                .add("status", 1)
                .add(" OR `status`", 2),
        )
        .unwrap();
        assert_eq!(sql, "`status` = :dy0 OR `status` = :dy1");
    }

    #[test]
    fn test_groups_and_raw_entries() {
        let (sql, _, _) = compile(
            Conditions::new()
                .add("uid", 7)
                .open()
                .raw("expire = 0")
                .add(" OR `expire`:>", 1700000000)
                .close()
                .raw("deleted = 0"),
        )
        .unwrap();
        assert_eq!(
            sql,
            "`uid` = :dy0 AND (expire = 0 OR `expire` > :dy1) AND deleted = 0"
        );
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut sequence = 0;
        let mut params = Params::new();
        let first = Condition::from([("a", 1)]);
        let second = Condition::from([("b:IN", vec![2, 3])]);
        let mut placer = Placer::new(&mut sequence, &mut params);
        assert_eq!(first.compile(&mut placer).unwrap(), "`a` = :dy0");
        assert_eq!(second.compile(&mut placer).unwrap(), "`b` IN (:dy1,:dy2)");
        assert_eq!(sequence, 3);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_placement_skips_bound_names() {
        let mut sequence = 0;
        let mut params = Params::from([("dy0", 1), ("dy2", 9)]);
        let condition = Condition::from(Conditions::new().add("b", 2).add("c:IN", vec![3, 4]));
        let sql = condition
            .compile(&mut Placer::new(&mut sequence, &mut params))
            .unwrap();
        assert_eq!(sql, "`b` = :dy1 AND `c` IN (:dy3,:dy4)");
        assert_eq!(params.value(&":dy0".into()), Some(Value::Int(1)));
        assert_eq!(params.value(&":dy2".into()), Some(Value::Int(9)));
        assert_eq!(sequence, 5);
    }

    #[test]
    fn test_push_replaces_same_key() {
        let conditions = Conditions::new().add("a", 1).add("b", 2).add("a", 3);
        assert_eq!(conditions.len(), 2);
        assert_eq!(
            conditions.entries()[0],
            ConditionEntry::Field {
                key: "a".into(),
                value: ConditionValue::Scalar(Value::Int(3))
            }
        );
    }

    #[test]
    fn test_and_merges() {
        let merged = Condition::from("a = 1").and(Condition::from("b = 2"));
        assert_eq!(merged, Condition::Raw("a = 1 AND (b = 2)".into()));

        let merged = Condition::from([("a", 1)]).and(Condition::from([("a", 2)]));
        let (sql, params, _) = compile(merged).unwrap();
        assert_eq!(sql, "`a` = :dy0");
        assert_eq!(params.value(&":dy0".into()), Some(Value::Int(2)));

        let merged = Condition::from("x > 1").and(Condition::from([("a", 1)]));
        let (sql, _, _) = compile(merged).unwrap();
        assert_eq!(sql, "x > 1 AND `a` = :dy0");

        let merged = Condition::from([("a", 1)]).and(Condition::from(""));
        assert_eq!(merged, Condition::from([("a", 1)]));
    }
}
