//! Value types for SQL parameters and result cells

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A scalar SQL value, used both as a bound parameter and as a result cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String value
    String(String),
}

/// How a driver should bind a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Null,
    Int,
    Str,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "BIGINT",
            Value::Float(_) => "DOUBLE",
            Value::String(_) => "TEXT",
        }
    }

    /// Binding type: integers and integer-looking strings bind as `Int`,
    /// everything else except NULL as `Str`.
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::Null => ParamType::Null,
            Value::Int(_) => ParamType::Int,
            Value::String(s) if parse_int(s).is_some() => ParamType::Int,
            _ => ParamType::Str,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value, parsing integer-looking strings
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert into a JSON value for object mapping
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Strip surrounding single and double quotes from string values
    pub(crate) fn trim_quotes(self) -> Self {
        match self {
            Value::String(s) => Value::String(s.trim_matches(|c| c == '\'' || c == '"').to_string()),
            other => other,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => write!(f, "1"),
            Value::Bool(false) => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Key of a fetch map, normalized the way associative arrays key their entries:
/// integers and canonical integer strings become `Int`, everything else `Str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int(i64),
    Str(String),
}

impl From<&Value> for MapKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => MapKey::Str(String::new()),
            Value::Bool(b) => MapKey::Int(i64::from(*b)),
            Value::Int(i) => MapKey::Int(*i),
            Value::Float(f) => MapKey::Int(f.trunc() as i64),
            Value::String(s) => MapKey::from(s.as_str()),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        let canonical = match s.strip_prefix('-') {
            Some(rest) => !rest.starts_with('0') && parse_int(s).is_some(),
            None => (s == "0" || !s.starts_with('0')) && parse_int(s).is_some(),
        };
        match s.parse() {
            Ok(i) if canonical => MapKey::Int(i),
            _ => MapKey::Str(s.to_string()),
        }
    }
}

impl From<i64> for MapKey {
    fn from(i: i64) -> Self {
        MapKey::Int(i)
    }
}

impl From<i32> for MapKey {
    fn from(i: i32) -> Self {
        MapKey::Int(i64::from(i))
    }
}

impl Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int(i) => write!(f, "{}", i),
            MapKey::Str(s) => write!(f, "{}", s),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(val: $t) -> Self {
                    Value::Int(i64::from(val))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(val: u64) -> Self {
        match i64::try_from(val) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::String(val.to_string()),
        }
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::Float(f64::from(val))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::Float(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        Value::String(val.naive_utc().to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(Value::from(u64::MAX), Value::String(u64::MAX.to_string()));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::Int(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_param_type_inference() {
        assert_eq!(Value::Int(5).param_type(), ParamType::Int);
        assert_eq!(Value::from("42").param_type(), ParamType::Int);
        assert_eq!(Value::from("-7").param_type(), ParamType::Int);
        assert_eq!(Value::from("4.5").param_type(), ParamType::Str);
        assert_eq!(Value::from("abc").param_type(), ParamType::Str);
        assert_eq!(Value::Float(1.5).param_type(), ParamType::Str);
        assert_eq!(Value::Bool(true).param_type(), ParamType::Str);
        assert_eq!(Value::Null.param_type(), ParamType::Null);
    }

    #[test]
    fn test_map_key_normalization() {
        assert_eq!(MapKey::from(&Value::Int(2)), MapKey::Int(2));
        assert_eq!(MapKey::from(&Value::from("35")), MapKey::Int(35));
        assert_eq!(MapKey::from(&Value::from("035")), MapKey::Str("035".into()));
        assert_eq!(MapKey::from(&Value::from("-0")), MapKey::Str("-0".into()));
        assert_eq!(MapKey::from(&Value::from("John")), MapKey::Str("John".into()));
        assert_eq!(MapKey::from(&Value::Float(3.9)), MapKey::Int(3));
        assert_eq!(MapKey::from(&Value::Null), MapKey::Str(String::new()));
    }

    #[test]
    fn test_trim_quotes() {
        assert_eq!(Value::from("'abc'").trim_quotes(), Value::from("abc"));
        assert_eq!(Value::from("\"x\"").trim_quotes(), Value::from("x"));
        assert_eq!(Value::Int(3).trim_quotes(), Value::Int(3));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Int(42).type_name(), "BIGINT");
        assert_eq!(Value::String("test".to_string()).type_name(), "TEXT");
        assert_eq!(Value::Bool(true).type_name(), "BOOLEAN");
        assert_eq!(Value::Null.type_name(), "NULL");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Int(1).to_json(), serde_json::json!(1));
        assert_eq!(Value::from("a").to_json(), serde_json::json!("a"));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    }
}
