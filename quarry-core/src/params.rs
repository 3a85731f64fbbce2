//! Parameter bindings accumulated while rendering a statement

use crate::Value;
use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

/// Name of a bound parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    /// A `:name` placeholder, always stored with its leading colon
    Named(String),
    /// A `?` placeholder, 1-based
    Positional(usize),
}

impl ParamKey {
    /// Create a named key; the leading colon is optional
    pub fn named(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name.starts_with(':') {
            Self::Named(name.to_string())
        } else {
            Self::Named(format!(":{}", name))
        }
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::named(name)
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::named(name)
    }
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Positional(position)
    }
}

impl Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Named(name) => write!(f, "{}", name),
            ParamKey::Positional(n) => write!(f, "?{}", n),
        }
    }
}

/// A shared cell whose current value is re-read on every execution.
///
/// Binding a slot instead of a value lets a caller prepare a statement once
/// and run it repeatedly while changing the parameter between runs:
///
/// ```
/// use quarry_core::mock::MockConnection;
/// use quarry_core::{Params, Query, Slot};
///
/// let city = Slot::new("Wuhan");
/// let mut query: Query<'_, MockConnection> =
///     Query::new("SELECT name FROM company WHERE city = :city", Params::new());
/// query.bind_slot(":city", &city).unwrap();
/// city.set("Beijing");
/// assert_eq!(query.params().value(&":city".into()), Some("Beijing".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Slot(Rc<RefCell<Value>>);

impl Slot {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Rc::new(RefCell::new(value.into())))
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.0.borrow_mut() = value.into();
    }

    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }
}

/// How a parameter is bound: by value, or by slot
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Slot(Slot),
    /// A slot whose value is coerced to an integer when read
    IntSlot(Slot),
}

impl Binding {
    /// The value to send to the driver right now
    pub fn current(&self) -> Value {
        match self {
            Binding::Value(v) => v.clone(),
            Binding::Slot(slot) => slot.get(),
            Binding::IntSlot(slot) => coerce_int(&slot.get()),
        }
    }

    pub fn is_slot(&self) -> bool {
        matches!(self, Binding::Slot(_) | Binding::IntSlot(_))
    }
}

/// Integer view of a value the way an integer-typed bind sees it: numeric
/// text is truncated, NULL stays NULL, anything else becomes 0.
pub(crate) fn coerce_int(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        other => Value::Int(
            other
                .as_i64()
                .or_else(|| other.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
        ),
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.current() == other.current()
    }
}

/// Ordered parameter set; keys are unique and re-inserting a key replaces
/// its binding in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, Binding)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace a binding
    pub fn bind(&mut self, key: ParamKey, binding: Binding) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = binding,
            None => self.entries.push((key, binding)),
        }
    }

    /// Insert or replace a value binding
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) {
        self.bind(key.into(), Binding::Value(value.into()));
    }

    /// Builder-style `set`
    pub fn with(mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Binding> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, b)| b)
    }

    /// Current value bound to `key`
    pub fn value(&self, key: &ParamKey) -> Option<Value> {
        self.get(key).map(Binding::current)
    }

    pub fn contains(&self, key: &ParamKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Binding)> {
        self.entries.iter().map(|(k, b)| (k, b))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Merge `other` into `self`; keys present in both take `other`'s binding
    pub fn merge(&mut self, other: &Params) {
        for (key, binding) in other.iter() {
            self.bind(key.clone(), binding.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<ParamKey>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<ParamKey>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_key_normalization() {
        assert_eq!(ParamKey::named("id"), ParamKey::Named(":id".into()));
        assert_eq!(ParamKey::named(":id"), ParamKey::Named(":id".into()));
        assert_eq!(ParamKey::from(2usize), ParamKey::Positional(2));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = Params::from([("a", 1), ("b", 2)]);
        params.set("a", 10);
        let keys: Vec<_> = params.keys().cloned().collect();
        assert_eq!(keys, vec![ParamKey::named("a"), ParamKey::named("b")]);
        assert_eq!(params.value(&"a".into()), Some(Value::Int(10)));
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = Params::from([("a", 1), ("b", 2)]);
        base.merge(&Params::from([("b", 3), ("c", 4)]));
        assert_eq!(base.len(), 3);
        assert_eq!(base.value(&"b".into()), Some(Value::Int(3)));
    }

    #[test]
    fn test_slot_is_reread() {
        let slot = Slot::new(1);
        let mut params = Params::new();
        params.bind(":n".into(), Binding::Slot(slot.clone()));
        slot.set(5);
        assert_eq!(params.value(&":n".into()), Some(Value::Int(5)));
        assert!(params.get(&":n".into()).is_some_and(Binding::is_slot));
    }

    #[test]
    fn test_default_slot_holds_null() {
        let slot = Slot::default();
        assert_eq!(slot.get(), Value::Null);
        assert_eq!(Binding::IntSlot(slot.clone()).current(), Value::Null);
        slot.set(3);
        assert_eq!(Binding::Slot(slot).current(), Value::Int(3));
    }

    #[test]
    fn test_int_slot_coerces() {
        let slot = Slot::new("12.7");
        assert_eq!(Binding::IntSlot(slot.clone()).current(), Value::Int(12));
        slot.set("abc");
        assert_eq!(Binding::IntSlot(slot.clone()).current(), Value::Int(0));
        slot.set(());
        assert_eq!(Binding::IntSlot(slot).current(), Value::Null);
    }
}
