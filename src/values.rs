//! # Route Values
//!
//! [`RouteValueDictionary`] is the key/value bag that flows through every part
//! of the engine: values captured by the matcher, defaults and required values
//! declared by patterns, and the explicit/ambient values handed to the link
//! generator.
//!
//! Keys are compared case-insensitively and insertion order is preserved.
//! Values are compared with [`route_value_eq`], which looks at the invariant
//! string form of each value, ignores case, and treats `Null` and `""` as equal.
//!
//! The dictionary is backed by a small vector: route value sets rarely hold more
//! than a handful of entries, so a linear scan beats hashing.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// A single route value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteValue {
    /// Explicitly absent. Equal to the empty string under route-value equality.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl RouteValue {
    /// Invariant string form used for equality, constraint checks and URL rendering.
    #[must_use]
    pub fn as_invariant_str(&self) -> Cow<'_, str> {
        match self {
            RouteValue::Null => Cow::Borrowed(""),
            RouteValue::Bool(true) => Cow::Borrowed("true"),
            RouteValue::Bool(false) => Cow::Borrowed("false"),
            RouteValue::Int(i) => Cow::Owned(i.to_string()),
            RouteValue::Float(f) => Cow::Owned(f.to_string()),
            RouteValue::String(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// `Null` or the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            RouteValue::Null => true,
            RouteValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RouteValue::Null)
    }
}

impl fmt::Display for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_invariant_str())
    }
}

impl From<&str> for RouteValue {
    fn from(value: &str) -> Self {
        RouteValue::String(value.to_string())
    }
}

impl From<String> for RouteValue {
    fn from(value: String) -> Self {
        RouteValue::String(value)
    }
}

impl From<&String> for RouteValue {
    fn from(value: &String) -> Self {
        RouteValue::String(value.clone())
    }
}

impl From<i64> for RouteValue {
    fn from(value: i64) -> Self {
        RouteValue::Int(value)
    }
}

impl From<i32> for RouteValue {
    fn from(value: i32) -> Self {
        RouteValue::Int(i64::from(value))
    }
}

impl From<u32> for RouteValue {
    fn from(value: u32) -> Self {
        RouteValue::Int(i64::from(value))
    }
}

impl From<f64> for RouteValue {
    fn from(value: f64) -> Self {
        RouteValue::Float(value)
    }
}

impl From<bool> for RouteValue {
    fn from(value: bool) -> Self {
        RouteValue::Bool(value)
    }
}

impl<T: Into<RouteValue>> From<Option<T>> for RouteValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RouteValue::Null, Into::into)
    }
}

/// Route-value equality: invariant string form, case-insensitive, `Null == ""`.
#[must_use]
pub fn route_value_eq(a: &RouteValue, b: &RouteValue) -> bool {
    match (a, b) {
        (RouteValue::Int(x), RouteValue::Int(y)) => x == y,
        (RouteValue::Bool(x), RouteValue::Bool(y)) => x == y,
        _ => a
            .as_invariant_str()
            .eq_ignore_ascii_case(&b.as_invariant_str()),
    }
}

/// Same as [`route_value_eq`] but tolerant of missing values (missing == `Null`).
#[must_use]
pub fn route_value_opt_eq(a: Option<&RouteValue>, b: Option<&RouteValue>) -> bool {
    let null = RouteValue::Null;
    route_value_eq(a.unwrap_or(&null), b.unwrap_or(&null))
}

type Entries = SmallVec<[(String, RouteValue); 4]>;

/// Ordered, case-insensitive map from parameter name to [`RouteValue`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(String, RouteValue)>", into = "Vec<(String, RouteValue)>")]
pub struct RouteValueDictionary {
    entries: Entries,
}

impl RouteValueDictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SmallVec::with_capacity(capacity),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RouteValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// The value's invariant string form, if present.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(RouteValue::as_invariant_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace. A replaced entry keeps its position and key spelling.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<RouteValue>,
    ) -> Option<RouteValue> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert only when the key is absent. Returns false if it was present.
    pub fn try_insert(&mut self, key: impl Into<String>, value: impl Into<RouteValue>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<RouteValue> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Copy every entry of `other` that is not already present.
    pub fn merge_missing(&mut self, other: &RouteValueDictionary) {
        for (k, v) in other.iter() {
            self.try_insert(k, v.clone());
        }
    }
}

/// Two dictionaries are equal when they hold the same keys and route-value-equal values.
impl PartialEq for RouteValueDictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| route_value_eq(v, o)))
    }
}

impl<K: Into<String>, V: Into<RouteValue>> FromIterator<(K, V)> for RouteValueDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = RouteValueDictionary::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RouteValueDictionary
where
    K: Into<String>,
    V: Into<RouteValue>,
{
    fn from(items: [(K, V); N]) -> Self {
        items.into_iter().collect()
    }
}

impl From<Vec<(String, RouteValue)>> for RouteValueDictionary {
    fn from(items: Vec<(String, RouteValue)>) -> Self {
        items.into_iter().collect()
    }
}

impl From<RouteValueDictionary> for Vec<(String, RouteValue)> {
    fn from(values: RouteValueDictionary) -> Self {
        values.entries.into_vec()
    }
}

impl<'a> IntoIterator for &'a RouteValueDictionary {
    type Item = (&'a str, &'a RouteValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, RouteValue)>,
        fn(&'a (String, RouteValue)) -> (&'a str, &'a RouteValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(entry_ref as fn(&'a (String, RouteValue)) -> (&'a str, &'a RouteValue))
    }
}

fn entry_ref(entry: &(String, RouteValue)) -> (&str, &RouteValue) {
    (entry.0.as_str(), &entry.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive_and_keep_first_spelling() {
        let mut values = RouteValueDictionary::new();
        values.insert("Controller", "Home");
        values.insert("controller", "Store");
        assert_eq!(values.len(), 1);
        assert_eq!(values.keys().next(), Some("Controller"));
        assert_eq!(values.get_str("CONTROLLER").as_deref(), Some("Store"));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let values = RouteValueDictionary::from([("b", 1), ("a", 2), ("c", 3)]);
        let keys: Vec<_> = values.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn null_and_empty_string_are_equal() {
        assert!(route_value_eq(&RouteValue::Null, &RouteValue::from("")));
        assert!(route_value_opt_eq(None, Some(&RouteValue::from(""))));
        assert!(!route_value_eq(&RouteValue::Null, &RouteValue::from("x")));
    }

    #[test]
    fn values_compare_by_invariant_string() {
        assert!(route_value_eq(&RouteValue::from(5), &RouteValue::from("5")));
        assert!(route_value_eq(&RouteValue::from("HOME"), &RouteValue::from("home")));
        assert!(route_value_eq(&RouteValue::from(true), &RouteValue::from("True")));
        assert!(!route_value_eq(&RouteValue::from(5), &RouteValue::from(6)));
    }

    #[test]
    fn dictionary_equality_uses_route_value_rules() {
        let a = RouteValueDictionary::from([("id", RouteValue::from(5))]);
        let b = RouteValueDictionary::from([("ID", RouteValue::from("5"))]);
        assert_eq!(a, b);
    }

    #[test]
    fn try_insert_does_not_overwrite() {
        let mut values = RouteValueDictionary::from([("a", "1")]);
        assert!(!values.try_insert("A", "2"));
        assert!(values.try_insert("b", "2"));
        assert_eq!(values.get_str("a").as_deref(), Some("1"));
    }
}
