//! Execution state shared between the nodes of a running graph.

use crate::error::StateError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value state of one graph execution.
///
/// Values are arbitrary JSON. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Map<String, Value>);

impl State {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value for `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the value for `key` as an integer.
    ///
    /// Floating-point numbers are truncated toward zero, since values that
    /// went through JSON lose their integer-ness.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let Value::Number(number) = self.0.get(key)? else {
            return None;
        };
        number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
    }

    /// Returns the value for `key` as a float.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Returns the value for `key` if it is a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Deserializes the value for `key` into `T`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the value does not match `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StateError> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };
        T::deserialize(value).map(Some).map_err(|err| {
            StateError::new(key, format!("cannot read as {}", core::any::type_name::<T>()))
                .with_source(err)
        })
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Serializes `value` and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if `value` cannot be serialized.
    pub fn set_serialized<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), StateError> {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.0.insert(key, value);
                Ok(())
            }
            Err(err) => Err(StateError::new(key, "cannot serialize value").with_source(err)),
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Copies every entry of `other` into this state; `other` wins on conflicts.
    pub fn merge(&mut self, other: &State) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Iterates over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the state and returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Serializes the state to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    /// Parses a state from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a JSON object.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<Map<String, Value>> for State {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for State {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_getters() {
        let mut state = State::new();
        state.set("name", "dago");
        state.set("count", 3);
        state.set("ratio", 2.9);
        state.set("negative", -2.9);
        state.set("done", true);

        assert_eq!(state.get_str("name"), Some("dago"));
        assert_eq!(state.get_i64("count"), Some(3));
        assert_eq!(state.get_i64("ratio"), Some(2));
        assert_eq!(state.get_i64("negative"), Some(-2));
        assert_eq!(state.get_f64("count"), Some(3.0));
        assert_eq!(state.get_bool("done"), Some(true));

        assert_eq!(state.get_str("count"), None);
        assert_eq!(state.get_i64("name"), None);
        assert_eq!(state.get_bool("missing"), None);
    }

    #[test]
    fn get_as_deserializes_or_reports_key() {
        let mut state = State::new();
        state.set("tags", json!(["a", "b"]));

        let tags: Option<Vec<String>> = state.get_as("tags").unwrap();
        assert_eq!(tags, Some(vec!["a".to_string(), "b".to_string()]));

        let missing: Option<Vec<String>> = state.get_as("nope").unwrap();
        assert!(missing.is_none());

        let err = state.get_as::<u32>("tags").unwrap_err();
        assert_eq!(err.key, "tags");
    }

    #[test]
    fn merge_overwrites_and_copy_is_deep() {
        let mut base: State = [("a", json!(1)), ("b", json!({"x": 1}))].into_iter().collect();
        let other: State = [("b", json!({"x": 2})), ("c", json!(3))].into_iter().collect();

        let snapshot = base.clone();
        base.merge(&other);
        assert_eq!(base.get("b"), Some(&json!({"x": 2})));
        assert_eq!(base.len(), 3);
        assert_eq!(snapshot.get("b"), Some(&json!({"x": 1})));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn json_round_trip_is_a_plain_object() {
        let mut state = State::new();
        state.set("k", "v");
        assert_eq!(state.to_json().unwrap(), r#"{"k":"v"}"#);
        assert_eq!(State::from_json(r#"{"k":"v"}"#).unwrap(), state);
        assert!(State::from_json("[1]").is_err());
    }

    #[test]
    fn remove_and_clear() {
        let mut state = State::new();
        state.set("a", 1);
        state.set_serialized("b", &vec![1, 2]).unwrap();
        assert!(state.contains_key("b"));
        assert_eq!(state.remove("a"), Some(json!(1)));
        assert_eq!(state.keys().collect::<Vec<_>>(), ["b"]);
        state.clear();
        assert!(state.is_empty());
    }
}
