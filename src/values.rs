//! The resolved configuration object.
//!
//! [`ConfigValues`] maps each property path to its resolved [`ConfigValue`].
//! Absent optional properties are present with a `Null` value, so the set of
//! keys always matches the set of successfully resolved properties.

use std::collections::BTreeMap;

use crate::value::{ConfigValue, Value};

/// Resolved configuration values keyed by dotted path
/// (`"port"`, `"database.host"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigValues {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigValues {
    /// Create an empty ConfigValues container.
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Insert a value at the given path.
    pub fn insert(&mut self, path: String, value: ConfigValue) {
        self.values.insert(path, value);
    }

    /// Get a value by path.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.values.get(path)
    }

    /// Get the bare value at a path.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        self.get(path).map(|cv| &cv.value)
    }

    /// Get the value at a path if it is a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_value(path).and_then(Value::as_str)
    }

    /// Check if a path exists.
    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// Get the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all path-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }

    /// Get all paths.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Convert to a nested JSON object.
    ///
    /// Grouped paths like "database.host" become
    /// `{"database": {"host": "..."}}`; absent optionals become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();

        for (path, config_value) in self.iter() {
            let segments: Vec<&str> = path.split('.').collect();
            insert_value(&mut root, &segments, config_value.value.to_json());
        }

        serde_json::Value::Object(root)
    }
}

/// Insert a value into a JSON object following the path segments.
fn insert_value(
    root: &mut serde_json::Map<String, serde_json::Value>,
    segments: &[&str],
    value: serde_json::Value,
) {
    match segments {
        [] => {}
        [key] => {
            root.insert(key.to_string(), value);
        }
        [key, rest @ ..] => {
            let child = root
                .entry(key.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if !child.is_object() {
                *child = serde_json::Value::Object(serde_json::Map::new());
            }
            if let serde_json::Value::Object(map) = child {
                insert_value(map, rest, value);
            }
        }
    }
}

impl IntoIterator for ConfigValues {
    type Item = (String, ConfigValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
