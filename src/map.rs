//! The configuration map: named properties, optionally grouped one level deep.
//!
//! A [`ConfigMap`] is built in code with [`ConfigMap::property`] and
//! [`ConfigMap::group`], or parsed from untyped JSON with
//! [`ConfigMap::from_json`]. Either way its shape is checked before any
//! source is read: [`ConfigMap::validate`] reports every malformed
//! descriptor at once as `InvalidDescriptor` errors.
//!
//! # JSON form
//!
//! ```json
//! {
//!   "port": {"variableName": "PORT", "type": "integer", "defaultValue": 8080},
//!   "greeting": "GREETING",
//!   "database": {
//!     "url": "DATABASE_URL",
//!     "password": {"filePath": "/run/secrets/db", "required": true}
//!   }
//! }
//! ```
//!
//! A top-level object with a `variableName` or `filePath` key is a property
//! descriptor; any other object, including an empty one, is a group. Inside a
//! group every object is a descriptor.

use std::collections::BTreeMap;

use stillwater::Validation;

use crate::descriptor::{PropertyConfig, PropertySource, PropertyType};
use crate::encoding::Encoding;
use crate::error::{validation_from_errors, ConfigError, ConfigErrors, ConfigValidation};
use crate::value::Value;

const VARIABLE_NAME: &str = "variableName";
const FILE_PATH: &str = "filePath";
const ENCODING: &str = "encoding";
const DEFAULT_VALUE: &str = "defaultValue";
const REQUIRED: &str = "required";
const TYPE: &str = "type";

const DESCRIPTOR_KEYS: [&str; 6] = [
    VARIABLE_NAME,
    FILE_PATH,
    ENCODING,
    DEFAULT_VALUE,
    REQUIRED,
    TYPE,
];

/// Path reported for errors about the map as a whole.
pub const ROOT_PATH: &str = "(root)";

/// A named set of properties nested under one group name.
#[derive(Debug, Clone, Default)]
pub struct ConfigGroup {
    properties: BTreeMap<String, PropertyConfig>,
}

impl ConfigGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property to the group.
    pub fn property(mut self, name: impl Into<String>, config: impl Into<PropertyConfig>) -> Self {
        self.properties.insert(name.into(), config.into());
        self
    }

    /// Get a property by name.
    pub fn get(&self, name: &str) -> Option<&PropertyConfig> {
        self.properties.get(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyConfig)> {
        self.properties.iter()
    }
}

/// A top-level entry of a [`ConfigMap`].
#[derive(Debug, Clone)]
pub enum ConfigEntry {
    /// A single property.
    Property(PropertyConfig),
    /// A group of properties.
    Group(ConfigGroup),
}

/// Mapping from property (or group) name to descriptor.
///
/// Entries iterate in name order, which is also the order failures appear
/// in a [`ConfigErrors`] report.
#[derive(Debug, Clone, Default)]
pub struct ConfigMap {
    entries: BTreeMap<String, ConfigEntry>,
}

impl ConfigMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level property. Replaces any entry with the same name.
    pub fn property(mut self, name: impl Into<String>, config: impl Into<PropertyConfig>) -> Self {
        self.entries
            .insert(name.into(), ConfigEntry::Property(config.into()));
        self
    }

    /// Add a group of properties. Replaces any entry with the same name.
    pub fn group(mut self, name: impl Into<String>, group: ConfigGroup) -> Self {
        self.entries.insert(name.into(), ConfigEntry::Group(group));
        self
    }

    /// Get a top-level entry.
    pub fn get(&self, name: &str) -> Option<&ConfigEntry> {
        self.entries.get(name)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over top-level entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigEntry)> {
        self.entries.iter()
    }

    /// Flatten to `(path, descriptor)` pairs in report order.
    pub fn leaves(&self) -> Vec<(String, &PropertyConfig)> {
        let mut leaves = Vec::new();
        for (name, entry) in &self.entries {
            match entry {
                ConfigEntry::Property(config) => leaves.push((name.clone(), config)),
                ConfigEntry::Group(group) => {
                    for (property, config) in group.iter() {
                        leaves.push((format!("{}.{}", name, property), config));
                    }
                }
            }
        }
        leaves
    }

    /// Check the shape of every entry without reading any source.
    ///
    /// Returns the flattened leaves on success, or every shape error found.
    pub fn validate(&self) -> Result<Vec<(String, &PropertyConfig)>, ConfigErrors> {
        let mut checks: Vec<ConfigValidation<Vec<(String, &PropertyConfig)>>> = Vec::new();

        for (name, entry) in &self.entries {
            match entry {
                ConfigEntry::Property(config) => {
                    let mut errors = check_name(name, name);
                    errors.extend(check_source(name, config));
                    checks.push(validation_from_errors(vec![(name.clone(), config)], errors));
                }
                ConfigEntry::Group(group) => {
                    let mut errors = check_name(name, name);
                    let mut leaves = Vec::with_capacity(group.len());
                    for (property, config) in group.iter() {
                        let path = format!("{}.{}", name, property);
                        errors.extend(check_name(&path, property));
                        errors.extend(check_source(&path, config));
                        leaves.push((path, config));
                    }
                    checks.push(validation_from_errors(leaves, errors));
                }
            }
        }

        match Validation::all_vec(checks) {
            Validation::Success(groups) => Ok(groups.into_iter().flatten().collect()),
            Validation::Failure(errors) => Err(errors),
        }
    }

    /// Parse an untyped JSON description into a map.
    ///
    /// Every malformed descriptor is reported, not just the first.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ConfigErrors> {
        let object = json.as_object().ok_or_else(|| {
            ConfigErrors::single(invalid(ROOT_PATH, "\"configMap\" must be a ConfigMap object."))
        })?;

        let entries: Vec<ConfigValidation<(String, ConfigEntry)>> = object
            .iter()
            .map(|(name, value)| parse_entry(name, value).map(|entry| (name.clone(), entry)))
            .collect();

        match Validation::all_vec(entries) {
            Validation::Success(entries) => Ok(Self {
                entries: entries.into_iter().collect(),
            }),
            Validation::Failure(errors) => Err(errors),
        }
    }
}

impl TryFrom<&serde_json::Value> for ConfigMap {
    type Error = ConfigErrors;

    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_json(json)
    }
}

fn invalid(path: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidDescriptor {
        path: path.to_string(),
        message: message.into(),
    }
}

fn check_name(path: &str, name: &str) -> Vec<ConfigError> {
    if name.is_empty() {
        vec![invalid(
            path,
            format!("\"configMap.{}\" has an empty name.", path),
        )]
    } else if name.contains('.') {
        vec![invalid(
            path,
            format!("\"configMap.{}\": names cannot contain \".\".", path),
        )]
    } else {
        Vec::new()
    }
}

fn check_source(path: &str, config: &PropertyConfig) -> Vec<ConfigError> {
    match config.source() {
        PropertySource::Environment { variable_name } if variable_name.is_empty() => {
            vec![invalid(
                path,
                format!("\"configMap.{}.variableName\" must be a non-empty string.", path),
            )]
        }
        PropertySource::Environment { variable_name }
            if variable_name.contains('=') || variable_name.contains('\0') =>
        {
            vec![invalid(
                path,
                format!(
                    "\"configMap.{}.variableName\" cannot contain \"=\" or NUL.",
                    path
                ),
            )]
        }
        PropertySource::File { file_path, .. } if file_path.as_os_str().is_empty() => {
            vec![invalid(
                path,
                format!("\"configMap.{}.filePath\" must be a non-empty string.", path),
            )]
        }
        _ => Vec::new(),
    }
}

fn is_descriptor_object(object: &serde_json::Map<String, serde_json::Value>) -> bool {
    object.contains_key(VARIABLE_NAME) || object.contains_key(FILE_PATH)
}

fn parse_entry(name: &str, value: &serde_json::Value) -> ConfigValidation<ConfigEntry> {
    match value {
        serde_json::Value::String(variable_name) => {
            Validation::Success(ConfigEntry::Property(PropertyConfig::env(variable_name.as_str())))
        }
        serde_json::Value::Object(object) if is_descriptor_object(object) => {
            parse_descriptor(name, object).map(ConfigEntry::Property)
        }
        serde_json::Value::Object(object) => {
            let properties: Vec<ConfigValidation<(String, PropertyConfig)>> = object
                .iter()
                .map(|(property, value)| {
                    let path = format!("{}.{}", name, property);
                    parse_property(&path, value).map(|config| (property.clone(), config))
                })
                .collect();
            Validation::all_vec(properties).map(|properties| {
                ConfigEntry::Group(ConfigGroup {
                    properties: properties.into_iter().collect(),
                })
            })
        }
        _ => Validation::Failure(ConfigErrors::single(invalid(
            name,
            format!(
                "\"configMap.{}\" must be a string, a property descriptor, or a ConfigGroup object.",
                name
            ),
        ))),
    }
}

fn parse_property(path: &str, value: &serde_json::Value) -> ConfigValidation<PropertyConfig> {
    match value {
        serde_json::Value::String(variable_name) => {
            Validation::Success(PropertyConfig::env(variable_name.as_str()))
        }
        serde_json::Value::Object(object) => parse_descriptor(path, object),
        _ => Validation::Failure(ConfigErrors::single(invalid(
            path,
            format!(
                "\"configMap.{}\" must be a string, EnvironmentConfig object, or FileConfig object.",
                path
            ),
        ))),
    }
}

fn parse_descriptor(
    path: &str,
    object: &serde_json::Map<String, serde_json::Value>,
) -> ConfigValidation<PropertyConfig> {
    let has_variable = object.contains_key(VARIABLE_NAME);
    let has_file = object.contains_key(FILE_PATH);

    if !has_variable && !has_file {
        return Validation::Failure(ConfigErrors::single(invalid(
            path,
            format!(
                "\"configMap.{}\" must be a string, EnvironmentConfig object, or FileConfig object. \
                 Neither \"filePath\" nor \"variableName\" are defined.",
                path
            ),
        )));
    }
    if has_variable && has_file {
        return Validation::Failure(ConfigErrors::single(invalid(
            path,
            format!(
                "Cannot determine whether \"configMap.{}\" is an EnvironmentConfig object or a FileConfig object. \
                 Both \"filePath\" and \"variableName\" are defined.",
                path
            ),
        )));
    }

    let mut errors: Vec<ConfigError> = object
        .keys()
        .filter(|k| !DESCRIPTOR_KEYS.contains(&k.as_str()))
        .map(|k| invalid(path, format!("\"configMap.{}\" has unknown key \"{}\".", path, k)))
        .collect();

    let mut string_field = |key: &str| -> Option<String> {
        match object.get(key) {
            None => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(invalid(
                    path,
                    format!("\"configMap.{}.{}\" must be a string.", path, key),
                ));
                None
            }
        }
    };

    let variable_name = string_field(VARIABLE_NAME);
    let file_path = string_field(FILE_PATH);
    let encoding_name = string_field(ENCODING);
    let type_name = string_field(TYPE);

    let encoding = match encoding_name {
        Some(_) if has_variable => {
            errors.push(invalid(
                path,
                format!(
                    "\"configMap.{}.encoding\" is only valid for FileConfig objects.",
                    path
                ),
            ));
            Encoding::default()
        }
        Some(name) => name.parse::<Encoding>().unwrap_or_else(|e| {
            errors.push(invalid(path, format!("\"configMap.{}.encoding\": {}.", path, e)));
            Encoding::default()
        }),
        None => Encoding::default(),
    };

    let kind = match type_name {
        Some(name) => name.parse::<PropertyType>().unwrap_or_else(|e| {
            errors.push(invalid(path, format!("\"configMap.{}.type\": {}.", path, e)));
            PropertyType::String
        }),
        None => PropertyType::String,
    };

    let required = match object.get(REQUIRED) {
        None => true,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(invalid(
                path,
                format!("\"configMap.{}.required\" must be a boolean.", path),
            ));
            true
        }
    };

    let mut config = match (variable_name, file_path) {
        (Some(variable_name), _) => PropertyConfig::env(variable_name),
        (_, Some(file_path)) => PropertyConfig::file_with_encoding(file_path, encoding),
        // The key was present but not a string; the error is already recorded.
        (None, None) => PropertyConfig::env(String::new()),
    };
    config = config.required(required).kind(kind);

    match object.get(DEFAULT_VALUE) {
        None | Some(serde_json::Value::Null) => {}
        Some(value) => config = config.default_value(Value::from(value.clone())),
    }

    validation_from_errors(config, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages(errors: &ConfigErrors) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_leaves_flatten_groups_in_order() {
        let map = ConfigMap::new()
            .property("port", "PORT")
            .group(
                "database",
                ConfigGroup::new()
                    .property("user", "DB_USER")
                    .property("password", PropertyConfig::file("/run/secrets/db")),
            );

        let paths: Vec<String> = map.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["database.password", "database.user", "port"]);
    }

    #[test]
    fn test_validate_accepts_well_formed_map() {
        let map = ConfigMap::new()
            .property("greeting", "GREETING")
            .group("db", ConfigGroup::new().property("url", "DB_URL"));

        let leaves = map.validate().unwrap();
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn test_validate_accumulates_shape_errors() {
        let map = ConfigMap::new()
            .property("", "A")
            .property("a.b", "B")
            .property("c", PropertyConfig::env(""))
            .property("d", PropertyConfig::file(""))
            .group("g", ConfigGroup::new().property("e", "BAD=NAME"));

        let errors = map.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.is_descriptor_error());
        assert_eq!(errors.paths(), vec!["", "a.b", "c", "d", "g.e"]);
    }

    #[test]
    fn test_from_json_shapes() {
        let map = ConfigMap::from_json(&json!({
            "greeting": "GREETING",
            "port": {"variableName": "PORT", "type": "number", "defaultValue": 8080},
            "key": {"filePath": "/run/secrets/key", "encoding": "base64", "required": false},
            "database": {
                "url": "DATABASE_URL",
                "password": {"filePath": "/run/secrets/db"}
            }
        }))
        .unwrap();

        let leaves = map.leaves();
        let paths: Vec<&str> = leaves.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["database.password", "database.url", "greeting", "key", "port"]
        );

        let port = leaves[4].1;
        assert_eq!(port.get_kind(), PropertyType::Integer);
        assert_eq!(port.get_default(), Some(&Value::Integer(8080)));
        assert!(port.is_required());

        let key = leaves[3].1;
        assert!(!key.is_required());
        assert_eq!(
            key.source(),
            &PropertySource::File {
                file_path: "/run/secrets/key".into(),
                encoding: Encoding::Base64,
            }
        );
    }

    #[test]
    fn test_from_json_neither_source() {
        let errors = ConfigMap::from_json(&json!({
            "g": {"empty": {}, "partial": {"defaultValue": 1, "required": false}}
        }))
        .unwrap_err();
        assert_eq!(errors.paths(), vec!["g.empty", "g.partial"]);
        assert!(messages(&errors)
            .iter()
            .all(|m| m.contains("Neither \"filePath\" nor \"variableName\" are defined.")));
    }

    #[test]
    fn test_from_json_group_with_descriptor_key_names() {
        let map = ConfigMap::from_json(&json!({
            "db": {"type": "DB_TYPE", "url": "DB_URL", "required": "DB_REQUIRED"}
        }))
        .unwrap();

        let leaves = map.leaves();
        let paths: Vec<&str> = leaves.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["db.required", "db.type", "db.url"]);
        assert_eq!(
            leaves[1].1.source(),
            &PropertySource::Environment {
                variable_name: "DB_TYPE".to_string()
            }
        );
    }

    #[test]
    fn test_from_json_empty_group() {
        let map = ConfigMap::from_json(&json!({"g": {}})).unwrap();
        assert!(matches!(map.get("g"), Some(ConfigEntry::Group(group)) if group.is_empty()));
        assert!(map.validate().unwrap().is_empty());
    }

    #[test]
    fn test_from_json_both_sources() {
        let errors = ConfigMap::from_json(&json!({
            "property": {"filePath": "./path/file.extension", "variableName": "VARIABLE_NAME"}
        }))
        .unwrap_err();

        assert_eq!(errors.first().path(), "property");
        assert!(messages(&errors)[0].starts_with("Cannot determine whether \"configMap.property\""));
        assert!(messages(&errors)[0].contains("Both \"filePath\" and \"variableName\" are defined."));
    }

    #[test]
    fn test_from_json_both_sources_in_group() {
        let errors = ConfigMap::from_json(&json!({
            "db": {"password": {"filePath": "/x", "variableName": "X"}}
        }))
        .unwrap_err();

        assert_eq!(errors.first().path(), "db.password");
    }

    #[test]
    fn test_from_json_rejects_non_object_root() {
        let errors = ConfigMap::from_json(&json!(["PORT"])).unwrap_err();
        assert_eq!(errors.first().path(), ROOT_PATH);
        assert_eq!(
            errors.first().to_string(),
            "\"configMap\" must be a ConfigMap object."
        );
    }

    #[test]
    fn test_from_json_rejects_primitive_entries() {
        let errors = ConfigMap::from_json(&json!({"a": null, "b": 3, "g": {"c": true}})).unwrap_err();
        assert_eq!(errors.paths(), vec!["a", "b", "g.c"]);
    }

    #[test]
    fn test_from_json_reports_every_bad_field() {
        let errors = ConfigMap::from_json(&json!({
            "a": {"variableName": "A", "encoding": "utf8", "required": "yes", "type": "date", "format": "x"}
        }))
        .unwrap_err();

        // encoding on env, required not bool, unknown type, unknown key
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.path() == "a"));
    }

    #[test]
    fn test_from_json_null_default_is_no_default() {
        let map = ConfigMap::from_json(&json!({"a": {"variableName": "A", "defaultValue": null}})).unwrap();
        assert!(map.leaves()[0].1.get_default().is_none());
    }

    #[test]
    fn test_try_from() {
        let map = ConfigMap::try_from(&json!({})).unwrap();
        assert!(map.is_empty());
    }
}
