//! Property descriptors: how to obtain one configuration value.
//!
//! A [`PropertyConfig`] names exactly one source (an environment variable or
//! a file) and carries the options the rule table consults: a default, the
//! `required` flag, a formatter and an optional type coercion.
//!
//! # Example
//!
//! ```
//! use loadconf::{Encoding, PropertyConfig, PropertyType};
//!
//! // Shorthand: environment variable with all defaults
//! let host = PropertyConfig::from("HOST");
//!
//! let port = PropertyConfig::env("PORT")
//!     .default_value(8080)
//!     .format(|raw| raw.parse::<u16>());
//!
//! let key = PropertyConfig::file_with_encoding("/run/secrets/key", Encoding::Base64)
//!     .required(false);
//!
//! let workers = PropertyConfig::env("WORKERS").kind(PropertyType::Integer);
//! # let _ = (host, port, key, workers);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::encoding::Encoding;
use crate::value::Value;

/// Error type a formatter may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A function turning a present raw string into a value.
pub type Formatter = Arc<dyn Fn(&str) -> Result<Value, BoxError> + Send + Sync>;

/// Built-in type coercion applied to raw source values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyType {
    /// Keep the raw string (no coercion).
    #[default]
    String,
    /// Parse a signed 64-bit integer.
    Integer,
    /// Parse a 64-bit float.
    Float,
    /// Parse `true/false`, `yes/no`, `on/off`, `1/0` (case-insensitive).
    Boolean,
}

impl PropertyType {
    /// Canonical name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Float => "float",
            PropertyType::Boolean => "boolean",
        }
    }

    /// Coerce a raw string, returning `None` if it cannot be parsed.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self {
            PropertyType::String => Some(Value::String(raw.to_string())),
            PropertyType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
            PropertyType::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            PropertyType::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Some(Value::Bool(true)),
                "false" | "no" | "0" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a property type name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown property type '{0}'")]
pub struct UnknownPropertyType(pub String);

impl FromStr for PropertyType {
    type Err = UnknownPropertyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(PropertyType::String),
            // "number" is the historical name for integer parsing
            "integer" | "number" => Ok(PropertyType::Integer),
            "float" => Ok(PropertyType::Float),
            "boolean" => Ok(PropertyType::Boolean),
            _ => Err(UnknownPropertyType(s.to_string())),
        }
    }
}

/// Where a property's raw value is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// An environment variable.
    Environment { variable_name: String },
    /// A file, decoded with `encoding`.
    File {
        file_path: PathBuf,
        encoding: Encoding,
    },
}

impl PropertySource {
    /// Human-readable description of the source for logs.
    pub fn describe(&self) -> String {
        match self {
            PropertySource::Environment { variable_name } => format!("env:{}", variable_name),
            PropertySource::File { file_path, .. } => file_path.display().to_string(),
        }
    }
}

/// Descriptor for a single configuration property.
#[derive(Clone)]
pub struct PropertyConfig {
    source: PropertySource,
    default_value: Option<Value>,
    required: bool,
    format: Option<Formatter>,
    kind: PropertyType,
}

impl PropertyConfig {
    fn with_source(source: PropertySource) -> Self {
        Self {
            source,
            default_value: None,
            required: true,
            format: None,
            kind: PropertyType::String,
        }
    }

    /// Property read from an environment variable.
    pub fn env(variable_name: impl Into<String>) -> Self {
        Self::with_source(PropertySource::Environment {
            variable_name: variable_name.into(),
        })
    }

    /// Property read from a UTF-8 file.
    pub fn file(file_path: impl Into<PathBuf>) -> Self {
        Self::file_with_encoding(file_path, Encoding::Utf8)
    }

    /// Property read from a file decoded with `encoding`.
    pub fn file_with_encoding(file_path: impl Into<PathBuf>, encoding: Encoding) -> Self {
        Self::with_source(PropertySource::File {
            file_path: file_path.into(),
            encoding,
        })
    }

    /// Value used when the source is absent or unreadable.
    ///
    /// A default satisfies the property even when it is required, and is
    /// used as-is: the formatter and coercion never see it.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Whether an absent source without a default is an error (default: true).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Shorthand for `.required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Transform a present raw value.
    ///
    /// An `Err` from the formatter fails the property even when it is
    /// optional; its message becomes the property's error message.
    pub fn format<F, V, E>(mut self, formatter: F) -> Self
    where
        F: Fn(&str) -> Result<V, E> + Send + Sync + 'static,
        V: Into<Value>,
        E: Into<BoxError>,
    {
        let format: Formatter = Arc::new(move |raw: &str| -> Result<Value, BoxError> {
            formatter(raw).map(Into::into).map_err(Into::into)
        });
        self.format = Some(format);
        self
    }

    /// Coerce the raw value to a built-in type.
    pub fn kind(mut self, kind: PropertyType) -> Self {
        self.kind = kind;
        self
    }

    /// The source this property reads from.
    pub fn source(&self) -> &PropertySource {
        &self.source
    }

    /// The default value, if any.
    pub fn get_default(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Whether the property is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The formatter, if any.
    pub fn formatter(&self) -> Option<&Formatter> {
        self.format.as_ref()
    }

    /// The coercion type.
    pub fn get_kind(&self) -> PropertyType {
        self.kind
    }
}

impl fmt::Debug for PropertyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyConfig")
            .field("source", &self.source)
            .field("default_value", &self.default_value)
            .field("required", &self.required)
            .field("format", &self.format.as_ref().map(|_| "<fn>"))
            .field("kind", &self.kind)
            .finish()
    }
}

impl From<&str> for PropertyConfig {
    fn from(variable_name: &str) -> Self {
        Self::env(variable_name)
    }
}

impl From<String> for PropertyConfig {
    fn from(variable_name: String) -> Self {
        Self::env(variable_name)
    }
}
