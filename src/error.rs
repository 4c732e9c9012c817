//! Error types for the loadconf configuration library.
//!
//! Every failure is attributed to the dotted path of the property that
//! caused it (`group.property` or `property`). Failures are accumulated into
//! [`ConfigErrors`], which is backed by stillwater's `NonEmptyVec` so an empty
//! error report cannot exist.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use stillwater::{NonEmptyVec, Semigroup, Validation};
use thiserror::Error;

use crate::descriptor::PropertyType;
use crate::encoding::Encoding;

/// Header line of the composite error message.
const HEADER: &str = "Configuration could not be loaded for the following properties:";

/// Location where a resolved configuration value originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Name of the source (e.g., "env:APP_HOST", "/run/secrets/db", "default")
    pub source: String,
}

impl SourceLocation {
    /// Create a new source location with just a source name.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Create a location for an environment variable.
    pub fn env(var_name: &str) -> Self {
        Self::new(format!("env:{}", var_name))
    }

    /// Create a location for a file.
    pub fn file(path: &str) -> Self {
        Self::new(path)
    }

    /// Location of a value taken from the descriptor's default.
    pub fn default_value() -> Self {
        Self::new("default")
    }

    /// Location of an optional property whose source was absent.
    pub fn unset() -> Self {
        Self::new("unset")
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Kinds of file read failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileErrorKind {
    /// The file does not exist
    #[error("no such file or directory")]
    NotFound,
    /// The file exists but could not be opened
    #[error("permission denied")]
    PermissionDenied,
    /// Any other I/O failure
    #[error("{message}")]
    Io { message: String },
    /// The bytes could not be decoded with the requested encoding
    #[error("invalid {encoding} data: {message}")]
    Decode { encoding: Encoding, message: String },
}

impl FileErrorKind {
    /// Classify an I/O error.
    pub fn from_io(error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FileErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => FileErrorKind::PermissionDenied,
            _ => FileErrorKind::Io {
                message: error.to_string(),
            },
        }
    }
}

/// Errors that can occur while resolving a single property.
///
/// The `Display` output is the cause message alone; the property path is
/// available through [`ConfigError::path`] and is prepended by
/// [`ConfigErrors`] when rendering the full report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration description itself is malformed
    #[error("{message}")]
    InvalidDescriptor { path: String, message: String },

    /// A required environment variable is absent
    #[error("{variable_name} is not defined.")]
    NotDefined {
        path: String,
        variable_name: String,
    },

    /// A required file could not be read or decoded
    #[error("{kind}, open '{file_path}'")]
    File {
        path: String,
        file_path: String,
        kind: FileErrorKind,
    },

    /// A user-supplied formatter rejected a present raw value
    #[error("{message}")]
    Format { path: String, message: String },

    /// A built-in type coercion could not parse a present raw value
    #[error("the value for \"{path}\" was defined, but could not be coerced to {expected}")]
    Coercion {
        path: String,
        expected: PropertyType,
        actual_value: String,
    },

    /// The resolved values could not be deserialized into the target type
    #[error("{message}")]
    Deserialize { path: String, message: String },
}

impl ConfigError {
    /// Get the property path that this error relates to.
    pub fn path(&self) -> &str {
        match self {
            ConfigError::InvalidDescriptor { path, .. }
            | ConfigError::NotDefined { path, .. }
            | ConfigError::File { path, .. }
            | ConfigError::Format { path, .. }
            | ConfigError::Coercion { path, .. }
            | ConfigError::Deserialize { path, .. } => path,
        }
    }

    /// Check if this error describes a malformed descriptor rather than a
    /// failed read.
    pub fn is_descriptor_error(&self) -> bool {
        matches!(self, ConfigError::InvalidDescriptor { .. })
    }

    /// Prefix the path of this error, e.g. when a config map is embedded
    /// under another name.
    pub fn with_path_prefix(self, prefix: &str) -> Self {
        let join = |path: String| format!("{}.{}", prefix, path);
        match self {
            ConfigError::InvalidDescriptor { path, message } => ConfigError::InvalidDescriptor {
                path: join(path),
                message,
            },
            ConfigError::NotDefined {
                path,
                variable_name,
            } => ConfigError::NotDefined {
                path: join(path),
                variable_name,
            },
            ConfigError::File {
                path,
                file_path,
                kind,
            } => ConfigError::File {
                path: join(path),
                file_path,
                kind,
            },
            ConfigError::Format { path, message } => ConfigError::Format {
                path: join(path),
                message,
            },
            ConfigError::Coercion {
                path,
                expected,
                actual_value,
            } => ConfigError::Coercion {
                path: join(path),
                expected,
                actual_value,
            },
            ConfigError::Deserialize { path, message } => ConfigError::Deserialize {
                path: join(path),
                message,
            },
        }
    }
}

/// A non-empty collection of configuration errors, one per failing property.
///
/// Uses `NonEmptyVec` from stillwater to guarantee at least one error exists.
/// Rendered with `Display` it lists every failing property on its own line;
/// serialized it becomes `{"errors": {path: message}, "message": ...}`.
#[derive(Debug, Clone)]
pub struct ConfigErrors(pub NonEmptyVec<ConfigError>);

impl ConfigErrors {
    /// Create from a single error.
    pub fn single(error: ConfigError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Create from a non-empty vec.
    pub fn from_nonempty(errors: NonEmptyVec<ConfigError>) -> Self {
        Self(errors)
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<ConfigError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &ConfigError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty (always false, but required for API consistency).
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    /// Get the error reported for a property path.
    pub fn get(&self, path: &str) -> Option<&ConfigError> {
        self.iter().find(|e| e.path() == path)
    }

    /// Paths of all failing properties, in report order.
    pub fn paths(&self) -> Vec<&str> {
        self.iter().map(ConfigError::path).collect()
    }

    /// Check whether every error is a descriptor-shape error.
    pub fn is_descriptor_error(&self) -> bool {
        self.iter().all(ConfigError::is_descriptor_error)
    }

    /// Map of property path to error message.
    ///
    /// If a path appears more than once (only possible after `combine`), the
    /// first message is kept.
    pub fn error_messages(&self) -> BTreeMap<String, String> {
        let mut messages = BTreeMap::new();
        for error in self.iter() {
            messages
                .entry(error.path().to_string())
                .or_insert_with(|| error.to_string());
        }
        messages
    }

    /// JSON form: the overall message plus a map of path to message.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.error_messages(),
            "message": self.to_string(),
        })
    }

    /// Prefix the path of every error.
    pub fn with_path_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self(self.0.map(|e| e.with_path_prefix(&prefix)))
    }
}

impl Semigroup for ConfigErrors {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HEADER)?;
        for error in self.iter() {
            write!(f, "\n\t{}: {}", error.path(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl Serialize for ConfigErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConfigErrors", 2)?;
        state.serialize_field("errors", &self.error_messages())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type with error accumulation, used while validating descriptors.
pub type ConfigValidation<T> = Validation<T, ConfigErrors>;

/// Turn a list of collected errors into a validation of `value`.
pub(crate) fn validation_from_errors<T>(value: T, errors: Vec<ConfigError>) -> ConfigValidation<T> {
    match ConfigErrors::from_vec(errors) {
        None => Validation::Success(value),
        Some(errors) => Validation::Failure(errors),
    }
}
