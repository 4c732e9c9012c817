//! Property resolution: one descriptor in, one value or error out.
//!
//! Reading the source is the only part that differs between the blocking
//! and the async path. Both hand a [`RawRead`] to [`apply_rules`], which owns
//! the defaulting/required/format rules:
//!
//! | raw value | required | default | outcome                              |
//! |-----------|----------|---------|--------------------------------------|
//! | present   | any      | any     | raw, or `format(raw)` (errors kept)  |
//! | absent    | any      | yes     | default, never formatted             |
//! | absent    | false    | no      | `Null`                               |
//! | absent    | true     | no      | the read error                       |
//!
//! A default always wins over `required`.

use std::io;
use std::path::Path;

use crate::descriptor::{PropertyConfig, PropertySource, PropertyType};
#[cfg(feature = "async")]
use crate::env::AsyncConfigEnv;
use crate::env::ConfigEnv;
use crate::encoding::Encoding;
use crate::error::{ConfigError, FileErrorKind, SourceLocation};
use crate::value::{ConfigValue, Value};

/// Outcome of resolving one property.
pub type PropertyResult = Result<ConfigValue, ConfigError>;

/// What reading a property's source produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRead {
    /// The source yielded a string.
    Present { raw: String, source: SourceLocation },
    /// The source was absent or unreadable; defaults and `required` decide.
    Missing(ConfigError),
    /// The source exists but its content is unusable; always an error.
    Invalid(ConfigError),
}

/// Resolve one property through a blocking reader.
pub fn resolve_property_sync(
    path: &str,
    config: &PropertyConfig,
    env: &dyn ConfigEnv,
) -> PropertyResult {
    let raw = match config.source() {
        PropertySource::Environment { variable_name } => {
            read_variable(path, variable_name, env.get_env(variable_name))
        }
        PropertySource::File {
            file_path,
            encoding,
        } => read_file(path, file_path, *encoding, env.read_file(file_path)),
    };
    apply_rules(path, config, raw)
}

/// Resolve one property through a suspending reader.
#[cfg(feature = "async")]
pub async fn resolve_property<E: AsyncConfigEnv + ?Sized>(
    path: &str,
    config: &PropertyConfig,
    env: &E,
) -> PropertyResult {
    let raw = match config.source() {
        PropertySource::Environment { variable_name } => {
            read_variable(path, variable_name, env.get_env_async(variable_name).await)
        }
        PropertySource::File {
            file_path,
            encoding,
        } => read_file(
            path,
            file_path,
            *encoding,
            env.read_file_async(file_path).await,
        ),
    };
    apply_rules(path, config, raw)
}

fn read_variable(path: &str, variable_name: &str, value: Option<String>) -> RawRead {
    match value {
        Some(raw) => RawRead::Present {
            raw,
            source: SourceLocation::env(variable_name),
        },
        None => RawRead::Missing(ConfigError::NotDefined {
            path: path.to_string(),
            variable_name: variable_name.to_string(),
        }),
    }
}

fn read_file(path: &str, file_path: &Path, encoding: Encoding, bytes: io::Result<Vec<u8>>) -> RawRead {
    let display = file_path.display().to_string();
    let file_error = |kind| ConfigError::File {
        path: path.to_string(),
        file_path: display.clone(),
        kind,
    };

    match bytes {
        Err(e) => RawRead::Missing(file_error(FileErrorKind::from_io(&e))),
        Ok(bytes) => match encoding.decode(&bytes) {
            Ok(raw) => RawRead::Present {
                raw,
                source: SourceLocation::file(&display),
            },
            Err(message) => RawRead::Invalid(file_error(FileErrorKind::Decode { encoding, message })),
        },
    }
}

/// Apply the rule table and type coercion to a raw read.
pub fn apply_rules(path: &str, config: &PropertyConfig, raw: RawRead) -> PropertyResult {
    match raw {
        RawRead::Present { raw, source } => {
            let value = match config.formatter() {
                None => Value::String(raw),
                Some(format) => format(&raw).map_err(|e| ConfigError::Format {
                    path: path.to_string(),
                    message: e.to_string(),
                })?,
            };
            let value = coerce(path, config.get_kind(), value)?;
            Ok(ConfigValue::new(value, source))
        }
        RawRead::Invalid(error) => Err(error),
        RawRead::Missing(error) => match (config.get_default(), config.is_required()) {
            (Some(default), _) => Ok(ConfigValue::new(
                default.clone(),
                SourceLocation::default_value(),
            )),
            (None, false) => Ok(ConfigValue::unset()),
            (None, true) => Err(error),
        },
    }
}

/// Coerce a source value that is still a string; anything else passes.
fn coerce(path: &str, kind: PropertyType, value: Value) -> Result<Value, ConfigError> {
    match (kind, value) {
        (PropertyType::String, value) => Ok(value),
        (kind, Value::String(raw)) => match kind.coerce(&raw) {
            Some(coerced) => Ok(coerced),
            None => Err(ConfigError::Coercion {
                path: path.to_string(),
                expected: kind,
                actual_value: raw,
            }),
        },
        (_, value) => Ok(value),
    }
}
