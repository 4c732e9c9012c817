// Allow large error types - detailed config errors are expected
#![allow(clippy::result_large_err)]

//! Loadconf: declarative configuration from environment variables and files.
//!
//! Describe every property once, with its source, default, required flag and
//! optional formatter. Loadconf reads all of them, applies the rules, and
//! either hands back every value or reports every failure in one error.
//!
//! # Core Concepts
//!
//! - **Descriptors**: a [`PropertyConfig`] names one environment variable or
//!   one file, plus the rules for that property
//! - **Error Accumulation**: one [`ConfigErrors`] lists every property that
//!   failed, keyed by its path
//! - **Two Modes**: [`load_config_sync`] reads sources one after another;
//!   [`load_config`] starts all reads at once. Both apply the same rules
//! - **Testable I/O**: dependency injection via [`ConfigEnv`] and [`MockEnv`]
//!
//! # Quick Start
//!
//! ```
//! use loadconf::prelude::*;
//!
//! let env = MockEnv::new()
//!     .with_env("GREETING", "hello")
//!     .with_file("/run/secrets/api_key", "s3cr3t\n");
//!
//! let map = ConfigMap::new()
//!     .property("greeting", "GREETING")
//!     .property("port", PropertyConfig::env("PORT").default_value(8080))
//!     .property(
//!         "api_key",
//!         PropertyConfig::file("/run/secrets/api_key").format(|raw| Ok::<_, &str>(raw.trim().to_string())),
//!     );
//!
//! let values = load_config_sync_with_env(&map, &env).unwrap();
//! assert_eq!(values.get_str("api_key"), Some("s3cr3t"));
//! ```
//!
//! # The Rule Table
//!
//! | source value | required | default | result                         |
//! |--------------|----------|---------|--------------------------------|
//! | present      | any      | any     | raw, or the formatter's output |
//! | absent       | any      | yes     | the default, unformatted       |
//! | absent       | no       | no      | `Value::Null`                  |
//! | absent       | yes      | no      | error for that path            |
//!
//! A formatter error always fails its property.
//!
//! # Error Reporting
//!
//! ```text
//! Configuration could not be loaded for the following properties:
//!     database.url: DATABASE_URL is not defined.
//!     password: no such file or directory, open '/run/secrets/db_password'
//! ```
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`descriptor`]: `PropertyConfig`, sources and coercion types
//! - [`map`]: `ConfigMap` and `ConfigGroup`, plus JSON descriptor parsing
//! - [`resolve`]: the per-property rule table
//! - [`load`]: the sync and async engines
//! - [`config`]: `Config` and `ConfigBuilder` for typed loading
//! - [`error`]: Error types (`ConfigError`, `ConfigErrors`, `ConfigValidation`)
//! - [`value`]: `Value` enum for resolved values
//! - [`values`]: `ConfigValues`, the resolved configuration object
//! - [`encoding`]: file content decoding
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//!
//! # Stillwater Integration
//!
//! | Type | Usage |
//! |------|-------|
//! | `Validation<T, E>` | Accumulating descriptor errors |
//! | `NonEmptyVec<T>` | Guaranteed non-empty error lists |
//! | `Semigroup` | Combining errors from several loads |

pub mod config;
pub mod descriptor;
pub mod encoding;
pub mod env;
pub mod error;
pub mod load;
pub mod map;
pub mod prelude;
pub mod resolve;
pub mod value;
pub mod values;

// Re-exports for convenience
pub use config::{deserialize_config, Config, ConfigBuilder};
pub use descriptor::{BoxError, Formatter, PropertyConfig, PropertySource, PropertyType};
pub use encoding::Encoding;
#[cfg(feature = "async")]
pub use env::AsyncConfigEnv;
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use error::{ConfigError, ConfigErrors, ConfigValidation, FileErrorKind, SourceLocation};
#[cfg(feature = "async")]
pub use load::{load_config, load_config_with_env, resolve_all};
pub use load::{load_config_sync, load_config_sync_with_env, resolve_all_sync, LoadOutcome};
pub use map::{ConfigEntry, ConfigGroup, ConfigMap};
pub use value::{ConfigValue, Value};
pub use values::ConfigValues;

// Re-export stillwater types that are commonly used
pub use stillwater::{NonEmptyVec, Semigroup, Validation};
