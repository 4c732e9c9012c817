//! Convenient re-exports for common loadconf usage.
//!
//! # Quick Start
//!
//! ```
//! use loadconf::prelude::*;
//!
//! let map = ConfigMap::new()
//!     .property("database_url", "DATABASE_URL")
//!     .property("log_level", PropertyConfig::env("LOG_LEVEL").default_value("info"));
//!
//! let env = MockEnv::new().with_env("DATABASE_URL", "postgres://localhost/app");
//! let values = load_config_sync_with_env(&map, &env).unwrap();
//! assert_eq!(values.get_str("log_level"), Some("info"));
//! ```

// ============================================================================
// Stillwater re-exports
// ============================================================================

/// Result type with error accumulation.
pub use stillwater::Validation;

/// Combine two error collections into one.
pub use stillwater::Semigroup;

pub use stillwater::NonEmptyVec;

// ============================================================================
// Error types
// ============================================================================

pub use crate::error::ConfigError;

pub use crate::error::ConfigErrors;

pub use crate::error::ConfigValidation;

pub use crate::error::FileErrorKind;

pub use crate::error::SourceLocation;

// ============================================================================
// Descriptors
// ============================================================================

pub use crate::descriptor::PropertyConfig;

pub use crate::descriptor::PropertyType;

pub use crate::encoding::Encoding;

pub use crate::map::ConfigGroup;

pub use crate::map::ConfigMap;

// ============================================================================
// Loading
// ============================================================================

pub use crate::config::Config;

pub use crate::config::ConfigBuilder;

pub use crate::load::load_config_sync;

pub use crate::load::load_config_sync_with_env;

#[cfg(feature = "async")]
pub use crate::load::load_config;

#[cfg(feature = "async")]
pub use crate::load::load_config_with_env;

pub use crate::load::resolve_all_sync;

#[cfg(feature = "async")]
pub use crate::load::resolve_all;

pub use crate::load::LoadOutcome;

pub use crate::value::Value;

pub use crate::values::ConfigValues;

// ============================================================================
// Environment abstractions
// ============================================================================

pub use crate::env::ConfigEnv;

#[cfg(feature = "async")]
pub use crate::env::AsyncConfigEnv;

pub use crate::env::RealEnv;

pub use crate::env::MockEnv;
