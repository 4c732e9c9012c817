//! The resolution engine.
//!
//! Both entry points validate the whole map before any read, resolve every
//! leaf (serially, or concurrently through `join_all`), and fold the results
//! into a [`LoadOutcome`]. A failed property never stops the others.

use tracing::{debug, trace};

#[cfg(feature = "async")]
use crate::env::AsyncConfigEnv;
use crate::env::{ConfigEnv, RealEnv};
use crate::error::{ConfigError, ConfigErrors};
use crate::map::ConfigMap;
#[cfg(feature = "async")]
use crate::resolve::resolve_property;
use crate::resolve::{resolve_property_sync, PropertyResult};
use crate::values::ConfigValues;

/// Every property's outcome from one resolution pass.
///
/// `values` holds the properties that resolved; `errors` holds the rest.
/// Each path lands in exactly one of the two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    values: ConfigValues,
    errors: Vec<ConfigError>,
}

impl LoadOutcome {
    /// The properties that resolved.
    pub fn values(&self) -> &ConfigValues {
        &self.values
    }

    /// The properties that failed, in path order.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Whether every property resolved.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Split into the resolved values and the composite error, if any.
    pub fn into_parts(self) -> (ConfigValues, Option<ConfigErrors>) {
        (self.values, ConfigErrors::from_vec(self.errors))
    }

    /// All values, or one composite error naming every failed property.
    pub fn into_result(self) -> Result<ConfigValues, ConfigErrors> {
        match self.into_parts() {
            (values, None) => Ok(values),
            (_, Some(errors)) => Err(errors),
        }
    }

    fn collect(mode: &'static str, results: Vec<(String, PropertyResult)>) -> Self {
        let mut outcome = Self::default();

        for (path, result) in results {
            match result {
                Ok(value) => {
                    trace!(mode, path = %path, source = %value.source, "property resolved");
                    outcome.values.insert(path, value);
                }
                Err(error) => {
                    debug!(mode, path = %path, error = %error, "property failed");
                    outcome.errors.push(error);
                }
            }
        }

        debug!(
            mode,
            resolved = outcome.values.len(),
            failed = outcome.errors.len(),
            "configuration resolved"
        );
        outcome
    }
}

/// Resolve every property in `map` with a blocking reader.
///
/// Returns `Err` only for descriptor errors, which are reported before any
/// source is read. Property failures are collected in the outcome.
pub fn resolve_all_sync(map: &ConfigMap, env: &dyn ConfigEnv) -> Result<LoadOutcome, ConfigErrors> {
    let leaves = map.validate()?;
    debug!(mode = "sync", properties = leaves.len(), "resolving configuration");

    let results = leaves
        .into_iter()
        .map(|(path, config)| {
            let result = resolve_property_sync(&path, config, env);
            (path, result)
        })
        .collect();

    Ok(LoadOutcome::collect("sync", results))
}

/// Load configuration from the process environment and filesystem, blocking.
///
/// # Example
///
/// ```no_run
/// use loadconf::{load_config_sync, ConfigMap, PropertyConfig};
///
/// let map = ConfigMap::new()
///     .property("port", PropertyConfig::env("PORT").default_value(8080))
///     .property("api_key", PropertyConfig::file("/run/secrets/api_key"));
///
/// match load_config_sync(&map) {
///     Ok(values) => println!("{}", values.to_json()),
///     Err(errors) => eprintln!("{}", errors),
/// }
/// ```
pub fn load_config_sync(map: &ConfigMap) -> Result<ConfigValues, ConfigErrors> {
    load_config_sync_with_env(map, &RealEnv)
}

/// Load configuration through the given blocking reader.
pub fn load_config_sync_with_env(
    map: &ConfigMap,
    env: &dyn ConfigEnv,
) -> Result<ConfigValues, ConfigErrors> {
    resolve_all_sync(map, env)?.into_result()
}

/// Resolve every property in `map` concurrently.
///
/// All reads are started before any is awaited; the outcome is identical to
/// [`resolve_all_sync`] for the same sources.
#[cfg(feature = "async")]
pub async fn resolve_all<E: AsyncConfigEnv + ?Sized>(
    map: &ConfigMap,
    env: &E,
) -> Result<LoadOutcome, ConfigErrors> {
    let leaves = map.validate()?;
    debug!(mode = "async", properties = leaves.len(), "resolving configuration");

    let pending = leaves
        .iter()
        .map(|(path, config)| resolve_property(path, config, env));
    let resolved = futures::future::join_all(pending).await;

    let results = leaves
        .into_iter()
        .map(|(path, _)| path)
        .zip(resolved)
        .collect();

    Ok(LoadOutcome::collect("async", results))
}

/// Load configuration from the process environment and filesystem.
///
/// # Example
///
/// ```no_run
/// use loadconf::{load_config, ConfigMap, PropertyConfig};
///
/// # async fn run() {
/// let map = ConfigMap::new()
///     .property("database_url", "DATABASE_URL")
///     .property("password", PropertyConfig::file("/run/secrets/db_password"));
///
/// let values = load_config(&map).await.unwrap();
/// # }
/// ```
#[cfg(feature = "async")]
pub async fn load_config(map: &ConfigMap) -> Result<ConfigValues, ConfigErrors> {
    load_config_with_env(map, &RealEnv).await
}

/// Load configuration concurrently through the given reader.
#[cfg(feature = "async")]
pub async fn load_config_with_env<E: AsyncConfigEnv + ?Sized>(
    map: &ConfigMap,
    env: &E,
) -> Result<ConfigValues, ConfigErrors> {
    resolve_all(map, env).await?.into_result()
}
