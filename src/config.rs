//! Core Config type and ConfigBuilder.
//!
//! The builder collects property descriptors, resolves them with the engine
//! and deserializes the resolved values into `T`.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

#[cfg(feature = "async")]
use crate::env::AsyncConfigEnv;
use crate::env::{ConfigEnv, RealEnv};
use crate::error::{ConfigError, ConfigErrors};
use crate::load::load_config_sync_with_env;
#[cfg(feature = "async")]
use crate::load::load_config_with_env;
use crate::map::{ConfigGroup, ConfigMap, ROOT_PATH};
use crate::descriptor::PropertyConfig;
use crate::values::ConfigValues;

/// Wrapper around a loaded configuration value.
///
/// It implements `Deref` to provide transparent access to the inner type.
#[derive(Debug, Clone)]
pub struct Config<T> {
    inner: T,
}

impl<T> Config<T> {
    /// Create a new Config wrapping an already-loaded value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Get a reference to the inner configuration value.
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Consume this Config and return the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Create a builder for this configuration type.
    pub fn builder() -> ConfigBuilder<T> {
        ConfigBuilder::new()
    }
}

impl<T> std::ops::Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> AsRef<T> for Config<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

/// Builder for loading typed configuration.
///
/// # Example
///
/// ```
/// use loadconf::{Config, ConfigGroup, MockEnv, PropertyConfig};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Database {
///     url: String,
///     pool_size: i64,
/// }
///
/// #[derive(Deserialize)]
/// struct AppConfig {
///     port: i64,
///     database: Database,
/// }
///
/// let env = MockEnv::new().with_env("DATABASE_URL", "postgres://localhost/app");
///
/// let config = Config::<AppConfig>::builder()
///     .property("port", PropertyConfig::env("PORT").default_value(8080))
///     .group(
///         "database",
///         ConfigGroup::new()
///             .property("url", "DATABASE_URL")
///             .property("pool_size", PropertyConfig::env("POOL_SIZE").default_value(4)),
///     )
///     .build_with_env(&env)
///     .unwrap();
///
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.database.pool_size, 4);
/// ```
pub struct ConfigBuilder<T> {
    map: ConfigMap,
    _marker: PhantomData<T>,
}

impl<T> Default for ConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConfigBuilder<T> {
    /// Create a new empty config builder.
    pub fn new() -> Self {
        Self {
            map: ConfigMap::new(),
            _marker: PhantomData,
        }
    }

    /// Add a top-level property.
    pub fn property(mut self, name: impl Into<String>, config: impl Into<PropertyConfig>) -> Self {
        self.map = self.map.property(name, config);
        self
    }

    /// Add a group of properties, deserialized as a nested struct.
    pub fn group(mut self, name: impl Into<String>, group: ConfigGroup) -> Self {
        self.map = self.map.group(name, group);
        self
    }

    /// Replace the builder's map with a prepared one.
    pub fn config_map(mut self, map: ConfigMap) -> Self {
        self.map = map;
        self
    }

    /// Build the configuration using the real environment.
    pub fn build(self) -> Result<Config<T>, ConfigErrors>
    where
        T: DeserializeOwned,
    {
        self.build_with_env(&RealEnv::new())
    }

    /// Build the configuration with a custom environment.
    ///
    /// This enables dependency injection for testing.
    pub fn build_with_env(self, env: &dyn ConfigEnv) -> Result<Config<T>, ConfigErrors>
    where
        T: DeserializeOwned,
    {
        let values = load_config_sync_with_env(&self.map, env)?;
        deserialize_config(&values).map(Config::new)
    }

    /// Build the configuration, reading every source concurrently.
    #[cfg(feature = "async")]
    pub async fn build_async(self) -> Result<Config<T>, ConfigErrors>
    where
        T: DeserializeOwned,
    {
        self.build_async_with_env(&RealEnv::new()).await
    }

    /// Build the configuration concurrently with a custom environment.
    #[cfg(feature = "async")]
    pub async fn build_async_with_env<E: AsyncConfigEnv + ?Sized>(
        self,
        env: &E,
    ) -> Result<Config<T>, ConfigErrors>
    where
        T: DeserializeOwned,
    {
        let values = load_config_with_env(&self.map, env).await?;
        deserialize_config(&values).map(Config::new)
    }
}

/// Deserialize resolved values into the target type.
pub fn deserialize_config<T: DeserializeOwned>(values: &ConfigValues) -> Result<T, ConfigErrors> {
    let json_value = values.to_json();

    serde_json::from_value(json_value).map_err(|e| {
        let message = e.to_string();

        // "missing field `name`" names the property the map lacks, but not
        // the struct it belongs to, so it is only a path when nothing is grouped
        if message.contains("missing field") {
            if let Some(start) = message.find('`') {
                if let Some(end) = message[start + 1..].find('`') {
                    let field = &message[start + 1..start + 1 + end];
                    let flat = values.paths().all(|path| !path.contains('.'));
                    return ConfigErrors::single(ConfigError::Deserialize {
                        path: if flat { field } else { ROOT_PATH }.to_string(),
                        message: format!("no property named \"{}\" was configured", field),
                    });
                }
            }
        }

        ConfigErrors::single(ConfigError::Deserialize {
            path: ROOT_PATH.to_string(),
            message: format!("{} ({})", message, std::any::type_name::<T>()),
        })
    })
}
