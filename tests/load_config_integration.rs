//! Integration tests for loading configuration end to end.
//!
//! These cover both entry points over mock, real-filesystem and
//! real-environment sources, the JSON descriptor boundary, and concurrent
//! resolution in async mode.

use std::io::Write;
#[cfg(feature = "async")]
use std::path::Path;
#[cfg(feature = "async")]
use std::time::Duration;

use loadconf::prelude::*;
use serde::Deserialize;
use serde_json::json;
#[cfg(feature = "async")]
use tokio::sync::Barrier;

fn greeting_map() -> ConfigMap {
    ConfigMap::new().property("greeting", PropertyConfig::env("GREETING").default_value("hi"))
}

#[test]
fn test_empty_map_sync() {
    let values = load_config_sync_with_env(&ConfigMap::new(), &MockEnv::new()).unwrap();
    assert!(values.is_empty());
    assert_eq!(values.to_json(), json!({}));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_empty_map_async() {
    let values = load_config_with_env(&ConfigMap::new(), &MockEnv::new())
        .await
        .unwrap();
    assert_eq!(values.to_json(), json!({}));
}

#[test]
fn test_default_used_when_unset() {
    let values = load_config_sync_with_env(&greeting_map(), &MockEnv::new()).unwrap();
    assert_eq!(values.to_json(), json!({"greeting": "hi"}));
}

#[test]
fn test_set_variable_overrides_default() {
    let env = MockEnv::new().with_env("GREETING", "hello");
    let values = load_config_sync_with_env(&greeting_map(), &env).unwrap();
    assert_eq!(values.to_json(), json!({"greeting": "hello"}));
}

#[test]
fn test_missing_required_file() {
    let map = ConfigMap::new().property("secret", PropertyConfig::file("/missing/path"));

    let errors = load_config_sync_with_env(&map, &MockEnv::new()).unwrap_err();
    assert_eq!(errors.len(), 1);

    let messages = errors.error_messages();
    assert_eq!(
        messages.get("secret").map(String::as_str),
        Some("no such file or directory, open '/missing/path'")
    );
}

#[test]
fn test_failing_formatter_reports_its_message() {
    let env = MockEnv::new().with_env("PORT", "abc");
    let map = ConfigMap::new().property(
        "port",
        PropertyConfig::env("PORT").format(|raw| raw.parse::<u16>().map_err(|_| "bad")),
    );

    let errors = load_config_sync_with_env(&map, &env).unwrap_err();
    assert_eq!(errors.error_messages().get("port").map(String::as_str), Some("bad"));
    assert_eq!(
        errors.to_string(),
        "Configuration could not be loaded for the following properties:\n\tport: bad"
    );
}

#[test]
fn test_one_missing_one_present() {
    let env = MockEnv::new().with_env("PRESENT", "here");
    let map = ConfigMap::new()
        .property("present", "PRESENT")
        .property("missing", "MISSING");

    let errors = load_config_sync_with_env(&map, &env).unwrap_err();
    assert_eq!(errors.paths(), vec!["missing"]);
    assert_eq!(errors.first().to_string(), "MISSING is not defined.");

    let json = errors.to_json();
    assert_eq!(json["errors"], json!({"missing": "MISSING is not defined."}));
}

#[test]
fn test_partial_values_available_from_outcome() {
    let env = MockEnv::new().with_env("PRESENT", "here");
    let map = ConfigMap::new()
        .property("present", "PRESENT")
        .property("missing", "MISSING");

    let outcome = resolve_all_sync(&map, &env).unwrap();
    assert_eq!(outcome.values().get_str("present"), Some("here"));
    assert_eq!(outcome.errors().len(), 1);
}

#[test]
fn test_json_descriptor_with_both_sources_fails_before_reads() {
    let json = json!({
        "secret": {"variableName": "SECRET", "filePath": "/run/secrets/secret"}
    });

    let errors = ConfigMap::from_json(&json).unwrap_err();
    assert!(errors.is_descriptor_error());
    assert_eq!(errors.paths(), vec!["secret"]);
}

#[test]
fn test_json_descriptors_load_like_typed_ones() {
    let json = json!({
        "greeting": "GREETING",
        "port": {"variableName": "PORT", "defaultValue": 8080, "type": "integer"},
        "database": {
            "password": {"filePath": "/run/secrets/db", "required": false}
        }
    });
    let env = MockEnv::new()
        .with_env("GREETING", "hello")
        .with_env("PORT", " 9000 ");

    let map = ConfigMap::from_json(&json).unwrap();
    let values = load_config_sync_with_env(&map, &env).unwrap();

    assert_eq!(
        values.to_json(),
        json!({
            "greeting": "hello",
            "port": 9000,
            "database": {"password": null}
        })
    );
}

#[test]
fn test_real_files_with_encodings() {
    let dir = tempfile::tempdir().unwrap();

    let text_path = dir.path().join("password");
    std::fs::write(&text_path, "hunter2").unwrap();

    let mut key_file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
    key_file.write_all(&[0xca, 0xfe]).unwrap();

    let map = ConfigMap::new()
        .property("password", PropertyConfig::file(&text_path))
        .property(
            "key",
            PropertyConfig::file_with_encoding(key_file.path(), Encoding::Base64),
        )
        .property(
            "absent",
            PropertyConfig::file(dir.path().join("absent")).optional(),
        );

    let values = load_config_sync(&map).unwrap();
    assert_eq!(values.get_str("password"), Some("hunter2"));
    assert_eq!(values.get_str("key"), Some("yv4="));
    assert!(values.get_value("absent").map_or(false, Value::is_null));

    let source = values.get("password").map(|v| v.source.to_string());
    assert_eq!(source, Some(text_path.display().to_string()));
}

#[test]
fn test_real_environment_variables() {
    std::env::set_var("LOADCONF_IT_SYNC_HOST", "db.internal");
    std::env::remove_var("LOADCONF_IT_SYNC_MISSING");

    let map = ConfigMap::new()
        .property("host", "LOADCONF_IT_SYNC_HOST")
        .property("missing", "LOADCONF_IT_SYNC_MISSING");

    let errors = load_config_sync(&map).unwrap_err();
    assert_eq!(errors.paths(), vec!["missing"]);

    std::env::set_var("LOADCONF_IT_SYNC_MISSING", "now set");
    let values = load_config_sync(&map).unwrap();
    assert_eq!(values.get_str("host"), Some("db.internal"));
    assert_eq!(values.get_str("missing"), Some("now set"));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_real_sources_async() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    std::fs::write(&path, "t0k3n").unwrap();
    std::env::set_var("LOADCONF_IT_ASYNC_REGION", "eu-west-1");

    let map = ConfigMap::new()
        .property("region", "LOADCONF_IT_ASYNC_REGION")
        .property("token", PropertyConfig::file(&path));

    let values = load_config(&map).await.unwrap();
    assert_eq!(values.get_str("region"), Some("eu-west-1"));
    assert_eq!(values.get_str("token"), Some("t0k3n"));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_accumulates_like_sync() {
    let env = MockEnv::new()
        .with_env("PORT", "abc")
        .with_unreadable_file("/run/secrets/root");
    let map = ConfigMap::new()
        .property("port", PropertyConfig::env("PORT").kind(PropertyType::Integer))
        .property("root", PropertyConfig::file("/run/secrets/root"))
        .property("greeting", PropertyConfig::env("GREETING").default_value("hi"));

    let sync_errors = load_config_sync_with_env(&map, &env).unwrap_err();
    let async_errors = load_config_with_env(&map, &env).await.unwrap_err();

    assert_eq!(sync_errors.to_string(), async_errors.to_string());
    assert_eq!(async_errors.paths(), vec!["port", "root"]);
}

/// Source reader whose every lookup waits until all lookups have started.
#[cfg(feature = "async")]
struct GatedEnv {
    barrier: Barrier,
    inner: MockEnv,
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncConfigEnv for GatedEnv {
    async fn read_file_async(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.barrier.wait().await;
        self.inner.read_file_async(path).await
    }

    async fn get_env_async(&self, name: &str) -> Option<String> {
        self.barrier.wait().await;
        self.inner.get_env_async(name).await
    }
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_reads_overlap() {
    let env = GatedEnv {
        barrier: Barrier::new(3),
        inner: MockEnv::new()
            .with_env("A", "1")
            .with_env("B", "2")
            .with_file("/c", "3"),
    };
    let map = ConfigMap::new()
        .property("a", "A")
        .property("b", "B")
        .property("c", PropertyConfig::file("/c"));

    // Serial resolution would wait on the barrier forever.
    let values = tokio::time::timeout(Duration::from_secs(5), load_config_with_env(&map, &env))
        .await
        .expect("reads did not overlap")
        .unwrap();

    assert_eq!(values.len(), 3);
    assert_eq!(values.get_str("c"), Some("3"));
}

#[derive(Debug, Deserialize)]
struct ServiceConfig {
    port: i64,
    debug: bool,
    database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    url: String,
    password: Option<String>,
}

fn service_builder() -> ConfigBuilder<ServiceConfig> {
    Config::<ServiceConfig>::builder()
        .property(
            "port",
            PropertyConfig::env("SERVICE_PORT")
                .kind(PropertyType::Integer)
                .default_value(8080),
        )
        .property(
            "debug",
            PropertyConfig::env("SERVICE_DEBUG")
                .kind(PropertyType::Boolean)
                .default_value(false),
        )
        .group(
            "database",
            ConfigGroup::new()
                .property("url", "DATABASE_URL")
                .property("password", PropertyConfig::file("/run/secrets/db").optional()),
        )
}

#[cfg(unix)]
#[test]
fn test_non_unicode_environment_variable_is_read() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    std::env::set_var("LOADCONF_IT_NON_UNICODE", OsStr::from_bytes(&[0x66, 0xff, 0x6f]));
    std::env::remove_var("LOADCONF_IT_NON_UNICODE_UNSET");

    let map = ConfigMap::new()
        .property("required", "LOADCONF_IT_NON_UNICODE")
        .property(
            "defaulted",
            PropertyConfig::env("LOADCONF_IT_NON_UNICODE").default_value("fallback"),
        )
        .property(
            "unset",
            PropertyConfig::env("LOADCONF_IT_NON_UNICODE_UNSET").default_value("fallback"),
        );

    let values = load_config_sync(&map).unwrap();
    assert_eq!(values.get_str("required"), Some("f\u{FFFD}o"));
    assert_eq!(values.get_str("defaulted"), Some("f\u{FFFD}o"));
    assert_eq!(values.get_str("unset"), Some("fallback"));
}

#[test]
fn test_typed_config() {
    let env = MockEnv::new()
        .with_env("SERVICE_DEBUG", "yes")
        .with_env("DATABASE_URL", "postgres://localhost/app");

    let config = service_builder().build_with_env(&env).unwrap();
    assert_eq!(config.port, 8080);
    assert!(config.debug);
    assert_eq!(config.database.url, "postgres://localhost/app");
    assert_eq!(config.database.password, None);
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_typed_config_async_reports_every_failure() {
    let env = MockEnv::new().with_env("SERVICE_PORT", "eighty");

    let errors = service_builder()
        .build_async_with_env(&env)
        .await
        .unwrap_err();
    assert_eq!(errors.paths(), vec!["database.url", "port"]);
}
