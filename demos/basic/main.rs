//! Basic loadconf example.
//!
//! This example demonstrates the common use case:
//! - Plain settings from environment variables, with defaults
//! - A secret read from a mounted file
//! - Every failing property reported at once
//!
//! Run with: cargo run --example basic
//! Or with overrides: APP_PORT=9000 DB_PASSWORD_FILE=./password RUST_LOG=debug cargo run --example basic

use loadconf::prelude::*;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct AppConfig {
    host: String,
    port: i64,
    debug: bool,
    database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    url: String,
    password: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let password_file =
        std::env::var("DB_PASSWORD_FILE").unwrap_or_else(|_| "/run/secrets/db_password".to_string());

    let result = Config::<AppConfig>::builder()
        .property("host", PropertyConfig::env("APP_HOST").default_value("localhost"))
        .property(
            "port",
            PropertyConfig::env("APP_PORT")
                .default_value(8080)
                .format(|raw| raw.parse::<u16>().map_err(|_| "APP_PORT must be a port number")),
        )
        .property(
            "debug",
            PropertyConfig::env("APP_DEBUG")
                .kind(PropertyType::Boolean)
                .default_value(false),
        )
        .group(
            "database",
            ConfigGroup::new()
                .property("url", "DATABASE_URL")
                .property(
                    "password",
                    PropertyConfig::file(password_file)
                        .optional()
                        .format(|raw| Ok::<_, &str>(raw.trim_end().to_string())),
                ),
        )
        .build_async()
        .await;

    match result {
        Ok(config) => {
            println!("Configuration loaded successfully!");
            println!("  Host: {}", config.host);
            println!("  Port: {}", config.port);
            println!("  Debug: {}", config.debug);
            println!("  Database: {}", config.database.url);
            println!(
                "  Password: {}",
                if config.database.password.is_some() { "(set)" } else { "(none)" }
            );
        }
        Err(errors) => {
            // Every failing property is listed, not just the first
            eprintln!("{}", errors);
            std::process::exit(1);
        }
    }
}
