//! Performance benchmarks for property resolution.
//!
//! Compares serial resolution with the concurrent engine over the same map,
//! plus the typed front door on top of the sync engine.

use criterion::{criterion_group, criterion_main, Criterion};
use loadconf::prelude::*;
use serde::Deserialize;
use std::hint::black_box;

const PROPERTY_COUNT: usize = 32;

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct ServiceConfig {
    port: i64,
    debug: bool,
    database: DatabaseConfig,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    url: String,
    password: String,
    pool_size: i64,
}

fn create_test_env() -> MockEnv {
    let env = MockEnv::new()
        .with_env("SERVICE_PORT", "8080")
        .with_env("DATABASE_URL", "postgres://localhost/app")
        .with_file("/run/secrets/db_password", "hunter2");

    for i in 0..PROPERTY_COUNT {
        if i % 2 == 0 {
            env.set_env(format!("VAR_{}", i), format!("value-{}", i));
        } else {
            env.set_file(format!("/run/secrets/file_{}", i), format!("secret-{}", i));
        }
    }
    env
}

fn wide_map() -> ConfigMap {
    (0..PROPERTY_COUNT).fold(ConfigMap::new(), |map, i| {
        let config = if i % 2 == 0 {
            PropertyConfig::env(format!("VAR_{}", i))
        } else {
            PropertyConfig::file(format!("/run/secrets/file_{}", i))
        };
        map.property(format!("property_{}", i), config)
    })
}

fn service_builder() -> ConfigBuilder<ServiceConfig> {
    Config::<ServiceConfig>::builder()
        .property(
            "port",
            PropertyConfig::env("SERVICE_PORT").kind(PropertyType::Integer),
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
                .property("password", PropertyConfig::file("/run/secrets/db_password"))
                .property(
                    "pool_size",
                    PropertyConfig::env("DATABASE_POOL_SIZE").default_value(4),
                ),
        )
}

fn bench_resolution_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution_modes");

    let env = create_test_env();
    let map = wide_map();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    group.bench_function("sync", |b| {
        b.iter(|| {
            let values = load_config_sync_with_env(black_box(&map), black_box(&env));
            black_box(values.unwrap())
        })
    });

    group.bench_function("async", |b| {
        b.iter(|| {
            let values = runtime.block_on(load_config_with_env(black_box(&map), black_box(&env)));
            black_box(values.unwrap())
        })
    });

    group.finish();
}

fn bench_typed_config(c: &mut Criterion) {
    let env = create_test_env();

    c.bench_function("typed_config", |b| {
        b.iter(|| {
            let config = service_builder().build_with_env(black_box(&env));
            black_box(config.unwrap())
        })
    });
}

fn bench_failure_accumulation(c: &mut Criterion) {
    let env = MockEnv::new();
    let map = wide_map();

    c.bench_function("failure_accumulation", |b| {
        b.iter(|| {
            let errors = load_config_sync_with_env(black_box(&map), black_box(&env));
            black_box(errors.unwrap_err())
        })
    });
}

criterion_group!(
    benches,
    bench_resolution_modes,
    bench_typed_config,
    bench_failure_accumulation
);
criterion_main!(benches);
