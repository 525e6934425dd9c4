// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use yare::parameterized;

fn parse(content: &str) -> Result<Config, ConfigError> {
    Config::parse(Path::new("kvsd.toml"), content)
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn empty_file_uses_defaults() {
    let config = parse("").unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.bind_addr.to_string(), "127.0.0.1:4000");
    assert_eq!(config.queue_capacity, 16);
    assert!(config.log_path.is_none());
}

#[test]
fn default_log_ends_in_transactions_log() {
    let Backend::File { path } = Config::default().backend else {
        panic!("default backend should be a file");
    };
    assert!(path.ends_with("transactions.log"));
}

#[test]
fn file_backend_parses() {
    let config = parse(
        r#"
        bind_addr = "0.0.0.0:8080"
        log_path = "/var/log/kvsd.log"
        queue_capacity = 64

        [backend]
        kind = "file"
        path = "/var/lib/kvs/transactions.log"
        "#,
    )
    .unwrap();

    assert_eq!(config.bind_addr.port(), 8080);
    assert_eq!(config.log_path, Some(PathBuf::from("/var/log/kvsd.log")));
    assert_eq!(config.queue_capacity, 64);
    assert_eq!(
        config.backend,
        Backend::File {
            path: PathBuf::from("/var/lib/kvs/transactions.log")
        }
    );
}

#[test]
fn postgres_backend_defaults_port() {
    let config = parse(
        r#"
        [backend]
        kind = "postgres"
        host = "db.internal"
        database = "kvs"
        user = "kvs"
        password = "hunter2"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.backend,
        Backend::Postgres {
            host: "db.internal".to_string(),
            database: "kvs".to_string(),
            user: "kvs".to_string(),
            password: "hunter2".to_string(),
            port: 5432,
        }
    );
}

#[parameterized(
    unknown_field = { "listen = \"127.0.0.1:1\"" },
    bad_address = { "bind_addr = \"not an address\"" },
    unknown_backend = { "[backend]\nkind = \"redis\"" },
    missing_path = { "[backend]\nkind = \"file\"" },
    not_toml = { "this is = = not toml" },
)]
fn malformed_config_is_rejected(content: &str) {
    let err = parse(content).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {}", err);
    assert!(err.to_string().contains("invalid configuration"));
}

#[test]
fn zero_queue_capacity_is_rejected() {
    let err = parse("queue_capacity = 0").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidSetting {
            name: "queue_capacity",
            ..
        }
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let err = Config::from_file(Path::new("/nonexistent/kvsd.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn environment_overrides_file() {
    let mut config = parse("[backend]\nkind = \"postgres\"\nhost = \"h\"\ndatabase = \"d\"\nuser = \"u\"\npassword = \"p\"").unwrap();

    config
        .apply_overrides(env(&[
            (ENV_BIND_ADDR, "127.0.0.1:9999"),
            (ENV_TRANSACTION_LOG, "/tmp/kvs.log"),
            (ENV_LOG_PATH, "/tmp/kvsd.log"),
        ]))
        .unwrap();

    assert_eq!(config.bind_addr.port(), 9999);
    assert_eq!(
        config.backend,
        Backend::File {
            path: PathBuf::from("/tmp/kvs.log")
        }
    );
    assert_eq!(config.log_path, Some(PathBuf::from("/tmp/kvsd.log")));
}

#[test]
fn no_overrides_leaves_config_alone() {
    let mut config = Config::default();
    config.apply_overrides(env(&[])).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn empty_log_path_override_means_stderr() {
    let mut config = parse("log_path = \"/tmp/kvsd.log\"").unwrap();
    config.apply_overrides(env(&[(ENV_LOG_PATH, "")])).unwrap();
    assert!(config.log_path.is_none());
}

#[parameterized(
    bad_bind = { ENV_BIND_ADDR, "localhost" },
    empty_log = { ENV_TRANSACTION_LOG, "" },
)]
fn invalid_override_is_rejected(name: &str, value: &str) {
    let mut config = Config::default();
    let err = config.apply_overrides(env(&[(name, value)])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { .. }), "got: {}", err);
}
