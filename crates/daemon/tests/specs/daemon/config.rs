//! Daemon configuration specs
//!
//! Verify kvsd refuses to start with unusable configuration.

use crate::prelude::*;

#[test]
fn malformed_config_file_is_rejected() {
    let ws = Workspace::empty();
    let config = ws.write_config("bind_addr = 5\n");

    ws.kvsd()
        .args(&[config.to_str().unwrap()])
        .fails()
        .stderr_has("invalid configuration");
}

#[test]
fn unknown_backend_is_rejected() {
    let ws = Workspace::empty();
    let config = ws.write_config("[backend]\nkind = \"cassandra\"\n");

    ws.kvsd()
        .args(&[config.to_str().unwrap()])
        .fails()
        .stderr_has("invalid configuration");
}

#[test]
fn missing_config_file_is_rejected() {
    let ws = Workspace::empty();

    ws.kvsd()
        .args(&["does-not-exist.toml"])
        .fails()
        .stderr_has("failed to read config");
}

#[test]
fn invalid_bind_address_override_is_rejected() {
    let ws = Workspace::empty();

    ws.kvsd()
        .env("KVS_BIND_ADDR", "nowhere")
        .fails()
        .stderr_has("invalid value for KVS_BIND_ADDR");
}
