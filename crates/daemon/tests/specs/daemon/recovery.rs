//! Startup recovery specs
//!
//! Verify kvsd never serves a store rebuilt from a damaged log.

use crate::prelude::*;

#[test]
fn out_of_order_log_prevents_startup() {
    let ws = Workspace::with_log("1\t2\ta\t1\n3\t2\tb\t2\n2\t2\tc\t3\n");

    ws.kvsd()
        .fails()
        .stderr_has("replay failed")
        .stderr_has("out of sequence");
}

#[test]
fn unparseable_record_prevents_startup() {
    let ws = Workspace::with_log("1\t2\ta\t1\nthis is not a record\n");

    ws.kvsd()
        .fails()
        .stderr_has("input parse error at line 2");
}

#[test]
fn unknown_event_type_prevents_startup() {
    let ws = Workspace::with_log("1\t7\ta\t1\n");

    ws.kvsd().fails().stderr_has("replay failed");
}

#[test]
fn log_path_that_is_a_directory_prevents_startup() {
    let ws = Workspace::empty();
    std::fs::create_dir(ws.log_path()).unwrap();

    ws.kvsd()
        .fails()
        .stderr_has("failed to open file transaction log");
}
