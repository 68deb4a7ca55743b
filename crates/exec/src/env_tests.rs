// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn restic_bin_defaults_to_path_lookup() {
    std::env::remove_var("RESTIC_BINARY");
    assert_eq!(restic_bin(), "restic");
}

#[test]
#[serial]
fn restic_bin_honours_override() {
    std::env::set_var("RESTIC_BINARY", "/opt/restic/bin/restic");
    assert_eq!(restic_bin(), "/opt/restic/bin/restic");
    std::env::set_var("RESTIC_BINARY", "");
    assert_eq!(restic_bin(), "restic");
    std::env::remove_var("RESTIC_BINARY");
}

#[test]
#[serial]
fn max_line_bytes_parsing() {
    let cases = [
        (None, DEFAULT_MAX_LINE_BYTES),
        (Some("1024"), 1024),
        (Some("0"), DEFAULT_MAX_LINE_BYTES),
        (Some("lots"), DEFAULT_MAX_LINE_BYTES),
    ];
    for (value, expected) in cases {
        match value {
            Some(v) => std::env::set_var("RESTASH_MAX_LINE_BYTES", v),
            None => std::env::remove_var("RESTASH_MAX_LINE_BYTES"),
        }
        assert_eq!(
            max_line_bytes(),
            expected,
            "RESTASH_MAX_LINE_BYTES={value:?}"
        );
    }
    std::env::remove_var("RESTASH_MAX_LINE_BYTES");
}

#[test]
#[serial]
fn bridge_drain_timeout_override() {
    std::env::remove_var("RESTASH_BRIDGE_DRAIN_MS");
    assert_eq!(bridge_drain_timeout(), Duration::from_secs(5));
    std::env::set_var("RESTASH_BRIDGE_DRAIN_MS", "250");
    assert_eq!(bridge_drain_timeout(), Duration::from_millis(250));
    std::env::remove_var("RESTASH_BRIDGE_DRAIN_MS");
}
