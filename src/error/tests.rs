// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{ConfigError, NetworkError, ProcessError, ProtocolError, WatchError, WatchResult};

#[test]
fn test_config_error_display() {
    let err = ConfigError::MissingIdentifier {
        what: "github repo name".to_string(),
    };
    insta::assert_snapshot!(err.to_string(), @"can't determine github repo name");
}

#[test]
fn test_process_error_display() {
    let exit = ProcessError::NonZeroExit {
        command: "git push github HEAD:ci/abc12345".to_string(),
        code: Some(128),
        signal: None,
    };
    insta::assert_snapshot!(exit.to_string(), @"git push github HEAD:ci/abc12345 exited with code 128");

    let signalled = ProcessError::NonZeroExit {
        command: "sleep 5".to_string(),
        code: None,
        signal: Some(2),
    };
    insta::assert_snapshot!(signalled.to_string(), @"sleep 5 exited with code none (signal 2)");

    let timeout = ProcessError::Timeout {
        command: "sleep 5".to_string(),
        timeout_ms: 100,
        signal: Some(9),
    };
    insta::assert_snapshot!(timeout.to_string(), @"sleep 5 exceeded execution time of 100 ms");
    assert!(timeout.is_timeout());
    assert_eq!(timeout.signal(), Some(9));
}

#[test]
fn test_bad_status_carries_code() {
    let err: WatchError = NetworkError::BadStatus {
        status: 503,
        url: "http://localhost/jobs/1".to_string(),
    }
    .into();
    assert_eq!(err.as_network().and_then(NetworkError::status), Some(503));
    assert!(err.as_process().is_none());
}

#[test]
fn test_protocol_error_display() {
    let err = ProtocolError::BadJobNumber {
        number: 3,
        count: 2,
    };
    insta::assert_snapshot!(err.to_string(), @"bad job number: 3 (2 jobs)");
}

#[test]
fn test_watch_error_size() {
    // Bailed is a Box<str>, 16 bytes (fat pointer: ptr + len)
    // With discriminant + alignment = 24 bytes
    let size = std::mem::size_of::<WatchError>();
    assert!(size <= 24, "WatchError is {size} bytes, expected <= 24");
}

#[test]
fn test_watch_result_size() {
    let size = std::mem::size_of::<WatchResult<()>>();
    assert!(size <= 24, "WatchResult<()> is {size} bytes, expected <= 24");
}
