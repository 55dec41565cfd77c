// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::Config;
use crate::logging::LogLevel;
use std::time::Duration;

#[test]
fn test_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.endpoint, "https://api.travis-ci.org");
    assert_eq!(config.api.retries, 3);
    assert_eq!(config.api.timeout(), Duration::from_secs(60));
    assert_eq!(config.api.delay(), Duration::ZERO);
    assert_eq!(config.api.request_limit, 0);
    assert_eq!(config.watch.job, 1);
    assert_eq!(config.watch.grace(), Duration::from_secs(10));
    assert_eq!(config.watch.build_wait_retries, 36);
    assert_eq!(config.git.remote, "github");
    assert_eq!(config.git.branch_prefix, "ci/");
    assert_eq!(config.global.output_log_level, LogLevel::WARN);
}

#[test]
fn test_parse_sections() {
    let config = Config::parse(
        r#"
        [api]
        endpoint = "http://localhost:9000"
        retries = 5
        request_limit = 4

        [watch]
        repo = "octo/widgets"
        job = 2
        grace_ms = 250

        [git]
        remote = "origin"
        "#,
    )
    .unwrap();

    assert_eq!(config.api.endpoint, "http://localhost:9000");
    assert_eq!(config.api.retries, 5);
    assert_eq!(config.api.request_limit, 4);
    assert_eq!(config.watch.repo.as_deref(), Some("octo/widgets"));
    assert_eq!(config.watch.job, 2);
    assert_eq!(config.watch.grace(), Duration::from_millis(250));
    assert_eq!(config.git.remote, "origin");
    // untouched keys keep their defaults
    assert_eq!(config.git.remote_url_prefix, "git@github.com:");
}

#[test]
fn test_unknown_key_rejected() {
    let err = Config::parse("[api]\nendpoit = \"x\"\n").unwrap_err();
    assert!(err.to_string().contains("endpoit"), "{err}");
}

#[test]
fn test_validation() {
    let err = Config::parse("[watch]\njob = 0\n").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'job' in section '[watch]': job numbers start at 1"
    );

    let err = Config::parse("[api]\ntimeout_ms = 0\n").unwrap_err();
    assert!(err.to_string().contains("timeout_ms"));
}

#[test]
fn test_overrides_win_over_files() {
    let config = Config::builder()
        .add_toml_str("[api]\nretries = 1\n")
        .apply_overrides(["api.retries=7", "watch.repo = me/thing"])
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(config.api.retries, 7);
    assert_eq!(config.watch.repo.as_deref(), Some("me/thing"));
}

#[test]
fn test_override_without_equals() {
    let result = Config::builder().apply_overrides(["api.retries"]);
    assert!(result.is_err());
}

#[test]
fn test_toml_file_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ci-watch.toml");
    std::fs::write(&path, "[git]\nbranch_prefix = \"tmp-\"\n").unwrap();

    let loader = Config::builder().add_toml_file_optional(&path);
    assert_eq!(loader.format_loaded_files().len(), 1);
    let config = loader.build().unwrap();
    assert_eq!(config.git.branch_prefix, "tmp-");

    let missing = Config::builder()
        .add_toml_file(dir.path().join("nope.toml"))
        .build();
    assert!(missing.is_err());
}

#[test]
fn test_format_options_sorted() {
    let options = Config::default().format_options();
    let keys: Vec<&str> = options
        .iter()
        .map(|line| line.split_whitespace().next().unwrap())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert!(options.iter().any(|l| l.starts_with("watch.grace_ms") && l.ends_with("= 10000")));
}
