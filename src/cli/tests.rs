// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cli::{Cli, Command};
use crate::logging::LogLevel;
use clap::Parser;

#[test]
fn test_parse_no_args_watches() {
    let cli = Cli::try_parse_from(["ci-watch"]).unwrap();
    assert!(cli.command.is_none());
    assert!(cli.watch_args().repo.is_none());
    assert!(cli.watch_args().job.is_none());
}

#[test]
fn test_parse_implicit_watch() {
    let cli = Cli::try_parse_from(["ci-watch", "someuser/project", "--job", "2"]).unwrap();
    assert!(cli.command.is_none());
    let args = cli.watch_args();
    assert_eq!(args.repo.as_deref(), Some("someuser/project"));
    assert_eq!(args.job, Some(2));
}

#[test]
fn test_parse_explicit_watch() {
    let cli = Cli::try_parse_from([
        "ci-watch",
        "watch",
        "someuser/project",
        "--api",
        "http://localhost:8080",
    ])
    .unwrap();
    assert!(matches!(cli.command, Some(Command::Watch(_))));
    let args = cli.watch_args();
    assert_eq!(args.repo.as_deref(), Some("someuser/project"));
    assert_eq!(args.api.as_deref(), Some("http://localhost:8080"));
}

#[test]
fn test_parse_subcommands() {
    let cli = Cli::try_parse_from(["ci-watch", "options"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Options)));

    let cli = Cli::try_parse_from(["ci-watch", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_job_zero_rejected() {
    assert!(Cli::try_parse_from(["ci-watch", "--job", "0"]).is_err());
}

#[test]
fn test_verbosity_and_log_level_conflict() {
    assert!(Cli::try_parse_from(["ci-watch", "-v", "-l", "3"]).is_err());
}

#[test]
fn test_verbosity_raises_console_level() {
    let cli = Cli::try_parse_from(["ci-watch", "-vv"]).unwrap();
    assert_eq!(cli.global.console_level(), Some(LogLevel::DEBUG));

    let cli = Cli::try_parse_from(["ci-watch"]).unwrap();
    assert_eq!(cli.global.console_level(), None);
}

#[test]
fn test_global_overrides() {
    let cli = Cli::try_parse_from([
        "ci-watch",
        "-l",
        "3",
        "--file-log-level",
        "5",
        "--log-file",
        "watch.log",
        "--set",
        "api.retries=5",
    ])
    .unwrap();
    insta::assert_snapshot!(cli.global.to_config_overrides().join("\n"), @r"
    api.retries=5
    global.output_log_level=3
    global.file_log_level=5
    global.log_file=watch.log
    ");
}

#[test]
fn test_file_level_follows_console_level() {
    let cli = Cli::try_parse_from(["ci-watch", "-v"]).unwrap();
    insta::assert_snapshot!(cli.global.to_config_overrides().join("\n"), @r"
    global.output_log_level=3
    global.file_log_level=3
    ");
}

#[test]
fn test_watch_overrides() {
    let cli = Cli::try_parse_from(["ci-watch", "u/r", "-j", "3", "--api", "http://ci"]).unwrap();
    insta::assert_snapshot!(cli.watch_args().to_config_overrides().join("\n"), @r"
    watch.repo=u/r
    watch.job=3
    api.endpoint=http://ci
    ");
}
