// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for ci-watch using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! ci-watch [global options] [REPO] [--job N] [--api URL]
//! watch [REPO] [--job N] [--api URL]   (default)
//! options
//! version
//! ```

pub mod global;
pub mod watch;

#[cfg(test)]
mod tests;

use crate::cli::global::GlobalOptions;
use crate::cli::watch::WatchArgs;
use clap::{Parser, Subcommand};

/// CI job log watcher
///
/// Pushes HEAD to a provisional branch and follows the CI job log live.
#[derive(Debug, Parser)]
#[command(
    name = "ci-watch",
    author,
    version,
    about = "CI job log watcher",
    args_conflicts_with_subcommands = true,
    long_about = "ci-watch Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Looks up the CI build for the commit at HEAD, pushing it to a\n\
                  provisional branch first if the provider has not seen it, and\n\
                  prints the log of one of its jobs as it is produced. Exits with\n\
                  0 if the job passed and 1 otherwise.",
    after_help = "CONFIG FILES:\n\n\
                  By default, ci-watch loads `ci-watch.toml` from the current\n\
                  directory if it exists. Additional files can be given with --ini\n\
                  and are loaded after it. CIWATCH_SECTION__KEY environment\n\
                  variables and --set come next, command-line flags last. Use\n\
                  --no-default-inis to skip `ci-watch.toml`."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Arguments of the implicit `watch` command
    #[command(flatten)]
    pub watch: WatchArgs,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follows a CI job log (the default).
    Watch(WatchArgs),

    /// Lists all options and their values.
    Options,

    /// Lists the config files used.
    Inis,

    /// Shows the version.
    Version,
}

impl Cli {
    /// Arguments of the watch command, whether given explicitly or not.
    #[must_use]
    pub fn watch_args(&self) -> &WatchArgs {
        match &self.command {
            Some(Command::Watch(args)) => args,
            _ => &self.watch,
        }
    }
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
