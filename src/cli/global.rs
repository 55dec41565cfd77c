// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Global CLI options available for all commands.
//!
//! # Option Precedence
//!
//! ```text
//! --ini FILE        ← Additional config files (can repeat)
//! -v / -l N         ← Console verbosity (0-6)
//! --file-log-level  ← File verbosity (overrides the console level)
//! --log-file FILE   ← global.log_file override
//! --set KEY=VAL     ← Direct config override
//!
//! Precedence: CLI flags > --set > env > --ini > ci-watch.toml > defaults
//! ```

use clap::Args;
use std::path::PathBuf;

use crate::logging::LogLevel;

/// Global options available for all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalOptions {
    /// Path to additional TOML configuration file(s).
    /// Can be specified multiple times.
    #[arg(short = 'i', long = "ini", value_name = "FILE", action = clap::ArgAction::Append)]
    pub inis: Vec<PathBuf>,

    /// Raises console verbosity by one level per occurrence.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, conflicts_with = "log_level")]
    pub verbose: u8,

    /// Console log level (0=silent, 1=errors, 2=warnings, 3=info, 4=debug, 5=trace, 6=dump).
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    pub log_level: Option<u8>,

    /// File log level, overrides the console level for the log file.
    #[arg(long = "file-log-level", value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    pub file_log_level: Option<u8>,

    /// Path to log file.
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Sets an option, such as 'api.retries=5' or 'watch.grace_ms=2000'.
    /// Can be specified multiple times.
    #[arg(short = 's', long = "set", value_name = "OPTION", action = clap::ArgAction::Append)]
    pub options: Vec<String>,

    /// Disables loading `ci-watch.toml` from the working directory.
    #[arg(long = "no-default-inis")]
    pub no_default_inis: bool,

    /// Disables colored log output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl GlobalOptions {
    /// Console level requested on the command line, if any.
    #[must_use]
    pub fn console_level(&self) -> Option<LogLevel> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => LogLevel::from_u8(level),
            (None, 0) => None,
            (None, verbose) => Some(LogLevel::from_verbosity(verbose)),
        }
    }

    /// Converts command-line options to configuration overrides.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = self.options.clone();

        let console = self.console_level();
        if let Some(level) = console {
            overrides.push(format!("global.output_log_level={}", level.as_u8()));
        }

        // file level falls back to the console level if not specified
        let file = self.file_log_level.and_then(LogLevel::from_u8).or(console);
        if let Some(level) = file {
            overrides.push(format!("global.file_log_level={}", level.as_u8()));
        }

        if let Some(ref path) = self.log_file {
            overrides.push(format!("global.log_file={}", path.display()));
        }

        overrides
    }
}
