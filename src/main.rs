// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config (layered) --> Logging --> Command Dispatch
//!   Watch | Options | Inis | Version
//! ```

use std::process::ExitCode;

use ci_watch::cli::{self, Command};
use ci_watch::cmd::config::{run_inis_command, run_options_command};
use ci_watch::cmd::watch::{exit_success, run_watch_command};
use ci_watch::config::Config;
use ci_watch::config::loader::ConfigLoader;
use ci_watch::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config = match build_config_loader(&cli).and_then(ConfigLoader::build) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&config, cli.global.no_color);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, &config).await
}

fn build_log_config(config: &Config, no_color: bool) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.global.output_log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(
            config
                .global
                .log_file
                .as_ref()
                .map(|p| p.display().to_string()),
        )
        .with_ansi(!no_color)
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: &Config) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Options) => {
            run_options_command(config);
            Ok(true)
        }
        Some(Command::Inis) => match build_config_loader(cli) {
            Ok(loader) => {
                run_inis_command(&loader.format_loaded_files());
                Ok(true)
            }
            Err(e) => Err(e),
        },
        Some(Command::Version) => Ok(true),
        Some(Command::Watch(_)) | None => run_watch_command(config)
            .await
            .map(|state| exit_success(&state)),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_config_loader(cli: &cli::Cli) -> ci_watch::error::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();
    if !cli.global.no_default_inis {
        loader = loader.add_toml_file_optional("ci-watch.toml");
    }
    for ini_path in &cli.global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader
        .with_env_prefix("CIWATCH")
        .apply_overrides(
            cli.global
                .to_config_overrides()
                .into_iter()
                .chain(cli.watch_args().to_config_overrides()),
        )
}
