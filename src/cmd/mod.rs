// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> config overrides --> cmd::run_* handlers
//!   watch, options, inis
//! ```

pub mod config;
pub mod watch;
