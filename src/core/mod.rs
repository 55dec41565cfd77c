// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core process supervision.
//!
//! ```text
//!        core
//!         |
//!         v
//!      process
//!         |
//!   Builder Runner KillTimer
//! ```

pub mod process;
