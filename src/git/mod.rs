// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git operations module.
//!
//! ```text
//!          cmd::watch
//!              |
//!      ,-------+--------,
//!      |  backend traits |
//!      '---+--------+---'
//!          |        |
//!          v        v
//!     GitQuery   GitMutation
//!     .head_hash   .ensure_remote
//!     .remote_slug .push_branch
//!          |       .delete_branch
//!          v        |
//!       LocalGit <--'
//!   gix (HEAD, no subprocess)
//!   git CLI via ProcessBuilder (remotes, push)
//! ```
//!
//! `query` holds the pure helpers: HEAD lookup through gix, provisional
//! branch naming and `user/repo` extraction from remote URLs.

pub mod backend;
pub mod query;

#[cfg(test)]
mod tests;

pub use backend::{GitMutation, GitQuery, LocalGit};
