//! # grove - Local Workspace Manager
//!
//! `grove` keeps track of the git repositories checked out on your machine and
//! runs bulk work across them.
//!
//! ## Features
//!
//! - **Workspace Index**: Every known repository with its remote, name, path and
//!   access statistics, persisted in a versioned binary file
//! - **Frecency Ranking**: Repositories you use often and recently come first
//! - **Concurrent Task Runner**: Clone, run scripts or download files on a bounded
//!   worker pool with live progress and one consolidated failure log
//!
//! ## Quick Start
//!
//! 1. Configure a remote (`~/.config/grove/config.yaml`):
//!
//! ```yaml
//! workspace: ~/dev/src
//! remotes:
//!   github:
//!     host: github.com
//!     protocol: ssh
//!     user: dev
//!     email: dev@example.com
//! ```
//!
//! 2. Enter (and clone if needed) a repository:
//!
//! ```bash
//! cd $(grove home github acme/widget)
//! ```
//!
//! 3. Jump back to it later:
//!
//! ```bash
//! cd $(grove jump widget)
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: Repository and remote entities, frecency scoring
//! - [`application`]: Use cases (sync, run, download, jump, home)
//! - [`infrastructure`]: Index persistence, configuration, git and process execution
//! - [`presentation`]: CLI interface and user interaction
//! - [`common`]: Error handling and the concurrent task runner
//!
//! ## Examples
//!
//! ```rust,no_run
//! use grove::common::executor::{LineTracker, RunnerConfig, Task, TaskRunner};
//! use std::sync::Arc;
//!
//! # fn example() -> grove::Result<()> {
//! let tasks = (1..=4).map(|i| Task::new(format!("task-{i}"), i)).collect();
//! let runner = TaskRunner::new(
//!     RunnerConfig::new("demo").with_workers(2),
//!     tasks,
//!     |task: &Task<u32>| {
//!         println!("{} -> {}", task.name(), task.value());
//!         Ok(())
//!     },
//!     Arc::new(LineTracker::<u32>::new("Running")),
//! );
//! runner.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ```rust,no_run
//! use grove::infrastructure::filesystem::WorkspaceIndex;
//! use grove::domain::entities::Repository;
//!
//! # fn example() -> grove::Result<()> {
//! let index = WorkspaceIndex::load("/tmp/grove/repo", "/home/dev/src")?;
//! index.add(Repository::workspace("github", "acme/widget", index.workspace_root())?)?;
//! let repo = index.mark_access("github", "acme/widget")?;
//! println!("{} -> {}", repo.full_name(), repo.path().display());
//! index.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::GroveError;
pub use crate::common::result::GroveResult as Result;
