use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::common::error::GroveError;
use crate::common::result::{GroveResult, ResultExt};
use crate::domain::entities::remote::Remote;
use crate::domain::entities::repository::Repository;
use crate::infrastructure::process::command::run_captured;

/// クローンタスクのペイロード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneSpec {
    pub url: String,
    pub path: PathBuf,
    pub user: Option<String>,
    pub email: Option<String>,
}

impl CloneSpec {
    pub fn for_repository(repo: &Repository, remote: &Remote) -> Self {
        let (user, email) = remote.user_email(repo);
        Self {
            url: remote.clone_url(repo),
            path: repo.path().to_path_buf(),
            user,
            email,
        }
    }

    /// `git clone` を実行し、新しいチェックアウトにuser.name / user.emailを設定する
    pub fn run(&self) -> GroveResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_filesystem_error(
                "Failed to create parent directory",
                Some(parent.to_path_buf()),
            )?;
        }

        let mut command = Command::new("git");
        command.arg("clone").arg(&self.url).arg(&self.path);
        run_captured(&mut command, &format!("git clone {}", self.url))?;

        if self.user.is_none() && self.email.is_none() {
            return Ok(());
        }
        let repo = git2::Repository::open(&self.path).map_err(|e| {
            GroveError::git_error_with_source(
                format!("Failed to open {}", self.path.display()),
                e,
            )
        })?;
        let mut config = repo.config()?;
        if let Some(user) = &self.user {
            config.set_str("user.name", user)?;
        }
        if let Some(email) = &self.email {
            config.set_str("user.email", email)?;
        }
        debug!("Configured identity for {}", self.path.display());
        Ok(())
    }
}
