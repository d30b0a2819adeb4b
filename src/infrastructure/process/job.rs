use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use crate::common::error::GroveError;
use crate::common::result::GroveResult;
use crate::domain::entities::remote::Remote;
use crate::domain::entities::repository::Repository;
use crate::infrastructure::process::command::run_captured;

/// `bash -c` で実行するスクリプトジョブのペイロード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub command: String,
    pub dir: PathBuf,
    pub env: HashMap<String, String>,
}

impl JobSpec {
    pub fn new(command: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            dir: dir.into(),
            env: HashMap::new(),
        }
    }

    /// リポジトリのディレクトリで実行するジョブ。`REPO_*` と、remoteがあれば
    /// `REMOTE_URL` / `REMOTE_USER` / `REMOTE_EMAIL` を設定する。
    pub fn for_repository(
        command: impl Into<String>,
        repo: &Repository,
        remote: Option<&Remote>,
    ) -> Self {
        let mut job = Self::new(command, repo.path());
        repo.set_env(&mut job.env);
        if let Some(remote) = remote {
            let (user, email) = remote.user_email(repo);
            job.env
                .insert("REMOTE_URL".to_string(), remote.clone_url(repo));
            job.env
                .insert("REMOTE_USER".to_string(), user.unwrap_or_default());
            job.env
                .insert("REMOTE_EMAIL".to_string(), email.unwrap_or_default());
        }
        job
    }

    /// ジョブを実行し、出力を返す
    pub fn run(&self) -> GroveResult<String> {
        if !self.dir.is_dir() {
            return Err(GroveError::not_found_error(format!(
                "job root path {} does not exist",
                self.dir.display()
            )));
        }
        let label = format!("job {:?} on {}", self.command, self.dir.display());
        let mut command = Command::new("bash");
        command
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.dir)
            .envs(&self.env);
        run_captured(&mut command, &label)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::entities::remote::Remote;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_env_is_injected() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::attach("github", "acme/widget", dir.path()).unwrap();
        let mut remote = Remote::new("github.com");
        remote.user = Some("dev".to_string());

        let job = JobSpec::for_repository(
            "echo $REPO_NAME $REPO_GROUP $REPO_BASE $REMOTE_URL $REMOTE_USER; pwd",
            &repo,
            Some(&remote),
        );
        let out = job.run().unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "acme/widget acme widget https://github.com/acme/widget.git dev"
        );
        let pwd = PathBuf::from(lines.next().unwrap());
        assert_eq!(pwd.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_failure_exposes_output() {
        let dir = TempDir::new().unwrap();
        let err = JobSpec::new("echo broken >&2; exit 1", dir.path())
            .run()
            .unwrap_err();
        assert_eq!(err.captured_output(), Some("broken\n"));
    }

    #[test]
    fn test_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = JobSpec::new("true", dir.path().join("gone")).run().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
