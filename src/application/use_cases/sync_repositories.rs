use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::common::executor::{LineTracker, RunnerConfig, Task, TaskRunner, Tracker};
use crate::common::result::GroveResult;
use crate::domain::entities::repository::Repository;
use crate::infrastructure::filesystem::config_store::GroveConfig;
use crate::infrastructure::filesystem::discover::discover;
use crate::infrastructure::filesystem::workspace_index::WorkspaceIndex;
use crate::infrastructure::git::CloneSpec;

/// リポジトリ同期の設定
#[derive(Debug, Clone, Default)]
pub struct SyncRepositoriesConfig {
    /// 並列実行の最大数（Noneの場合は設定ファイルの値）
    pub workers: Option<usize>,

    /// 失敗ログの出力先（Noneの場合はデフォルトパス）
    pub log_path: Option<PathBuf>,

    /// ディスク上のチェックアウトの取り込みだけを行い、クローンはしない
    pub skip_clone: bool,
}

impl SyncRepositoriesConfig {
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }

    pub fn with_skip_clone(mut self, skip_clone: bool) -> Self {
        self.skip_clone = skip_clone;
        self
    }
}

/// 同期操作の結果
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// インデックスに新たに追加されたリポジトリ（`remote:name`）
    pub added: Vec<String>,

    /// クローンしたリポジトリの数
    pub cloned: usize,
}

/// ワークスペースとインデックスを同期する
///
/// 1. 各remoteのワークスペースディレクトリを走査し、インデックスに無い
///    チェックアウトを追加する
/// 2. インデックスにあってディスクに無いリポジトリをTask Runnerでクローンする
pub struct SyncRepositoriesUseCase {
    config: SyncRepositoriesConfig,
}

impl SyncRepositoriesUseCase {
    pub fn new(config: SyncRepositoriesConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, index: &WorkspaceIndex, settings: &GroveConfig) -> GroveResult<SyncResult> {
        let tracker: Arc<dyn Tracker<CloneSpec>> = Arc::new(LineTracker::<CloneSpec>::new("Cloning"));
        self.execute_with_tracker(index, settings, tracker)
    }

    pub fn execute_with_tracker(
        &self,
        index: &WorkspaceIndex,
        settings: &GroveConfig,
        tracker: Arc<dyn Tracker<CloneSpec>>,
    ) -> GroveResult<SyncResult> {
        let mut result = SyncResult {
            added: self.add_checkouts(index, settings)?,
            cloned: 0,
        };
        if self.config.skip_clone {
            return Ok(result);
        }

        let tasks = self.clone_tasks(index, settings);
        if tasks.is_empty() {
            debug!("Every indexed repository is present on disk");
            return Ok(result);
        }
        result.cloned = tasks.len();

        let runner_config = RunnerConfig::new("sync")
            .with_workers(self.config.workers.unwrap_or(settings.workers))
            .with_log_path(self.config.log_path.clone());
        let runner = TaskRunner::new(
            runner_config,
            tasks,
            |task: &Task<CloneSpec>| task.value().run(),
            tracker,
        );
        runner.run()?;
        Ok(result)
    }

    fn add_checkouts(&self, index: &WorkspaceIndex, settings: &GroveConfig) -> GroveResult<Vec<String>> {
        let mut added = Vec::new();
        for remote in settings.remotes.keys() {
            let root = index.workspace_root().join(remote);
            for checkout in discover(&root)? {
                let name = checkout.name.as_str();
                if index.get_by_name(remote, name).is_some() {
                    continue;
                }
                let repo = Repository::workspace(remote, name, index.workspace_root())?;
                let repo = if repo.path() == checkout.path {
                    repo
                } else {
                    Repository::attach(remote, name, &checkout.path)?
                };
                let full_name = repo.full_name();
                match index.add(repo) {
                    Ok(()) => {
                        info!("Added {} from {}", full_name, checkout.path.display());
                        added.push(full_name);
                    }
                    Err(e) if e.is_conflict() => warn!("Skipping {}: {}", full_name, e),
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(added)
    }

    fn clone_tasks(&self, index: &WorkspaceIndex, settings: &GroveConfig) -> Vec<Task<CloneSpec>> {
        let mut tasks = Vec::new();
        for repo in index.list("") {
            if repo.path().exists() {
                continue;
            }
            let Some(remote) = settings.remotes.get(repo.remote()) else {
                warn!(
                    "cannot find remote {} on repo {}, skip cloning",
                    repo.remote(),
                    repo.name()
                );
                continue;
            };
            tasks.push(Task::new(
                repo.full_name(),
                CloneSpec::for_repository(&repo, remote),
            ));
        }
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::remote::Remote;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, WorkspaceIndex, GroveConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");
        let index = WorkspaceIndex::load(dir.path().join("data/repo"), &root).unwrap();
        let mut settings = GroveConfig::default();
        settings.workspace = root.display().to_string();
        settings.remotes.insert("github".to_string(), Remote::new("github.com"));
        (dir, index, settings)
    }

    #[test]
    fn test_sync_adds_unindexed_checkouts() {
        let (_dir, index, settings) = setup();
        let root = index.workspace_root().to_path_buf();
        fs::create_dir_all(root.join("github/acme/widget/.git")).unwrap();
        fs::create_dir_all(root.join("github/acme/gadget/.git")).unwrap();
        // not a configured remote
        fs::create_dir_all(root.join("gitlab/acme/other/.git")).unwrap();

        index
            .add(Repository::workspace("github", "acme/gadget", &root).unwrap())
            .unwrap();

        let use_case = SyncRepositoriesUseCase::new(
            SyncRepositoriesConfig::default().with_skip_clone(true),
        );
        let result = use_case.execute(&index, &settings).unwrap();

        assert_eq!(result.added, vec!["github:acme/widget".to_string()]);
        assert_eq!(index.len(), 2);
        let widget = index.get_by_name("github", "acme/widget").unwrap();
        assert!(widget.is_default_location());
        assert_eq!(widget.path(), root.join("github/acme/widget"));
    }

    #[test]
    fn test_sync_skips_repos_of_unknown_remote() {
        let (dir, index, settings) = setup();
        index
            .add(Repository::attach("gitlab", "acme/lost", dir.path().join("lost")).unwrap())
            .unwrap();

        let use_case = SyncRepositoriesUseCase::new(SyncRepositoriesConfig::default());
        let result = use_case.execute(&index, &settings).unwrap();
        assert_eq!(result.cloned, 0);
        assert!(result.added.is_empty());
    }
}
