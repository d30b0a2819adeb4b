use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::common::error::GroveError;
use crate::common::executor::{LineTracker, RunnerConfig, Task, TaskRunner, Tracker};
use crate::common::result::GroveResult;
use crate::domain::entities::repository::{sort_by_score, Repository};
use crate::infrastructure::filesystem::config_store::GroveConfig;
use crate::infrastructure::filesystem::workspace_index::WorkspaceIndex;
use crate::infrastructure::process::JobSpec;

/// ジョブ実行の設定
#[derive(Debug, Clone)]
pub struct RunJobConfig {
    /// `bash -c` で実行するコマンド
    pub command: String,

    /// 対象のremote（Noneの場合は全て）
    pub remote: Option<String>,

    /// 対象のグループ（ネストしたグループも含む）
    pub group: Option<String>,

    /// リポジトリ名に対する正規表現フィルタ
    pub filter: Option<String>,

    pub workers: Option<usize>,

    pub log_path: Option<PathBuf>,
}

impl RunJobConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            remote: None,
            group: None,
            filter: None,
            workers: None,
            log_path: None,
        }
    }

    pub fn with_remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }
}

/// ジョブ実行の結果
#[derive(Debug, Clone, Default)]
pub struct RunJobResult {
    /// ジョブを実行したリポジトリ（`remote:name`）
    pub repositories: Vec<String>,
}

/// 選択したリポジトリ群でスクリプトジョブを並列実行する
pub struct RunJobUseCase {
    config: RunJobConfig,
}

impl RunJobUseCase {
    pub fn new(config: RunJobConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, index: &WorkspaceIndex, settings: &GroveConfig) -> GroveResult<RunJobResult> {
        let tracker: Arc<dyn Tracker<JobSpec>> = Arc::new(LineTracker::<JobSpec>::new("Running"));
        self.execute_with_tracker(index, settings, tracker)
    }

    pub fn execute_with_tracker(
        &self,
        index: &WorkspaceIndex,
        settings: &GroveConfig,
        tracker: Arc<dyn Tracker<JobSpec>>,
    ) -> GroveResult<RunJobResult> {
        if self.config.command.trim().is_empty() {
            return Err(GroveError::validation_error(
                "command",
                "job command cannot be empty",
                None,
            ));
        }

        let repos = self.select(index)?;
        let result = RunJobResult {
            repositories: repos.iter().map(Repository::full_name).collect(),
        };
        let tasks: Vec<Task<JobSpec>> = repos
            .iter()
            .map(|repo| {
                let remote = settings.remotes.get(repo.remote());
                Task::new(
                    repo.full_name(),
                    JobSpec::for_repository(&self.config.command, repo, remote),
                )
            })
            .collect();

        let runner_config = RunnerConfig::new("run")
            .with_workers(self.config.workers.unwrap_or(settings.workers))
            .with_log_path(self.config.log_path.clone());
        let runner = TaskRunner::new(
            runner_config,
            tasks,
            |task: &Task<JobSpec>| {
                let output = task.value().run()?;
                debug!("{}: {}", task.name(), output.trim_end());
                Ok(())
            },
            tracker,
        );
        runner.run()?;
        Ok(result)
    }

    /// 対象のリポジトリをスコア順に選ぶ。ディスク上に存在しないものは除く。
    pub fn select(&self, index: &WorkspaceIndex) -> GroveResult<Vec<Repository>> {
        let filter = match &self.config.filter {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                GroveError::validation_error("filter", e.to_string(), Some(pattern.clone()))
            })?),
            None => None,
        };
        let group_prefix = self
            .config
            .group
            .as_deref()
            .map(|group| format!("{}/", group.trim_matches('/')));

        let mut repos: Vec<Repository> = index
            .list(self.config.remote.as_deref().unwrap_or(""))
            .into_iter()
            .filter(|repo| match &group_prefix {
                Some(prefix) => repo.name().starts_with(prefix.as_str()),
                None => true,
            })
            .filter(|repo| filter.as_ref().map_or(true, |re| re.is_match(repo.name())))
            .filter(|repo| {
                let exists = repo.path().is_dir();
                if !exists {
                    debug!("Skipping {}, {} is missing", repo.full_name(), repo.path().display());
                }
                exists
            })
            .collect();
        sort_by_score(&mut repos);
        Ok(repos)
    }
}
