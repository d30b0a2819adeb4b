use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::error::GroveError;
use crate::common::executor::{Bytes, BytesTask, BytesTracker, RunnerConfig, Task, Tracker};
use crate::common::result::GroveResult;
use crate::infrastructure::download::{file_name_from_url, HttpSource};

/// ダウンロードの設定
#[derive(Debug, Clone)]
pub struct DownloadAssetsConfig {
    pub urls: Vec<String>,

    /// 保存先ディレクトリ
    pub dir: PathBuf,

    pub workers: usize,

    pub log_path: Option<PathBuf>,
}

impl DownloadAssetsConfig {
    pub fn new(urls: Vec<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            urls,
            dir: dir.into(),
            workers: num_cpus::get(),
            log_path: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }
}

/// ダウンロードの結果
#[derive(Debug, Clone, Default)]
pub struct DownloadResult {
    pub files: Vec<PathBuf>,
}

/// URLのリストを並列にダウンロードし、進捗バーを表示する
pub struct DownloadAssetsUseCase {
    config: DownloadAssetsConfig,
}

impl DownloadAssetsUseCase {
    pub fn new(config: DownloadAssetsConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> GroveResult<DownloadResult> {
        self.check_names()?;
        let source = HttpSource::new()?;
        let tasks = self
            .config
            .urls
            .iter()
            .map(|url| source.open(url))
            .collect::<GroveResult<Vec<_>>>()?;
        self.transfer(tasks, Arc::new(BytesTracker::new()))
    }

    /// 開いた転送タスクを保存先ディレクトリに書き出す
    pub fn transfer(
        &self,
        tasks: Vec<Task<BytesTask>>,
        tracker: Arc<dyn Tracker<BytesTask>>,
    ) -> GroveResult<DownloadResult> {
        let files = tasks
            .iter()
            .map(|task| self.config.dir.join(task.name()))
            .collect();
        let runner_config = RunnerConfig::new("download")
            .with_workers(self.config.workers)
            .with_log_path(self.config.log_path.clone());
        Bytes::new(runner_config, tasks, tracker).download(&self.config.dir)?;
        Ok(DownloadResult { files })
    }

    /// 同じファイル名に書き込むURLがないか確認する
    fn check_names(&self) -> GroveResult<()> {
        let mut seen = HashSet::new();
        for url in &self.config.urls {
            let name = file_name_from_url(url)?;
            if !seen.insert(name.clone()) {
                return Err(GroveError::conflict_error(format!(
                    "more than one url downloads to {name}"
                )));
            }
        }
        Ok(())
    }
}
