use tracing::debug;

use crate::common::result::GroveResult;
use crate::infrastructure::filesystem::{ConfigPaths, ConfigStore, GroveConfig, KeywordStore, WorkspaceIndex};

/// 一回のコマンド実行で使う設定とインデックス
pub struct Session {
    pub paths: ConfigPaths,
    pub config: GroveConfig,
    pub index: WorkspaceIndex,
}

impl Session {
    /// 設定を読み込み、インデックスを開く
    pub fn open() -> GroveResult<Self> {
        let paths = ConfigPaths::resolve()?;
        let config = ConfigStore::read(&paths.config_file())?;
        let index = WorkspaceIndex::load(paths.index_file(), config.workspace_root()?)?;
        debug!(
            "Session opened: config={} data={}",
            paths.config_dir.display(),
            paths.data_dir.display()
        );
        Ok(Self {
            paths,
            config,
            index,
        })
    }

    /// インデックスを変更しないコマンド用
    pub fn open_read_only() -> GroveResult<Self> {
        let session = Self::open()?;
        session.index.set_read_only();
        Ok(session)
    }

    pub fn keywords(&self) -> GroveResult<KeywordStore> {
        KeywordStore::load(self.paths.keyword_file())
    }

    /// `--jobs` が指定されていればそれを、なければ設定のワーカー数
    pub fn workers(&self, jobs: Option<usize>) -> usize {
        jobs.unwrap_or(self.config.workers)
    }

    /// コマンドを実行し、結果にかかわらずインデックスを保存する
    pub fn run<T>(self, f: impl FnOnce(&Session) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let result = f(&self);
        let closed = self.index.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}
