use std::fs;
use std::io::ErrorKind;
use tracing::info;

use crate::common::error::GroveError;
use crate::common::result::GroveResult;
use crate::domain::entities::remote::Remote;
use crate::domain::entities::repository::Repository;
use crate::infrastructure::filesystem::config_store::GroveConfig;
use crate::infrastructure::filesystem::workspace_index::WorkspaceIndex;
use crate::infrastructure::git::CloneSpec;

/// homeの設定
#[derive(Debug, Clone)]
pub struct HomeConfig {
    pub remote: String,
    pub name: String,
}

impl HomeConfig {
    pub fn new(remote: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeResult {
    pub repository: Repository,

    /// このコマンドでクローンしたか
    pub cloned: bool,
}

/// リポジトリを取得または作成し、必要ならクローンしてアクセスを記録する
pub struct HomeUseCase {
    config: HomeConfig,
}

impl HomeUseCase {
    pub fn new(config: HomeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, index: &WorkspaceIndex, settings: &GroveConfig) -> GroveResult<HomeResult> {
        let remote = settings.remote(&self.config.remote)?;
        let repo = match index.get_by_name(&self.config.remote, &self.config.name) {
            Some(repo) => repo,
            None => Repository::workspace(
                &self.config.remote,
                &self.config.name,
                index.workspace_root(),
            )?,
        };

        let cloned = ensure_checkout(&repo, remote)?;
        if index.get_by_name(repo.remote(), repo.name()).is_none() {
            index.add(repo.clone())?;
        }
        let repository = index.mark_access(repo.remote(), repo.name())?;
        Ok(HomeResult { repository, cloned })
    }
}

/// チェックアウトが無ければクローンする。クローンした場合はtrue。
fn ensure_checkout(repo: &Repository, remote: &Remote) -> GroveResult<bool> {
    match fs::metadata(repo.path()) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(GroveError::validation_error(
            "path",
            format!("repo {}: {} is not a directory", repo.full_name(), repo.path().display()),
            None,
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("Cloning {} into {}", repo.full_name(), repo.path().display());
            CloneSpec::for_repository(repo, remote).run()?;
            Ok(true)
        }
        Err(e) => Err(GroveError::filesystem_error_with_source(
            "Failed to check repository directory",
            Some(repo.path().to_path_buf()),
            e,
        )),
    }
}
