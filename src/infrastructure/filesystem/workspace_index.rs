use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::common::error::GroveError;
use crate::common::result::{GroveResult, ResultExt};
use crate::domain::entities::repository::{sort_by_score, Repository};
use crate::infrastructure::filesystem::codec::{self, IndexRecord};

/// インデックスファイル名（データディレクトリ配下）
pub const INDEX_FILE_NAME: &str = "repo";

#[derive(Debug, Default)]
struct IndexState {
    repos: Vec<Repository>,

    /// remote -> name -> reposの位置
    name_index: HashMap<String, HashMap<String, usize>>,

    /// path -> reposの位置
    path_index: HashMap<PathBuf, usize>,
}

impl IndexState {
    fn get(&self, remote: &str, name: &str) -> Option<usize> {
        self.name_index.get(remote)?.get(name).copied()
    }

    fn insert(&mut self, repo: Repository) {
        let pos = self.repos.len();
        self.name_index
            .entry(repo.remote().to_string())
            .or_default()
            .insert(repo.name().to_string(), pos);
        self.path_index.insert(repo.path().to_path_buf(), pos);
        self.repos.push(repo);
    }

    fn rebuild(&mut self, repos: Vec<Repository>) {
        self.repos.clear();
        self.name_index.clear();
        self.path_index.clear();
        for repo in repos {
            self.insert(repo);
        }
    }
}

/// Workspace Index
///
/// 既知のリポジトリの集合を管理する。全ての公開メソッドは内部の
/// `RwLock` を適切なモードで取得するため、`Arc` で共有して複数スレッドから
/// 利用できる。返却されるリポジトリは全てスナップショット（クローン）。
#[derive(Debug)]
pub struct WorkspaceIndex {
    /// インデックスファイルのパス
    path: PathBuf,

    /// デフォルト位置のリポジトリを配置するワークスペースルート
    workspace_root: PathBuf,

    state: RwLock<IndexState>,

    read_only: AtomicBool,
}

impl WorkspaceIndex {
    /// インデックスファイルを読み込む
    ///
    /// ファイルが存在しない場合は空のインデックスを返す。デコードできない
    /// データや一意性制約に違反するデータは `CorruptionError` になる。
    pub fn load(
        path: impl Into<PathBuf>,
        workspace_root: impl Into<PathBuf>,
    ) -> GroveResult<Self> {
        let path = path.into();
        let workspace_root = workspace_root.into();

        let data = match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(GroveError::filesystem_error_with_source(
                    "Failed to read repository index",
                    Some(path),
                    e,
                ))
            }
        };

        let mut state = IndexState::default();
        if let Some(data) = data {
            let records = codec::decode_index(&data)
                .map_err(|e| GroveError::corruption_error(&path, e.to_string()))?;

            let mut repos = Vec::with_capacity(records.len());
            for record in records {
                repos.push(restore_record(record, &workspace_root, &path)?);
            }
            sort_by_score(&mut repos);

            for repo in repos {
                if state.path_index.contains_key(repo.path()) {
                    return Err(GroveError::corruption_error(
                        &path,
                        format!("path {:?} is duplicate", repo.path()),
                    ));
                }
                if state.get(repo.remote(), repo.name()).is_some() {
                    return Err(GroveError::corruption_error(
                        &path,
                        format!("repo {} is duplicate", repo.full_name()),
                    ));
                }
                state.insert(repo);
            }
        }

        debug!(
            "Loaded {} repositories from {}",
            state.repos.len(),
            path.display()
        );

        Ok(Self {
            path,
            workspace_root,
            state: RwLock::new(state),
            read_only: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn len(&self) -> usize {
        self.state.read().repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// remoteに属するリポジトリの一覧（空文字列は全remote）
    pub fn list(&self, remote: &str) -> Vec<Repository> {
        let state = self.state.read();
        state
            .repos
            .iter()
            .filter(|repo| remote.is_empty() || repo.remote() == remote)
            .cloned()
            .collect()
    }

    pub fn get_by_name(&self, remote: &str, name: &str) -> Option<Repository> {
        let state = self.state.read();
        let pos = state.get(remote, name.trim_matches('/'))?;
        Some(state.repos[pos].clone())
    }

    pub fn get_by_path(&self, path: &Path) -> GroveResult<Repository> {
        let state = self.state.read();
        match state.path_index.get(path) {
            Some(&pos) => Ok(state.repos[pos].clone()),
            None => Err(GroveError::not_found_error(format!(
                "path {} does not attach to any repository, please use attach command to attach first",
                path.display()
            ))),
        }
    }

    /// カレントディレクトリを含むgitリポジトリを検索する
    pub fn get_current(&self) -> GroveResult<Repository> {
        let cwd = std::env::current_dir()
            .with_filesystem_error("Failed to get current directory", None)?;
        self.get_containing(&cwd)
    }

    /// `dir` を含むgitリポジトリのワークツリーから検索する
    pub fn get_containing(&self, dir: &Path) -> GroveResult<Repository> {
        let git_repo = git2::Repository::discover(dir).map_err(|e| {
            GroveError::git_error_with_source(
                format!("{} is not inside a git repository", dir.display()),
                e,
            )
        })?;
        let workdir = git_repo.workdir().ok_or_else(|| {
            GroveError::validation_error(
                "path",
                "bare repositories cannot be attached",
                Some(dir.display().to_string()),
            )
        })?;
        let workdir = workdir.canonicalize().with_filesystem_error(
            "Failed to resolve repository directory",
            Some(workdir.to_path_buf()),
        )?;
        self.get_by_path(&workdir)
    }

    /// リポジトリを追加する
    ///
    /// 同じ `(remote, name)` または同じpathが既に存在する場合は
    /// `ConflictError` を返し、状態は変更しない。
    pub fn add(&self, repo: Repository) -> GroveResult<()> {
        let mut state = self.state.write();

        if state.get(repo.remote(), repo.name()).is_some() {
            return Err(GroveError::conflict_error(format!(
                "repo {} is already exists",
                repo.full_name()
            )));
        }
        if let Some(&pos) = state.path_index.get(repo.path()) {
            return Err(GroveError::conflict_error(format!(
                "path {} is already bound to {}",
                repo.path().display(),
                state.repos[pos].full_name()
            )));
        }

        debug!("Adding repository {}", repo.full_name());
        state.insert(repo);
        Ok(())
    }

    /// インデックスからのみ削除する。存在しない場合は何もしない。
    pub fn delete(&self, repo: &Repository) {
        let mut state = self.state.write();
        if state.get(repo.remote(), repo.name()).is_none() {
            return;
        }

        let repos = std::mem::take(&mut state.repos)
            .into_iter()
            .filter(|item| !(item.remote() == repo.remote() && item.name() == repo.name()))
            .collect();
        state.rebuild(repos);
        debug!("Deleted repository {}", repo.full_name());
    }

    /// ディスク上のディレクトリも削除した上でインデックスから削除する
    ///
    /// ディレクトリの削除に失敗した場合、インデックスは変更しない。
    pub fn delete_all(&self, repo: &Repository) -> GroveResult<()> {
        let path = repo.path();
        match fs::symlink_metadata(path) {
            Ok(_) => {
                fs::remove_dir_all(path).map_err(|e| {
                    GroveError::filesystem_error_with_source(
                        format!("Failed to remove directory for repo {}", repo.full_name()),
                        Some(path.to_path_buf()),
                        e,
                    )
                })?;
                info!("Removed {}", path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(GroveError::filesystem_error_with_source(
                    format!("Failed to inspect directory for repo {}", repo.full_name()),
                    Some(path.to_path_buf()),
                    e,
                ))
            }
        }
        self.delete(repo);
        Ok(())
    }

    /// アクセスを記録し、更新後のスナップショットを返す
    pub fn mark_access(&self, remote: &str, name: &str) -> GroveResult<Repository> {
        let mut state = self.state.write();
        let pos = state.get(remote, name).ok_or_else(|| {
            GroveError::not_found_error(format!("repo {remote}:{name} not found"))
        })?;
        let repo = &mut state.repos[pos];
        repo.mark_access();
        Ok(repo.clone())
    }

    /// `close()` で書き込みを行わないようにする
    pub fn set_read_only(&self) {
        self.read_only.store(true, Ordering::SeqCst);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    /// インデックスをディスクに書き込む（read-onlyの場合は何もしない）
    ///
    /// デフォルト位置のリポジトリはpathを保存しない。
    pub fn close(&self) -> GroveResult<()> {
        if self.is_read_only() {
            debug!("Index is read-only, skip writing {}", self.path.display());
            return Ok(());
        }

        let data = {
            let state = self.state.read();
            let records = state
                .repos
                .iter()
                .map(to_record)
                .collect::<GroveResult<Vec<_>>>()?;
            codec::encode_index(&records)
        };

        write_atomic(&self.path, &data)?;
        info!("Saved {} repositories to {}", self.len(), self.path.display());
        Ok(())
    }
}

fn restore_record(
    record: IndexRecord,
    workspace_root: &Path,
    index_path: &Path,
) -> GroveResult<Repository> {
    let path = if record.path.is_empty() {
        None
    } else {
        Some(PathBuf::from(&record.path))
    };
    Repository::restore(
        &record.remote,
        &record.name,
        path,
        record.access_count,
        record.last_access,
        workspace_root,
    )
    .map_err(|e| {
        GroveError::corruption_error(
            index_path,
            format!("invalid repository {}:{}: {}", record.remote, record.name, e),
        )
    })
}

fn to_record(repo: &Repository) -> GroveResult<IndexRecord> {
    let path = if repo.is_default_location() {
        String::new()
    } else {
        repo.path()
            .to_str()
            .ok_or_else(|| {
                GroveError::validation_error(
                    "path",
                    "repository path is not valid UTF-8",
                    Some(repo.path().display().to_string()),
                )
            })?
            .to_string()
    };
    Ok(IndexRecord {
        path,
        name: repo.name().to_string(),
        remote: repo.remote().to_string(),
        access_count: repo.access_count(),
        last_access: repo.last_access(),
    })
}

/// 一時ファイルに書き込んでからリネームする
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> GroveResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_filesystem_error(
            "Failed to create data directory",
            Some(parent.to_path_buf()),
        )?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, data).with_filesystem_error("Failed to write data file", Some(tmp.clone()))?;
    fs::rename(&tmp, path)
        .with_filesystem_error("Failed to replace data file", Some(path.to_path_buf()))
}
