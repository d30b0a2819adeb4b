//! Test fixtures for creating test data
//!
//! This module provides reusable fixtures for creating repositories,
//! isolated data/config directories and workspace checkouts.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use grove::domain::entities::Repository;
use grove::infrastructure::filesystem::WorkspaceIndex;

/// 一時ディレクトリ上のワークスペース
///
/// ```text
/// <tmp>/config/config.yaml
/// <tmp>/data/repo
/// <tmp>/src/<remote>/<group>/<base>
/// ```
pub struct WorkspaceFixture {
    pub dir: TempDir,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.path().join("src")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir().join("repo")
    }

    pub fn load_index(&self) -> WorkspaceIndex {
        WorkspaceIndex::load(self.index_path(), self.workspace_root()).expect("Failed to load index")
    }

    /// `config.yaml` を書き込む（workspaceはこのfixtureのルート）
    pub fn write_config(&self, remotes_yaml: &str) {
        fs::create_dir_all(self.config_dir()).expect("Failed to create config dir");
        let yaml = format!(
            "workspace: {}\nworkers: 2\n{}",
            self.workspace_root().display(),
            remotes_yaml
        );
        fs::write(self.config_dir().join("config.yaml"), yaml).expect("Failed to write config");
    }

    /// `<root>/<remote>/<name>/.git` を作る
    pub fn checkout(&self, remote: &str, name: &str) -> PathBuf {
        let path = self.workspace_root().join(remote).join(name);
        fs::create_dir_all(path.join(".git")).expect("Failed to create checkout");
        path
    }
}

/// Test fixture for creating repositories
pub struct RepositoryFixture;

impl RepositoryFixture {
    pub fn workspace(root: &Path, remote: &str, name: &str) -> Repository {
        Repository::workspace(remote, name, root).expect("Failed to build repository")
    }

    pub fn attached(remote: &str, name: &str, path: impl Into<PathBuf>) -> Repository {
        Repository::attach(remote, name, path).expect("Failed to build repository")
    }

    /// アクセス統計付きで復元したリポジトリ
    pub fn with_stats(root: &Path, remote: &str, name: &str, access: u64, last_access: i64) -> Repository {
        Repository::restore(remote, name, None, access, last_access, root)
            .expect("Failed to build repository")
    }

    /// `acme/repo-00` .. の名前を持つデフォルト位置のリポジトリ
    pub fn many(root: &Path, remote: &str, count: usize) -> Vec<Repository> {
        (0..count)
            .map(|i| Self::workspace(root, remote, &format!("acme/repo-{i:02}")))
            .collect()
    }
}
