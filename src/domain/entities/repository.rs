use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::common::error::GroveError;
use crate::common::result::GroveResult;
use crate::domain::value_objects::repo_name::RepoName;

pub const HOUR_SECONDS: i64 = 60 * 60;
pub const DAY_SECONDS: i64 = HOUR_SECONDS * 24;
pub const WEEK_SECONDS: i64 = DAY_SECONDS * 7;

const HOUR_FACTOR: u64 = 16;
const DAY_FACTOR: u64 = 8;
const WEEK_FACTOR: u64 = 2;
const OTHER_FACTOR: u64 = 1;

/// 現在時刻（Unix秒）
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// リポジトリエンティティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// ファイルシステム上の絶対パス
    path: PathBuf,

    /// `group/.../base` 形式の名前
    name: RepoName,

    /// リモート名（例: github）
    remote: String,

    /// アクセス回数
    access_count: u64,

    /// 最終アクセス時刻（Unix秒、0は未アクセス）
    last_access: i64,

    /// ワークスペース配下のデフォルト位置にあるか。
    /// trueの場合、pathは保存されずロード時に再計算される。
    #[serde(rename = "workspace")]
    default_location: bool,
}

impl Repository {
    /// ワークスペース配下のデフォルト位置 `<root>/<remote>/<name>` にリポジトリを作成
    pub fn workspace(remote: &str, name: &str, workspace_root: &Path) -> GroveResult<Self> {
        let name = RepoName::new(name)?;
        let path = default_path(workspace_root, remote, &name);
        let mut repo = Self::build(remote, name, path)?;
        repo.default_location = true;
        Ok(repo)
    }

    /// 既存のディレクトリにリポジトリを関連付ける
    pub fn attach(remote: &str, name: &str, path: impl Into<PathBuf>) -> GroveResult<Self> {
        let name = RepoName::new(name)?;
        Self::build(remote, name, path.into())
    }

    /// 永続化されたレコードから復元する。pathが空の場合はデフォルト位置として扱う。
    pub fn restore(
        remote: &str,
        name: &str,
        path: Option<PathBuf>,
        access_count: u64,
        last_access: i64,
        workspace_root: &Path,
    ) -> GroveResult<Self> {
        let mut repo = match path {
            Some(path) => Self::attach(remote, name, path)?,
            None => Self::workspace(remote, name, workspace_root)?,
        };
        repo.access_count = access_count;
        repo.last_access = last_access;
        Ok(repo)
    }

    fn build(remote: &str, name: RepoName, path: PathBuf) -> GroveResult<Self> {
        if remote.is_empty() {
            return Err(GroveError::validation_error(
                "remote",
                "repository remote cannot be empty",
                Some(name.to_string()),
            ));
        }
        if path.as_os_str().is_empty() {
            return Err(GroveError::validation_error(
                "path",
                "repository path cannot be empty",
                Some(name.to_string()),
            ));
        }
        Ok(Self {
            path,
            name,
            remote: remote.to_string(),
            access_count: 0,
            last_access: 0,
            default_location: false,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn repo_name(&self) -> &RepoName {
        &self.name
    }

    pub fn group(&self) -> &str {
        self.name.group()
    }

    pub fn base(&self) -> &str {
        self.name.base()
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `remote:name` 形式の表示名
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.remote, self.name)
    }

    /// リポジトリの親ディレクトリ
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn last_access(&self) -> i64 {
        self.last_access
    }

    pub fn is_default_location(&self) -> bool {
        self.default_location
    }

    /// アクセスを記録する（回数を増やし、最終アクセス時刻を更新）
    pub fn mark_access(&mut self) {
        self.mark_access_at(now_unix());
    }

    pub fn mark_access_at(&mut self, now: i64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_access = now;
    }

    /// 現在時刻でのスコア
    pub fn score(&self) -> u64 {
        self.score_at(now_unix())
    }

    /// frecencyスコアを計算する
    ///
    /// 最終アクセスからの経過時間に応じてアクセス回数に係数を掛ける:
    ///   - 1時間以内: access * 16
    ///   - 1日以内:   access * 8
    ///   - 1週間以内: access * 2
    ///   - それ以上:  access
    ///
    /// 経過時間が0以下（未アクセス、時計のずれ）の場合は0。
    pub fn score_at(&self, now: i64) -> u64 {
        let delta = now - self.last_access;
        if delta <= 0 {
            return 0;
        }
        let factor = match delta {
            d if d <= HOUR_SECONDS => HOUR_FACTOR,
            d if d <= DAY_SECONDS => DAY_FACTOR,
            d if d <= WEEK_SECONDS => WEEK_FACTOR,
            _ => OTHER_FACTOR,
        };
        self.access_count.saturating_mul(factor)
    }

    /// ジョブ実行時に渡す環境変数を設定する
    pub fn set_env(&self, env: &mut HashMap<String, String>) {
        env.insert("REPO_NAME".to_string(), self.name.to_string());
        env.insert("REPO_GROUP".to_string(), self.group().to_string());
        env.insert("REPO_BASE".to_string(), self.base().to_string());
        env.insert("REPO_REMOTE".to_string(), self.remote.clone());
        env.insert("REPO_PATH".to_string(), self.path.display().to_string());
        env.insert("REPO_DIR".to_string(), self.dir().display().to_string());
    }
}

/// デフォルト位置 `<root>/<remote>/<name>` を計算する
pub fn default_path(workspace_root: &Path, remote: &str, name: &RepoName) -> PathBuf {
    let mut path = workspace_root.join(remote);
    for segment in name.as_str().split('/') {
        path.push(segment);
    }
    path
}

/// スコアの降順で並べ替える（同点の場合は元の順序を維持）
pub fn sort_by_score(repos: &mut [Repository]) {
    sort_by_score_at(repos, now_unix());
}

pub fn sort_by_score_at(repos: &mut [Repository], now: i64) {
    repos.sort_by_key(|repo| Reverse(repo.score_at(now)));
}

/// リポジトリのgroup一覧（`group/` 形式、出現順で重複なし）
pub fn groups_of(repos: &[Repository]) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for repo in repos {
        let group = format!("{}/", repo.group());
        if !groups.contains(&group) {
            groups.push(group);
        }
    }
    groups
}
