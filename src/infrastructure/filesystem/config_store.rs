use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use validator::Validate;

use crate::common::error::GroveError;
use crate::common::result::{GroveResult, OptionExt};
use crate::domain::entities::remote::Remote;
use crate::infrastructure::filesystem::keyword_store::KEYWORD_FILE_NAME;
use crate::infrastructure::filesystem::workspace_index::INDEX_FILE_NAME;

pub const CONFIG_DIR_ENV: &str = "GROVE_CONFIG_DIR";
pub const DATA_DIR_ENV: &str = "GROVE_DATA_DIR";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
const APP_DIR_NAME: &str = "grove";
const DEFAULT_WORKSPACE: &str = "~/dev/src";

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.to_string()
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// `config.yaml` の内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GroveConfig {
    /// デフォルト位置のリポジトリを配置するルート（`~` / `$HOME` 展開可）
    #[serde(default = "default_workspace")]
    #[validate(length(min = 1))]
    pub workspace: String,

    /// Task Runnerのワーカー数
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub remotes: BTreeMap<String, Remote>,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            workers: default_workers(),
            remotes: BTreeMap::new(),
        }
    }
}

impl GroveConfig {
    pub fn from_yaml(contents: &str) -> GroveResult<Self> {
        let mut config: GroveConfig = serde_yaml::from_str(contents)
            .map_err(|e| GroveError::config_error_with_source("Failed to parse config file", e))?;
        config.normalize()?;
        Ok(config)
    }

    /// 検証し、致命的でない値を補正する
    fn normalize(&mut self) -> GroveResult<()> {
        self.validate().map_err(|e| {
            GroveError::config_error_with_source("Invalid configuration", e)
        })?;
        for (name, remote) in &self.remotes {
            remote.validate().map_err(|e| {
                GroveError::config_error_with_source(format!("Invalid remote {name}"), e)
            })?;
        }
        self.expanded_workspace()?;
        if self.workers == 0 {
            let fallback = default_workers();
            warn!("workers must be at least 1, using {}", fallback);
            self.workers = fallback;
        }
        Ok(())
    }

    /// `~` と `$HOME` を展開したワークスペースルート
    ///
    /// ディレクトリが既に存在する場合はシンボリックリンクを解決した実パスを返す。
    pub fn workspace_root(&self) -> GroveResult<PathBuf> {
        let root = self.expanded_workspace()?;
        match root.canonicalize() {
            Ok(resolved) => Ok(resolved),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(root),
            Err(e) => Err(GroveError::filesystem_error_with_source(
                "Failed to resolve workspace",
                Some(root),
                e,
            )),
        }
    }

    fn expanded_workspace(&self) -> GroveResult<PathBuf> {
        let root = expand_home(&self.workspace)?;
        if !root.is_absolute() {
            return Err(GroveError::config_error(format!(
                "workspace must be an absolute path or start with ~, got {:?}",
                self.workspace
            )));
        }
        Ok(root)
    }

    pub fn remote(&self, name: &str) -> GroveResult<&Remote> {
        self.remotes
            .get(name)
            .ok_or_not_found(format!("cannot find remote {name}"))
    }
}

fn expand_home(value: &str) -> GroveResult<PathBuf> {
    let rest = if value == "~" || value == "$HOME" {
        Some("")
    } else {
        value
            .strip_prefix("~/")
            .or_else(|| value.strip_prefix("$HOME/"))
    };
    match rest {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_internal_error("Failed to get home directory")?;
            Ok(if rest.is_empty() { home } else { home.join(rest) })
        }
        None => Ok(PathBuf::from(value)),
    }
}

/// 設定ファイルとデータファイルの配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl ConfigPaths {
    /// 環境変数 → プラットフォーム標準ディレクトリの順で解決する
    pub fn resolve() -> GroveResult<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_internal_error("Failed to get config directory")?
                .join(APP_DIR_NAME),
        };
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or_internal_error("Failed to get data directory")?
                .join(APP_DIR_NAME),
        };
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn index_file(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE_NAME)
    }

    pub fn keyword_file(&self) -> PathBuf {
        self.data_dir.join(KEYWORD_FILE_NAME)
    }
}

/// YAML設定ファイルの読み書き
pub struct ConfigStore;

impl ConfigStore {
    /// 設定を読み込む。ファイルが存在しない場合はデフォルト値。
    pub fn read(path: &Path) -> GroveResult<GroveConfig> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!("Reading config from {}", path.display());
                GroveConfig::from_yaml(&contents)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(GroveConfig::default())
            }
            Err(e) => Err(GroveError::filesystem_error_with_source(
                "Failed to read config file",
                Some(path.to_path_buf()),
                e,
            )),
        }
    }
}
