use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::common::error::GroveError;
use crate::common::result::GroveResult;
use crate::domain::entities::repository::{now_unix, DAY_SECONDS};
use crate::infrastructure::filesystem::codec;
use crate::infrastructure::filesystem::workspace_index::write_atomic;

/// キーワードファイル名（データディレクトリ配下）
pub const KEYWORD_FILE_NAME: &str = "jump_keyword";

/// キーワードの有効期間
pub const KEYWORD_EXPIRE_SECONDS: i64 = DAY_SECONDS;

/// 最近使った jump キーワードの保存先
///
/// 全てのタイムスタンプはストアを開いた時刻で記録・判定する。
#[derive(Debug)]
pub struct KeywordStore {
    path: PathBuf,
    now: i64,
    data: Mutex<BTreeMap<String, i64>>,
}

impl KeywordStore {
    pub fn load(path: impl Into<PathBuf>) -> GroveResult<Self> {
        Self::load_at(path, now_unix())
    }

    pub fn load_at(path: impl Into<PathBuf>, now: i64) -> GroveResult<Self> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) => codec::decode_keywords(&bytes)
                .map_err(|e| GroveError::corruption_error(&path, e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(GroveError::filesystem_error_with_source(
                    "Failed to read keyword file",
                    Some(path),
                    e,
                ))
            }
        };
        Ok(Self {
            path,
            now,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        let delta = self.now - timestamp;
        delta <= 0 || delta >= KEYWORD_EXPIRE_SECONDS
    }

    pub fn add(&self, keyword: &str) {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return;
        }
        self.data.lock().insert(keyword.to_string(), self.now);
    }

    /// 有効なキーワードをソートして返す（期限切れのものは削除される）
    pub fn list(&self) -> Vec<String> {
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|_, timestamp| !self.is_expired(*timestamp));
        if data.len() != before {
            debug!("Dropped {} expired keyword(s)", before - data.len());
        }
        data.keys().cloned().collect()
    }

    /// 空の場合は書き込まない
    pub fn close(&self) -> GroveResult<()> {
        let data = self.data.lock();
        if data.is_empty() {
            return Ok(());
        }
        write_atomic(&self.path, &codec::encode_keywords(&data))
    }
}
