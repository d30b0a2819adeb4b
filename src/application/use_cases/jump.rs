use tracing::debug;

use crate::common::error::GroveError;
use crate::common::result::GroveResult;
use crate::domain::entities::repository::{sort_by_score, Repository};
use crate::infrastructure::filesystem::keyword_store::KeywordStore;
use crate::infrastructure::filesystem::workspace_index::WorkspaceIndex;

/// ジャンプの設定
#[derive(Debug, Clone, Default)]
pub struct JumpConfig {
    /// 対象のremote（Noneの場合は全て）
    pub remote: Option<String>,

    /// 名前に含まれるキーワード
    pub keyword: Option<String>,
}

/// 最もスコアの高いリポジトリを選び、アクセスを記録する
///
/// キーワードがある場合は、名前にキーワードを含むリポジトリのうち
/// 最もスコアの高いものを選び、キーワードを記録する。
pub struct JumpUseCase {
    config: JumpConfig,
}

impl JumpUseCase {
    pub fn new(config: JumpConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, index: &WorkspaceIndex, keywords: &KeywordStore) -> GroveResult<Repository> {
        let mut repos = index.list(self.config.remote.as_deref().unwrap_or(""));
        if repos.is_empty() {
            return Err(GroveError::not_found_error("no repo"));
        }
        sort_by_score(&mut repos);

        let keyword = self
            .config
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        let target = match keyword {
            None => &repos[0],
            Some(keyword) => {
                let found = repos
                    .iter()
                    .find(|repo| repo.name().contains(keyword))
                    .ok_or_else(|| GroveError::not_found_error("cannot find match repo"))?;
                keywords.add(keyword);
                found
            }
        };
        debug!("Jumping to {}", target.full_name());
        index.mark_access(target.remote(), target.name())
    }
}
