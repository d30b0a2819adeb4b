//! Assertion helpers for testing
//!
//! This module provides custom assertion macros and helper functions
//! that make test assertions more readable and provide better error messages.

use grove::domain::entities::Repository;
use grove::infrastructure::filesystem::WorkspaceIndex;

/// Assert that a file exists
#[macro_export]
macro_rules! assert_file_exists {
    ($path:expr) => {
        assert!($path.exists(), "File should exist: {}", $path.display());
    };
    ($path:expr, $msg:expr) => {
        assert!($path.exists(), "{}: {}", $msg, $path.display());
    };
}

/// Assert that a file does not exist
#[macro_export]
macro_rules! assert_file_not_exists {
    ($path:expr) => {
        assert!(
            !$path.exists(),
            "File should not exist: {}",
            $path.display()
        );
    };
    ($path:expr, $msg:expr) => {
        assert!(!$path.exists(), "{}: {}", $msg, $path.display());
    };
}

/// リポジトリが名前とパスの両方で引けることを確認する
pub fn assert_reachable(index: &WorkspaceIndex, repo: &Repository) {
    let by_name = index
        .get_by_name(repo.remote(), repo.name())
        .unwrap_or_else(|| panic!("{} should be reachable by name", repo.full_name()));
    assert_eq!(by_name.path(), repo.path());

    let by_path = index
        .get_by_path(repo.path())
        .unwrap_or_else(|e| panic!("{} should be reachable by path: {}", repo.full_name(), e));
    assert_eq!(by_path.full_name(), repo.full_name());
}

/// `remote:name` のソート済み一覧
pub fn full_names(repos: &[Repository]) -> Vec<String> {
    let mut names: Vec<String> = repos.iter().map(Repository::full_name).collect();
    names.sort();
    names
}

/// 失敗ログを `=> handle ` で始まる見出し行ごとに分割する
pub fn split_sections(log: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = log
        .match_indices("=> handle ")
        .filter(|(idx, _)| *idx == 0 || log.as_bytes()[idx - 1] == b'\n')
        .map(|(idx, _)| idx)
        .collect();
    starts.push(log.len());
    starts.windows(2).map(|w| &log[w[0]..w[1]]).collect()
}
