use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::common::error::GroveError;
use crate::common::result::GroveResult;
use crate::domain::value_objects::repo_name::RepoName;

/// ディレクトリツリー上で見つかったgitチェックアウト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCheckout {
    /// ルートからの相対パス（`group/.../base`）
    pub name: RepoName,
    pub path: PathBuf,
}

/// `root` 配下の `.git` を持つディレクトリを探す
///
/// 見つかったチェックアウトの中には降りない。groupを持たない
/// （ルート直下の）チェックアウトはスキップする。
pub fn discover(root: &Path) -> GroveResult<Vec<DiscoveredCheckout>> {
    if !root.is_absolute() {
        return Err(GroveError::validation_error(
            "root",
            "discovery requires an absolute path",
            Some(root.display().to_string()),
        ));
    }
    if !root.exists() {
        debug!("{} does not exist, nothing to discover", root.display());
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf);
            GroveError::filesystem_error_with_source(
                "Failed to walk workspace",
                path,
                e.into(),
            )
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name() == ".git" {
            walker.skip_current_dir();
            continue;
        }
        if !entry.path().join(".git").is_dir() {
            continue;
        }
        walker.skip_current_dir();

        let Some(relative) = pathdiff::diff_paths(entry.path(), root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        match RepoName::new(&relative) {
            Ok(name) => found.push(DiscoveredCheckout {
                name,
                path: entry.path().to_path_buf(),
            }),
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn checkout(root: &Path, name: &str) {
        fs::create_dir_all(root.join(name).join(".git")).unwrap();
    }

    #[test]
    fn test_discover_nested_groups() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        checkout(root, "acme/widget");
        checkout(root, "platform/infra/deploy");
        checkout(root, "loose");
        // a nested checkout inside another is not reported
        checkout(root, "acme/widget/vendor/lib");
        fs::create_dir_all(root.join("acme/empty")).unwrap();

        let names: Vec<String> = discover(root)
            .unwrap()
            .into_iter()
            .map(|c| c.name.to_string())
            .collect();
        assert_eq!(names, vec!["acme/widget", "platform/infra/deploy"]);
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&dir.path().join("none")).unwrap().is_empty());
    }

    #[test]
    fn test_discover_requires_absolute_root() {
        assert!(discover(Path::new("relative/dir")).is_err());
    }
}
