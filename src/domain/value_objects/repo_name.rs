use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::common::error::GroveError;

/// RepoName関連のエラー
#[derive(Debug, Error, PartialEq)]
pub enum RepoNameError {
    #[error("invalid repository name {0:?}, missing group")]
    MissingGroup(String),

    #[error("invalid repository name {0:?}, contains an empty segment")]
    EmptySegment(String),

    #[error("invalid repository name {0:?}, segment {1:?} is not allowed")]
    InvalidSegment(String, String),
}

impl From<RepoNameError> for GroveError {
    fn from(error: RepoNameError) -> Self {
        let value = match &error {
            RepoNameError::MissingGroup(name)
            | RepoNameError::EmptySegment(name)
            | RepoNameError::InvalidSegment(name, _) => name.clone(),
        };
        GroveError::validation_error("repository name", error.to_string(), Some(value))
    }
}

/// `group/.../base` 形式のリポジトリ名
///
/// groupとbaseは保持している名前から導出され、個別には保存されない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName {
    name: String,

    /// 最後の `/` の位置
    split: usize,
}

impl RepoName {
    /// 名前を正規化（前後の `/` を除去）して検証する
    pub fn new(name: &str) -> Result<Self, RepoNameError> {
        let name = name.trim().trim_matches('/');
        let split = name
            .rfind('/')
            .ok_or_else(|| RepoNameError::MissingGroup(name.to_string()))?;

        for segment in name.split('/') {
            if segment.is_empty() {
                return Err(RepoNameError::EmptySegment(name.to_string()));
            }
            if segment == "." || segment == ".." {
                return Err(RepoNameError::InvalidSegment(
                    name.to_string(),
                    segment.to_string(),
                ));
            }
        }

        Ok(Self {
            name: name.to_string(),
            split,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// 最後のセグメントを除いた部分（例: `org/team`）
    pub fn group(&self) -> &str {
        &self.name[..self.split]
    }

    /// 最後のセグメント
    pub fn base(&self) -> &str {
        &self.name[self.split + 1..]
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl TryFrom<String> for RepoName {
    type Error = RepoNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RepoName> for String {
    fn from(value: RepoName) -> Self {
        value.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        let name = RepoName::new("acme/widget").unwrap();
        assert_eq!(name.as_str(), "acme/widget");
        assert_eq!(name.group(), "acme");
        assert_eq!(name.base(), "widget");
    }

    #[test]
    fn test_nested_group() {
        let name = RepoName::new("/platform/infra/tools/deploy/").unwrap();
        assert_eq!(name.as_str(), "platform/infra/tools/deploy");
        assert_eq!(name.group(), "platform/infra/tools");
        assert_eq!(name.base(), "deploy");
    }

    #[test]
    fn test_missing_group() {
        assert_eq!(
            RepoName::new("widget"),
            Err(RepoNameError::MissingGroup("widget".to_string()))
        );
        assert!(RepoName::new("/widget/").is_err());
        assert!(RepoName::new("").is_err());
    }

    #[test]
    fn test_invalid_segments() {
        assert!(matches!(
            RepoName::new("a//b"),
            Err(RepoNameError::EmptySegment(_))
        ));
        assert!(matches!(
            RepoName::new("../etc"),
            Err(RepoNameError::InvalidSegment(_, _))
        ));
    }

    #[test]
    fn test_into_grove_error() {
        let error: GroveError = RepoName::new("nogroup").unwrap_err().into();
        assert!(matches!(error, GroveError::ValidationError { .. }));
    }

    #[test]
    fn test_serde_as_string() {
        let name = RepoName::new("a/b").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"a/b\"");
        let parsed: Result<RepoName, _> = serde_json::from_str("\"nogroup\"");
        assert!(parsed.is_err());
    }
}
