use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::common::error::GroveError;
use crate::common::result::{GroveResult, ResultExt};

/// 失敗したタスクとそのエラー
#[derive(Debug)]
pub struct FailedTask {
    pub name: String,
    pub error: GroveError,
}

impl FailedTask {
    pub fn new(name: impl Into<String>, error: GroveError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

/// 失敗ログ
///
/// 失敗したタスクごとに一つのセクションを持つ。セクションは
/// `=> handle <name> failed: <error>` の見出し行、キャプチャされた出力
/// （あれば）、空行で構成される。セクションの順序は完了順。
#[derive(Debug)]
pub struct FailureReport {
    failures: Vec<FailedTask>,
}

impl FailureReport {
    pub fn new(failures: Vec<FailedTask>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[FailedTask] {
        &self.failures
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for failure in &self.failures {
            let _ = writeln!(out, "=> handle {} failed: {}", failure.name, failure.error);
            if let Some(output) = failure.error.captured_output() {
                out.push_str(output);
                if !output.ends_with('\n') {
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> GroveResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_filesystem_error(
                "Failed to create log directory",
                Some(parent.to_path_buf()),
            )?;
        }
        fs::write(path, self.render())
            .with_filesystem_error("Failed to write failure log", Some(path.to_path_buf()))?;
        info!(
            "Wrote {} failure section(s) to {}",
            self.failures.len(),
            path.display()
        );
        Ok(())
    }
}
