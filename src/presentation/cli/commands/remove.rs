use anyhow::Result;

use crate::common::result::OptionExt;
use crate::presentation::cli::session::Session;
use crate::presentation::ui::DisplayHelper;

/// Handler for the remove command
pub struct RemoveCommand {
    /// 省略時はカレントディレクトリを含むリポジトリ
    pub remote: Option<String>,
    pub name: Option<String>,

    /// ディスク上のディレクトリも削除する
    pub all: bool,
}

impl RemoveCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        let repo = match (&self.remote, &self.name) {
            (Some(remote), Some(name)) => session
                .index
                .get_by_name(remote, name)
                .ok_or_not_found(format!("repo {remote}:{name} not found"))?,
            _ => session.index.get_current()?,
        };

        if self.all {
            session.index.delete_all(&repo)?;
            display.success(&format!(
                "Removed {} and {}",
                display.format_repo(&repo.full_name()),
                display.format_path(&repo.path().display().to_string())
            ));
        } else {
            session.index.delete(&repo);
            display.success(&format!("Removed {}", display.format_repo(&repo.full_name())));
        }
        Ok(())
    }
}
