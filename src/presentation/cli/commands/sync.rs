use anyhow::Result;
use std::path::PathBuf;

use crate::application::use_cases::sync_repositories::{SyncRepositoriesConfig, SyncRepositoriesUseCase};
use crate::presentation::cli::session::Session;
use crate::presentation::ui::DisplayHelper;

/// Handler for the sync command
pub struct SyncCommand {
    pub jobs: Option<usize>,
    pub log_path: Option<PathBuf>,
    pub no_clone: bool,
}

impl SyncCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        let config = SyncRepositoriesConfig::default()
            .with_workers(Some(session.workers(self.jobs)))
            .with_log_path(self.log_path.clone())
            .with_skip_clone(self.no_clone);
        let result = SyncRepositoriesUseCase::new(config).execute(&session.index, &session.config)?;

        for name in &result.added {
            display.info(&format!("Added {}", display.format_repo(name)));
        }
        if result.added.is_empty() && result.cloned == 0 {
            display.success("Workspace is up to date");
        } else {
            display.success(&format!(
                "Sync done: {} added, {} cloned",
                result.added.len(),
                result.cloned
            ));
        }
        Ok(())
    }
}
