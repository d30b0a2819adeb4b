use anyhow::Result;
use std::path::PathBuf;

use crate::application::use_cases::run_job::{RunJobConfig, RunJobUseCase};
use crate::presentation::cli::session::Session;
use crate::presentation::ui::DisplayHelper;

/// Handler for the run command
pub struct RunCommand {
    pub command: String,
    pub remote: Option<String>,
    pub group: Option<String>,
    pub filter: Option<String>,
    pub jobs: Option<usize>,
    pub log_path: Option<PathBuf>,
}

impl RunCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        let config = RunJobConfig::new(&self.command)
            .with_remote(self.remote.clone())
            .with_group(self.group.clone())
            .with_filter(self.filter.clone())
            .with_workers(Some(session.workers(self.jobs)))
            .with_log_path(self.log_path.clone());
        let result = RunJobUseCase::new(config).execute(&session.index, &session.config)?;

        if result.repositories.is_empty() {
            display.warning("No repository matched");
        } else {
            display.success(&format!(
                "Ran {} on {} repositories",
                self.command,
                result.repositories.len()
            ));
        }
        Ok(())
    }
}
