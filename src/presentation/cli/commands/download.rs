use anyhow::Result;
use std::path::PathBuf;

use crate::application::use_cases::download_assets::{DownloadAssetsConfig, DownloadAssetsUseCase};
use crate::presentation::cli::session::Session;
use crate::presentation::ui::DisplayHelper;

/// Handler for the download command
pub struct DownloadCommand {
    pub urls: Vec<String>,
    pub dir: PathBuf,
    pub jobs: Option<usize>,
    pub log_path: Option<PathBuf>,
}

impl DownloadCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        let config = DownloadAssetsConfig::new(self.urls.clone(), &self.dir)
            .with_workers(session.workers(self.jobs))
            .with_log_path(self.log_path.clone());
        let result = DownloadAssetsUseCase::new(config).execute()?;
        for file in &result.files {
            display.success(&format!(
                "Downloaded {}",
                display.format_path(&file.display().to_string())
            ));
        }
        Ok(())
    }
}
