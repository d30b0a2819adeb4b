use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::domain::entities::repository::Repository;
use crate::presentation::cli::session::Session;
use crate::presentation::ui::DisplayHelper;

/// Handler for the attach command
pub struct AttachCommand {
    pub remote: String,
    pub name: String,
    pub path: Option<PathBuf>,
}

impl AttachCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        session.config.remote(&self.remote)?;

        let path = match &self.path {
            Some(path) => path.clone(),
            None => env::current_dir().context("Failed to get current directory")?,
        };
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        if !path.is_dir() {
            anyhow::bail!("{} is not a directory", path.display());
        }

        let workspace = Repository::workspace(&self.remote, &self.name, session.index.workspace_root())?;
        let repo = if workspace.path() == path {
            workspace
        } else {
            Repository::attach(&self.remote, &self.name, &path)?
        };
        let full_name = repo.full_name();
        session.index.add(repo)?;

        display.success(&format!(
            "Attached {} to {}",
            display.format_repo(&full_name),
            display.format_path(&path.display().to_string())
        ));
        Ok(())
    }
}
