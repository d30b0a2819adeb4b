use anyhow::Result;

use crate::application::use_cases::home::{HomeConfig, HomeUseCase};
use crate::presentation::cli::session::Session;
use crate::presentation::ui::DisplayHelper;

/// Handler for the home command
pub struct HomeCommand {
    pub remote: String,
    pub name: String,
}

impl HomeCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        let use_case = HomeUseCase::new(HomeConfig::new(&self.remote, &self.name));
        let result = use_case.execute(&session.index, &session.config)?;
        if result.cloned {
            display.success(&format!(
                "Cloned {}",
                display.format_repo(&result.repository.full_name())
            ));
        }
        println!("{}", result.repository.path().display());
        Ok(())
    }
}
