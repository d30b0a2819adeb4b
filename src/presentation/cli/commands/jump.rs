use anyhow::Result;

use crate::application::use_cases::jump::{JumpConfig, JumpUseCase};
use crate::presentation::cli::session::Session;

/// Handler for the jump command
pub struct JumpCommand {
    pub remote: Option<String>,
    pub keyword: Option<String>,
}

impl JumpCommand {
    pub fn execute(&self, session: &Session) -> Result<()> {
        let keywords = session.keywords()?;
        let use_case = JumpUseCase::new(JumpConfig {
            remote: self.remote.clone(),
            keyword: self.keyword.clone(),
        });
        let result = use_case.execute(&session.index, &keywords);
        keywords.close()?;

        println!("{}", result?.path().display());
        Ok(())
    }
}
