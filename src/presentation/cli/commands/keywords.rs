use anyhow::Result;

use crate::presentation::cli::session::Session;

/// Handler for the keywords command
pub struct KeywordsCommand;

impl KeywordsCommand {
    pub fn execute(&self, session: &Session) -> Result<()> {
        let keywords = session.keywords()?;
        for keyword in keywords.list() {
            println!("{keyword}");
        }
        keywords.close()?;
        Ok(())
    }
}
