use anyhow::Result;
use serde::Serialize;

use crate::domain::entities::repository::{groups_of, now_unix, sort_by_score_at, Repository};
use crate::presentation::cli::session::Session;
use crate::presentation::cli::OutputFormat;
use crate::presentation::ui::DisplayHelper;

/// listの出力エントリ
#[derive(Debug, Serialize)]
pub struct ListEntry<'a> {
    pub remote: &'a str,
    pub name: &'a str,
    pub path: String,
    pub access_count: u64,
    pub last_access: i64,
    pub score: u64,
}

/// Handler for the list command
pub struct ListCommand {
    pub remote: Option<String>,
    pub group: Option<String>,
    pub groups: bool,
    pub output: OutputFormat,
}

impl ListCommand {
    pub fn execute(&self, session: &Session, display: &DisplayHelper) -> Result<()> {
        let now = now_unix();
        let mut repos: Vec<Repository> = session
            .index
            .list(self.remote.as_deref().unwrap_or(""))
            .into_iter()
            .filter(|repo| match &self.group {
                Some(group) => repo.name().starts_with(&format!("{}/", group.trim_matches('/'))),
                None => true,
            })
            .collect();
        sort_by_score_at(&mut repos, now);

        if self.groups {
            let groups = groups_of(&repos);
            match self.output {
                OutputFormat::Text => groups.iter().for_each(|group| println!("{group}")),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&groups)?),
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&groups)?),
            }
            return Ok(());
        }

        let entries: Vec<ListEntry> = repos
            .iter()
            .map(|repo| ListEntry {
                remote: repo.remote(),
                name: repo.name(),
                path: repo.path().display().to_string(),
                access_count: repo.access_count(),
                last_access: repo.last_access(),
                score: repo.score_at(now),
            })
            .collect();

        match self.output {
            OutputFormat::Text => {
                let rows: Vec<Vec<String>> = entries
                    .iter()
                    .map(|entry| {
                        vec![
                            format!("{}:{}", entry.remote, entry.name),
                            entry.access_count.to_string(),
                            entry.score.to_string(),
                            entry.path.clone(),
                        ]
                    })
                    .collect();
                display.print_table(&["NAME", "ACCESS", "SCORE", "PATH"], &rows);
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&entries)?),
        }
        Ok(())
    }
}
