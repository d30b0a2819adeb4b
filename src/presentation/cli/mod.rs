pub mod commands;
pub mod session;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::exit;

use crate::common::error::GroveError;
use crate::presentation::ui::DisplayHelper;
use commands::{
    AttachCommand, DownloadCommand, HomeCommand, JumpCommand, KeywordsCommand, ListCommand,
    RemoveCommand, RunCommand, SyncCommand,
};
use session::Session;

/// Output format options for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// grove - A local workspace manager for git repositories
#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "A local workspace manager for git repositories")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " ",
    env!("BUILD_DATE"),
    ")"
))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List repositories ordered by score
    List {
        /// Only list repositories of this remote
        #[arg(short, long)]
        remote: Option<String>,

        /// Only list repositories under this group
        #[arg(short, long)]
        group: Option<String>,

        /// List groups instead of repositories
        #[arg(long)]
        groups: bool,

        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Enter a repository, cloning it when missing
    Home {
        /// Remote name
        remote: String,

        /// Repository name (group/base)
        name: String,
    },

    /// Jump to the best ranked repository
    Jump {
        /// Only consider repositories of this remote
        #[arg(short, long)]
        remote: Option<String>,

        /// Keyword the repository name must contain
        keyword: Option<String>,
    },

    /// Attach an existing directory to a repository
    Attach {
        /// Remote name
        remote: String,

        /// Repository name (group/base)
        name: String,

        /// Directory to attach (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Remove a repository from the index
    Remove {
        /// Remote name (omit both to remove the repository containing the current directory)
        #[arg(requires = "name")]
        remote: Option<String>,

        /// Repository name (group/base)
        name: Option<String>,

        /// Also delete the directory on disk
        #[arg(short, long)]
        all: bool,
    },

    /// Sync the index with the workspace, cloning missing repositories
    Sync {
        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Where to write the failure log
        #[arg(long)]
        log_path: Option<PathBuf>,

        /// Only add discovered checkouts, do not clone
        #[arg(long)]
        no_clone: bool,
    },

    /// Run a shell command in each repository
    Run {
        /// Command to run (through bash -c)
        command: String,

        /// Only run in repositories of this remote
        #[arg(short, long)]
        remote: Option<String>,

        /// Only run in repositories under this group
        #[arg(short, long)]
        group: Option<String>,

        /// Regex the repository name must match
        #[arg(short, long)]
        filter: Option<String>,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Where to write the failure log
        #[arg(long)]
        log_path: Option<PathBuf>,
    },

    /// Download files in parallel
    Download {
        /// URLs to download
        #[arg(required = true)]
        urls: Vec<String>,

        /// Destination directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Where to write the failure log
        #[arg(long)]
        log_path: Option<PathBuf>,
    },

    /// List recent jump keywords
    Keywords,
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn verbose(&self) -> bool {
        self.cli.verbose
    }

    pub fn run(self) -> anyhow::Result<()> {
        colored::control::set_override(!self.cli.no_color && atty::is(atty::Stream::Stderr));
        let display = DisplayHelper::new(!self.cli.no_color);

        match self.handle_command(&display) {
            Ok(()) => Ok(()),
            Err(e) => {
                display.error(&e.to_string());
                if let Some(hint) = e.downcast_ref::<GroveError>().and_then(GroveError::hint) {
                    eprintln!("{}", hint);
                }
                exit(1);
            }
        }
    }

    fn handle_command(&self, display: &DisplayHelper) -> anyhow::Result<()> {
        match &self.cli.command {
            Commands::List {
                remote,
                group,
                groups,
                output,
            } => {
                let command = ListCommand {
                    remote: remote.clone(),
                    group: group.clone(),
                    groups: *groups,
                    output: *output,
                };
                Session::open_read_only()?.run(|session| command.execute(session, display))
            }
            Commands::Home { remote, name } => {
                let command = HomeCommand {
                    remote: remote.clone(),
                    name: name.clone(),
                };
                Session::open()?.run(|session| command.execute(session, display))
            }
            Commands::Jump { remote, keyword } => {
                let command = JumpCommand {
                    remote: remote.clone(),
                    keyword: keyword.clone(),
                };
                Session::open()?.run(|session| command.execute(session))
            }
            Commands::Attach { remote, name, path } => {
                let command = AttachCommand {
                    remote: remote.clone(),
                    name: name.clone(),
                    path: path.clone(),
                };
                Session::open()?.run(|session| command.execute(session, display))
            }
            Commands::Remove { remote, name, all } => {
                let command = RemoveCommand {
                    remote: remote.clone(),
                    name: name.clone(),
                    all: *all,
                };
                Session::open()?.run(|session| command.execute(session, display))
            }
            Commands::Sync {
                jobs,
                log_path,
                no_clone,
            } => {
                let command = SyncCommand {
                    jobs: *jobs,
                    log_path: log_path.clone(),
                    no_clone: *no_clone,
                };
                Session::open()?.run(|session| command.execute(session, display))
            }
            Commands::Run {
                command,
                remote,
                group,
                filter,
                jobs,
                log_path,
            } => {
                let command = RunCommand {
                    command: command.clone(),
                    remote: remote.clone(),
                    group: group.clone(),
                    filter: filter.clone(),
                    jobs: *jobs,
                    log_path: log_path.clone(),
                };
                Session::open_read_only()?.run(|session| command.execute(session, display))
            }
            Commands::Download {
                urls,
                dir,
                jobs,
                log_path,
            } => {
                let command = DownloadCommand {
                    urls: urls.clone(),
                    dir: dir.clone(),
                    jobs: *jobs,
                    log_path: log_path.clone(),
                };
                Session::open_read_only()?.run(|session| command.execute(session, display))
            }
            Commands::Keywords => {
                Session::open_read_only()?.run(|session| KeywordsCommand.execute(session))
            }
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from(["grove", "run", "git fetch", "-r", "github", "-j", "4"]);
        match cli.command {
            Commands::Run {
                command,
                remote,
                jobs,
                ..
            } => {
                assert_eq!(command, "git fetch");
                assert_eq!(remote.as_deref(), Some("github"));
                assert_eq!(jobs, Some(4));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_remove_target() {
        let cli = Cli::parse_from(["grove", "remove"]);
        assert!(matches!(
            cli.command,
            Commands::Remove {
                remote: None,
                name: None,
                all: false
            }
        ));

        let cli = Cli::parse_from(["grove", "remove", "github", "acme/widget", "-a"]);
        match cli.command {
            Commands::Remove { remote, name, all } => {
                assert_eq!(remote.as_deref(), Some("github"));
                assert_eq!(name.as_deref(), Some("acme/widget"));
                assert!(all);
            }
            _ => panic!("expected remove"),
        }

        // a remote without a name is rejected
        assert!(Cli::try_parse_from(["grove", "remove", "github"]).is_err());
    }
}
