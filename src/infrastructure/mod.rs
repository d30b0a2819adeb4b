/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - File system persistence (index, keywords, configuration)
/// - Git checkouts
/// - Process execution for scripted jobs
/// - HTTP downloads
pub mod download;
pub mod filesystem;
pub mod git;
pub mod process;

pub use filesystem::{ConfigPaths, ConfigStore, GroveConfig, KeywordStore, WorkspaceIndex};
pub use git::CloneSpec;
pub use process::JobSpec;
