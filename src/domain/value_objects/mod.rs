pub mod repo_name;

pub use repo_name::{RepoName, RepoNameError};
