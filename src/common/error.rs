use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroveError {
    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Conflict: {message}")]
    ConflictError { message: String },

    #[error("{message}")]
    NotFoundError { message: String },

    #[error("Data file is corrupted: {message}")]
    CorruptionError { path: PathBuf, message: String },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Git operation failed: {message}")]
    GitError {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Command execution failed: {message}")]
    CommandError {
        message: String,
        command: String,
        exit_code: Option<i32>,
        output: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Network operation failed: {message}")]
    NetworkError {
        message: String,
        url: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("{operation} failed with {}, see {}", plural_errors(.failed), .log_path.display())]
    TaskFailures {
        operation: String,
        failed: usize,
        log_path: PathBuf,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn plural_errors(count: &usize) -> String {
    if *count == 1 {
        "1 error".to_string()
    } else {
        format!("{count} errors")
    }
}

impl GroveError {
    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self::ConflictError {
            message: message.into(),
        }
    }

    pub fn not_found_error(message: impl Into<String>) -> Self {
        Self::NotFoundError {
            message: message.into(),
        }
    }

    pub fn corruption_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptionError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn filesystem_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn serialization_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn git_error_with_source(message: impl Into<String>, source: git2::Error) -> Self {
        Self::GitError {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn command_error(
        message: impl Into<String>,
        command: impl Into<String>,
        exit_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandError {
            message: message.into(),
            command: command.into(),
            exit_code,
            output: output.into(),
            source: None,
        }
    }

    pub fn command_error_with_source(
        message: impl Into<String>,
        command: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::CommandError {
            message: message.into(),
            command: command.into(),
            exit_code: None,
            output: String::new(),
            source: Some(source),
        }
    }

    pub fn network_error(message: impl Into<String>, url: Option<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
            url,
            source: None,
        }
    }

    pub fn network_error_with_source(
        message: impl Into<String>,
        url: Option<String>,
        source: reqwest::Error,
    ) -> Self {
        Self::NetworkError {
            message: message.into(),
            url,
            source: Some(source),
        }
    }

    pub fn task_failures(
        operation: impl Into<String>,
        failed: usize,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self::TaskFailures {
            operation: operation.into(),
            failed,
            log_path: log_path.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Text captured from a failed subprocess, written verbatim into failure logs.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::CommandError { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }

    /// Follow-up instruction shown to the user after the error itself.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::CorruptionError { path, .. } => Some(format!(
                "The repository data is broken, please fix or delete it: {}",
                path.display()
            )),
            _ => None,
        }
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptionError { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictError { .. })
    }
}

impl From<git2::Error> for GroveError {
    fn from(error: git2::Error) -> Self {
        Self::git_error_with_source("Git operation failed", error)
    }
}

impl From<std::io::Error> for GroveError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_yaml::Error> for GroveError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::serialization_error_with_source("YAML serialization failed", error)
    }
}

impl From<serde_json::Error> for GroveError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization_error_with_source("JSON serialization failed", error)
    }
}

impl From<reqwest::Error> for GroveError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string());
        Self::network_error_with_source("Network request failed", url, error)
    }
}

impl From<anyhow::Error> for GroveError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal_error(format!("Anyhow error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = GroveError::validation_error("name", "missing group", Some("foo".to_string()));
        assert_eq!(error.to_string(), "Validation error: name - missing group");
    }

    #[test]
    fn test_corruption_error_hint() {
        let error = GroveError::corruption_error("/data/repo", "unexpected end of file");
        assert!(error.is_corruption());
        assert_eq!(
            error.to_string(),
            "Data file is corrupted: unexpected end of file"
        );
        assert_eq!(
            error.hint().as_deref(),
            Some("The repository data is broken, please fix or delete it: /data/repo")
        );
    }

    #[test]
    fn test_task_failures_message() {
        let error = GroveError::task_failures("sync", 2, "/tmp/grove/logs/sync");
        assert_eq!(
            error.to_string(),
            "sync failed with 2 errors, see /tmp/grove/logs/sync"
        );

        let error = GroveError::task_failures("download", 1, "/tmp/log");
        assert_eq!(error.to_string(), "download failed with 1 error, see /tmp/log");
    }

    #[test]
    fn test_captured_output() {
        let error = GroveError::command_error("exit status 128", "git clone", Some(128), "fatal: repo");
        assert_eq!(error.captured_output(), Some("fatal: repo"));

        let error = GroveError::command_error("exit status 1", "false", Some(1), "");
        assert_eq!(error.captured_output(), None);

        let error = GroveError::internal_error("boom");
        assert_eq!(error.captured_output(), None);
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let grove_error: GroveError = io_error.into();
        assert!(matches!(grove_error, GroveError::FileSystemError { .. }));
    }
}
