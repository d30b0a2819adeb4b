use std::process::{Command, Stdio};
use tracing::debug;

use crate::common::error::GroveError;
use crate::common::result::GroveResult;

/// コマンドを実行し、stdoutとstderrをまとめて返す
///
/// 終了コードが0以外の場合は、キャプチャした出力を持つ `CommandError` を返す。
pub fn run_captured(command: &mut Command, label: &str) -> GroveResult<String> {
    debug!("Running {}", label);
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            GroveError::command_error_with_source(format!("failed to start {label}"), label, e)
        })?;

    let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
    captured.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        return Ok(captured);
    }
    let message = match output.status.code() {
        Some(code) => format!("{label} exited with status {code}"),
        None => format!("{label} was terminated by a signal"),
    };
    Err(GroveError::command_error(
        message,
        label,
        output.status.code(),
        captured,
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_success_captures_output() {
        let out = run_captured(Command::new("sh").args(["-c", "echo hello"]), "sh").unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_failure_keeps_output() {
        let err = run_captured(
            Command::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]),
            "sh",
        )
        .unwrap_err();
        assert!(matches!(err, GroveError::CommandError { exit_code: Some(3), .. }));
        assert_eq!(err.captured_output(), Some("out\nerr\n"));
    }

    #[test]
    fn test_missing_program() {
        let err = run_captured(&mut Command::new("grove-no-such-program"), "missing").unwrap_err();
        assert!(matches!(err, GroveError::CommandError { exit_code: None, .. }));
    }
}
