//! One validator invocation: spawn, feed stdin, capture output, wait.

use std::path::PathBuf;
use std::process::Stdio;

use jsonlint_types::{LintResult, ValidatorSettings};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};

use crate::error::LintError;
use crate::parser::{self, OutputCollector};

/// Program, arguments and working directory of a validator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ValidatorCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    /// `<runner> <package> <args...>`, run from the install directory.
    #[must_use]
    pub fn from_settings(settings: &ValidatorSettings) -> Self {
        Self::new(settings.runner(), settings.runner_args())
            .current_dir(settings.install_dir().to_path_buf())
    }

    #[must_use]
    pub fn current_dir(mut self, dir: PathBuf) -> Self {
        self.cwd = Some(dir);
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Outcome of a validator process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorRun {
    success: bool,
    output: String,
}

impl ValidatorRun {
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    /// Combined stdout/stderr, each line right-trimmed.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Parsed results; empty on a successful exit.
    #[must_use]
    pub fn results(&self) -> Vec<LintResult> {
        parser::results_for_exit(self.success, &self.output)
    }
}

/// Run the validator over `text`.
///
/// Stdin is written concurrently with reading stdout/stderr so a large
/// document can't deadlock against a full output pipe. There is no timeout:
/// the process runs to completion.
pub async fn run_validator(command: &ValidatorCommand, text: &str) -> Result<ValidatorRun, LintError> {
    let program = command.program();
    let mut cmd = Command::new(program);
    cmd.args(command.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &command.cwd
        && dir.is_dir()
    {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| LintError::ProcessStart {
        program: program.to_string(),
        source,
    })?;

    let missing = |stream| LintError::MissingStream {
        program: program.to_string(),
        stream,
    };
    let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

    let ((), output) = tokio::join!(
        write_input(stdin, text, program),
        capture_output(stdout, stderr)
    );

    let status = child.wait().await.map_err(|source| LintError::Io {
        program: program.to_string(),
        source,
    })?;
    tracing::trace!(%status, bytes = output.len(), "{program} exited");

    Ok(ValidatorRun {
        success: status.success(),
        output,
    })
}

/// Write the whole document, then close stdin.
async fn write_input(mut stdin: ChildStdin, text: &str, program: &str) {
    // The validator may bail out before reading everything; a broken pipe
    // here is not a failed run.
    if let Err(e) = stdin.write_all(text.as_bytes()).await {
        tracing::debug!("Writing to {program} stdin: {e}");
        return;
    }
    if let Err(e) = stdin.shutdown().await {
        tracing::debug!("Closing {program} stdin: {e}");
    }
}

/// Interleave stdout and stderr lines in arrival order.
async fn capture_output<O, E>(stdout: O, stderr: E) -> String
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout).split(b'\n');
    let mut err = BufReader::new(stderr).split(b'\n');
    let mut out_open = true;
    let mut err_open = true;
    let mut collector = OutputCollector::default();

    while out_open || err_open {
        tokio::select! {
            segment = out.next_segment(), if out_open => {
                out_open = collect_segment(&mut collector, segment, "stdout");
            }
            segment = err.next_segment(), if err_open => {
                err_open = collect_segment(&mut collector, segment, "stderr");
            }
        }
    }

    collector.into_output()
}

/// Returns whether the stream is still open.
fn collect_segment(
    collector: &mut OutputCollector,
    segment: std::io::Result<Option<Vec<u8>>>,
    stream: &str,
) -> bool {
    match segment {
        Ok(Some(bytes)) => {
            collector.push_line(&String::from_utf8_lossy(&bytes));
            true
        }
        Ok(None) => false,
        Err(e) => {
            tracing::debug!("Reading validator {stream}: {e}");
            false
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ValidatorCommand {
        ValidatorCommand::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn failing_run_is_parsed() {
        let cmd = sh("cat >/dev/null; echo \"line 3, col 10, found: ']' - expected: ','   \" >&2; exit 1");
        let run = run_validator(&cmd, "[1,]").await.unwrap();
        assert!(!run.success());
        assert_eq!(run.output(), "line 3, col 10, found: ']' - expected: ','");
        assert_eq!(run.results(), vec![LintResult::new(3, 10, "]", ",")]);
    }

    #[tokio::test]
    async fn successful_exit_has_no_results_even_with_matching_output() {
        let cmd = sh("cat >/dev/null; echo \"line 1, col 1, found: 'x' - expected: 'y'\"");
        let run = run_validator(&cmd, "{}").await.unwrap();
        assert!(run.success());
        assert!(run.results().is_empty());
    }

    #[tokio::test]
    async fn document_reaches_stdin() {
        let cmd = sh("cat; exit 3");
        let run = run_validator(&cmd, "{\n  \"a\": 1  \n}\n").await.unwrap();
        assert!(!run.success());
        assert_eq!(run.output(), "{  \"a\": 1}");
        assert!(run.results().is_empty());
    }

    #[tokio::test]
    async fn large_document_does_not_deadlock() {
        let text = "x".repeat(512 * 1024);
        let cmd = sh("cat");
        let run = run_validator(&cmd, &text).await.unwrap();
        assert_eq!(run.output().len(), text.len());
    }

    #[tokio::test]
    async fn validator_ignoring_stdin_is_not_an_error() {
        let text = "y".repeat(1024 * 1024);
        let run = run_validator(&sh("exit 1"), &text).await.unwrap();
        assert!(!run.success());
        assert!(run.output().is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_start_failure() {
        let cmd = ValidatorCommand::new("jsonlint-ls-no-such-runner", vec![]);
        let err = run_validator(&cmd, "{}").await.unwrap_err();
        assert!(matches!(err, LintError::ProcessStart { .. }));
    }

    #[tokio::test]
    async fn missing_working_directory_is_ignored() {
        let cmd = sh("exit 0").current_dir(PathBuf::from("/nonexistent/jsonlint-ls"));
        assert!(run_validator(&cmd, "").await.unwrap().success());
    }
}
