//! Validator output parsing.
//!
//! `jsonlint -c` prints at most one problem per run, e.g.
//! `line 3, col 10, found: ']' - expected: ','`. Anything that doesn't match
//! is treated as "no issue".

use std::sync::OnceLock;

use jsonlint_types::LintResult;
use regex::Regex;

fn diagnostic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"line (\d+), col (\d+), found: '([^']+)' - expected: '([^']+)'")
            .expect("diagnostic pattern is valid")
    })
}

/// Extract the first diagnostic from captured output.
///
/// Only the first match counts. Line or column values that overflow `u32`
/// are treated as no match.
#[must_use]
pub fn parse_output(output: &str) -> Vec<LintResult> {
    let Some(caps) = diagnostic_pattern().captures(output) else {
        return Vec::new();
    };

    let (Ok(line), Ok(column)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
        tracing::debug!("Validator position out of range: {}", &caps[0]);
        return Vec::new();
    };

    vec![LintResult::new(line, column, &caps[3], &caps[4])]
}

/// Results for a finished run. Exit status is authoritative: a successful
/// exit means no issues, whatever was printed.
#[must_use]
pub fn results_for_exit(success: bool, output: &str) -> Vec<LintResult> {
    if success {
        Vec::new()
    } else {
        parse_output(output)
    }
}

/// Accumulates stdout/stderr lines the way the parser expects them: each
/// line right-trimmed, then concatenated with no separator.
#[derive(Debug, Default)]
pub struct OutputCollector {
    buf: String,
}

impl OutputCollector {
    pub fn push_line(&mut self, line: &str) {
        self.buf.push_str(line.trim_end());
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.buf
    }
}
