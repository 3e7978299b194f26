use crate::run::{ProcessResult, Run};
use crate::Candidate;
use byte_unit::Byte;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the external test suite is invoked.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorrectnessConfig {
    /// Command line of the test suite.  In every argument, `%e` is
    /// replaced by the entry point, `%i` by the candidate id, `%s` by the
    /// path of the persisted source and `%%` by `%`.
    pub command: Vec<String>,
    #[serde_as(as = "serde_with::DurationSeconds<f64, serde_with::formats::Flexible>")]
    pub timeout: Duration,
    /// Substrings of stdout which fail a run even if it exits with 0.
    pub fail_markers: Vec<String>,
    /// Limit of captured stdout and of captured stderr.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub output_max: Byte,
    /// Working directory of the suite, the current one if unset.
    pub work_dir: Option<PathBuf>,
}

impl Default for CorrectnessConfig {
    fn default() -> Self {
        Self {
            command: vec![],
            timeout: Duration::from_secs(60),
            fail_markers: vec!["failed".to_owned(), "error".to_owned()],
            output_max: Byte::from_u64(4 * 1024 * 1024),
            work_dir: None,
        }
    }
}

/// Pass or fail, with the suite output kept for reporting either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectnessVerdict {
    pub passed: bool,
    /// stdout and stderr of the suite, joined by a newline.
    pub diagnostic: String,
    pub timed_out: bool,
}

/// Map a finished suite run to a verdict.
pub fn verdict(r: &ProcessResult, fail_markers: &[String]) -> CorrectnessVerdict {
    let marked = fail_markers
        .iter()
        .any(|m| !m.is_empty() && r.stdout.contains(m.as_str()));
    CorrectnessVerdict {
        passed: r.is_success() && !marked,
        diagnostic: format!("{}\n{}", r.stdout, r.stderr),
        timed_out: r.timed_out,
    }
}

fn expand(arg: &str, c: &Candidate, source: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('e') => out.push_str(&c.entry),
            Some('i') => out.push_str(&c.id),
            Some('s') => out.push_str(source),
            Some('%') => out.push('%'),
            Some(x) => {
                out.push('%');
                out.push(x);
            }
            None => out.push('%'),
        }
    }
    out
}

/// Runs the test suite for one candidate in a child process.
///
/// The candidate is handed to the suite through the command line and the
/// environment (`AUTOALGO_CANDIDATE`, `AUTOALGO_ENTRY`,
/// `AUTOALGO_SOLUTION`), never through a shared file.
pub struct CorrectnessChecker {
    cfg: CorrectnessConfig,
}

impl CorrectnessChecker {
    pub fn new(cfg: CorrectnessConfig) -> Self {
        Self { cfg }
    }

    pub async fn check(&self, candidate: &Candidate, source: &Path) -> CorrectnessVerdict {
        let source = source.to_string_lossy();
        let argv = self
            .cfg
            .command
            .iter()
            .map(|x| expand(x, candidate, &source))
            .collect::<Vec<_>>();

        let (prog, args) = match argv.split_first() {
            Some(x) => x,
            None => {
                let r = ProcessResult::launch_failure("no test command configured");
                return verdict(&r, &self.cfg.fail_markers);
            }
        };

        let mut run = Run::new(prog)
            .args(args)
            .env("AUTOALGO_CANDIDATE", &candidate.id)
            .env("AUTOALGO_ENTRY", &candidate.entry)
            .env("AUTOALGO_SOLUTION", &source)
            .timeout(self.cfg.timeout)
            .output_max(self.cfg.output_max);
        if let Some(d) = &self.cfg.work_dir {
            run = run.current_dir(d);
        }

        let r = run.run().await;
        let v = verdict(&r, &self.cfg.fail_markers);
        debug!(
            "{}: suite exit code {}, timed out {}, passed {}",
            candidate.id, r.exit_code, r.timed_out, v.passed
        );
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str, exit_code: i32, timed_out: bool) -> ProcessResult {
        ProcessResult {
            stdout: stdout.to_owned(),
            stderr: "warn".to_owned(),
            exit_code,
            timed_out,
        }
    }

    #[test]
    fn test_expand() {
        let c = Candidate::new("c1", "", "spfa");
        assert_eq!(expand("--entry=%e", &c, "/x/s.rs"), "--entry=spfa");
        assert_eq!(expand("%i:%s", &c, "/x/s.rs"), "c1:/x/s.rs");
        assert_eq!(expand("100%% %q %", &c, ""), "100% %q %");
        // A substituted value is never expanded again.
        let c = Candidate::new("%e", "", "spfa");
        assert_eq!(expand("%i", &c, ""), "%e");
    }

    #[test]
    fn test_verdict() {
        let markers = CorrectnessConfig::default().fail_markers;
        assert!(verdict(&result("8 passed", 0, false), &markers).passed);
        assert!(!verdict(&result("1 failed, 7 passed", 0, false), &markers).passed);
        assert!(!verdict(&result("collection error", 0, false), &markers).passed);
        assert!(!verdict(&result("8 passed", 3, false), &markers).passed);
        let v = verdict(&result("", -1, true), &markers);
        assert!(!v.passed && v.timed_out);
        assert_eq!(verdict(&result("out", 0, false), &markers).diagnostic, "out\nwarn");
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let markers = CorrectnessConfig::default().fail_markers;
        assert!(verdict(&result("FAILED 0, Error 0", 0, false), &markers).passed);
    }
}
