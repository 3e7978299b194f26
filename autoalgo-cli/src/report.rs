use crate::prelude::*;
use autoalgo::{BatchReport, FailureKind, ReportSink};
use std::fmt::Write;

/// Render the ranking as a fixed-width table.
pub fn ranking_table(report: &BatchReport) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{:>4}  {:<24} {:>7} {:>12} {:>12} {:>7}  {}",
        "rank", "id", "correct", "runtime_ms", "memory_kb", "score", "failure"
    );
    for (i, r) in report.candidates.iter().enumerate() {
        let failure = r
            .raw
            .failure
            .map_or_else(String::new, |f| format!("{:?}", f));
        let _ = writeln!(
            s,
            "{:>4}  {:<24} {:>7.1} {:>12.4} {:>12.2} {:>7.4}  {}",
            i + 1,
            r.raw.id,
            r.raw.correctness,
            r.avg_runtime_ms,
            r.avg_memory_kb,
            r.final_score,
            failure
        );
    }
    s
}

const CSV_HEADER: &str = "rank,id,correctness,avg_runtime_ms,avg_memory_kb,\
norm_correctness,norm_runtime,norm_memory,final_score,failure";

/// One row per ranked candidate, best first.  Averages without data are
/// left empty.
pub fn results_csv(report: &BatchReport) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{}", CSV_HEADER);
    for (i, r) in report.candidates.iter().enumerate() {
        let failure = r.raw.failure.map_or_else(String::new, failure_name);
        let _ = writeln!(
            s,
            "{},{},{},{},{},{},{},{},{},{}",
            i + 1,
            esc(&r.raw.id),
            r.raw.correctness,
            num(r.avg_runtime_ms),
            num(r.avg_memory_kb),
            r.norm_correctness,
            r.norm_runtime,
            r.norm_memory,
            r.final_score,
            failure
        );
    }
    s
}

fn failure_name(f: FailureKind) -> String {
    match serde_json::to_value(f) {
        Ok(serde_json::Value::String(s)) => s,
        _ => format!("{:?}", f),
    }
}

fn num(x: f64) -> String {
    if x.is_finite() {
        x.to_string()
    } else {
        String::new()
    }
}

fn esc(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

/// Writes `results.json`, `results.csv` and `metadata.json` into the
/// report directory of the batch.  Averages without data are written as
/// `null` in JSON.
pub struct JsonReportSink {
    dir: PathBuf,
    dry: bool,
}

impl JsonReportSink {
    pub fn new<P: AsRef<Path>>(dir: P, dry: bool) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            dry,
        }
    }

    fn write(&self, name: &str, content: String) -> autoalgo::Result<()> {
        let path = self.dir.join(name);
        std::fs::write(&path, content).map_err(|e| autoalgo::Error::Io(path.clone(), e))?;
        info!("report written to {}", path.display());
        Ok(())
    }
}

fn to_json<T: serde::Serialize>(v: &T) -> autoalgo::Result<String> {
    serde_json::to_string_pretty(v).map_err(|e| autoalgo::Error::Report(e.to_string()))
}

impl ReportSink for JsonReportSink {
    fn publish(&mut self, report: &BatchReport) -> autoalgo::Result<()> {
        for line in ranking_table(report).lines() {
            info!("{}", line);
        }

        if self.dry {
            info!("dry run, not writing reports to {}", self.dir.display());
            return Ok(());
        }

        self.write("results.json", to_json(report)?)?;
        self.write("results.csv", results_csv(report))?;
        self.write("metadata.json", to_json(&report.metadata)?)
    }
}
