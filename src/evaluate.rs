use crate::correctness::CorrectnessChecker;
use crate::profile::{Profiler, Series};
use crate::{Candidate, Loader};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Why a candidate could not be fully evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The entry point could not be bound, or the source not persisted.
    CandidateLoad,
    /// The test suite ran out of time.
    CorrectnessTimeout,
    /// The test suite ran to completion and reported failures.
    CorrectnessFailure,
    /// The solver panicked or ran over budget while being profiled.
    PerformanceMeasurement,
}

/// Evaluation of one candidate, before batch-level scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResult {
    pub id: String,
    /// 1.0 if the suite passed, 0.0 otherwise.
    pub correctness: f64,
    pub runtime_ms: Series,
    pub memory_kb: Series,
    pub diagnostic: String,
    pub failure: Option<FailureKind>,
}

impl RawResult {
    /// A result with correctness 0.0 and no performance data.
    pub fn failed<T: AsRef<str>>(id: T, kind: FailureKind, diagnostic: String) -> Self {
        Self {
            id: id.as_ref().to_owned(),
            correctness: 0.0,
            runtime_ms: Series::new(),
            memory_kb: Series::new(),
            diagnostic,
            failure: Some(kind),
        }
    }
}

/// Correctness check followed, on success only, by profiling.
pub struct Evaluator {
    loader: Box<dyn Loader + Send>,
    checker: CorrectnessChecker,
    profiler: Profiler,
}

impl Evaluator {
    pub fn new<L: Loader + Send + 'static>(
        loader: L,
        checker: CorrectnessChecker,
        profiler: Profiler,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            checker,
            profiler,
        }
    }

    /// Evaluate `candidate`, whose source has been persisted at `source`.
    ///
    /// Never fails: whatever goes wrong is recorded in the result.
    pub async fn evaluate(&mut self, candidate: &Candidate, source: &Path) -> RawResult {
        let solver = match self.loader.load(candidate) {
            Ok(s) => s,
            Err(e) => {
                warn!("{}", e);
                return RawResult::failed(&candidate.id, FailureKind::CandidateLoad, e.to_string());
            }
        };

        info!("{}: running correctness suite", candidate.id);
        let verdict = self.checker.check(candidate, source).await;
        if !verdict.passed {
            let kind = if verdict.timed_out {
                FailureKind::CorrectnessTimeout
            } else {
                FailureKind::CorrectnessFailure
            };
            info!("{}: {:?}, skipping profiling", candidate.id, kind);
            return RawResult::failed(&candidate.id, kind, verdict.diagnostic);
        }

        info!("{}: correctness passed, profiling", candidate.id);
        match self.profiler.profile(&solver) {
            Ok((runtime_ms, memory_kb)) => RawResult {
                id: candidate.id.clone(),
                correctness: 1.0,
                runtime_ms,
                memory_kb,
                diagnostic: verdict.diagnostic,
                failure: None,
            },
            Err(e) => {
                warn!("{}: {}", candidate.id, e);
                RawResult {
                    id: candidate.id.clone(),
                    correctness: 1.0,
                    runtime_ms: Series::new(),
                    memory_kb: Series::new(),
                    diagnostic: format!("{}\n{}", verdict.diagnostic, e),
                    failure: Some(FailureKind::PerformanceMeasurement),
                }
            }
        }
    }
}
