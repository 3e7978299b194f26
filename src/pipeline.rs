use crate::candidate::escape_dir_name;
use crate::evaluate::{Evaluator, FailureKind, RawResult};
use crate::score::{score, ScoredResult, Weights};
use crate::{Candidate, Error, Result};
use async_std::fs;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Supplies the candidates of one batch.
#[async_trait]
pub trait ProposalSource {
    /// Propose candidates solving `problem`, a textual statement.
    async fn propose(&mut self, problem: &str) -> Result<Vec<Candidate>>;
}

/// Receives the ranked batch once it is complete.
pub trait ReportSink {
    fn publish(&mut self, report: &BatchReport) -> Result<()>;
}

/// Facts about a batch run which are not in its results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub timestamp_utc: DateTime<Utc>,
    /// Seed of the input generator, `None` if it was seeded from entropy.
    pub seed: Option<u64>,
    /// The problem statement handed to the proposal source.
    pub problem: String,
    pub os: String,
}

impl RunMetadata {
    /// Metadata of a run starting now.
    pub fn new<T: AsRef<str>>(problem: T, seed: Option<u64>) -> Self {
        Self {
            timestamp_utc: Utc::now(),
            seed,
            problem: problem.as_ref().to_owned(),
            os: std::env::consts::OS.to_owned(),
        }
    }
}

/// Everything known about a finished batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub experiment_id: String,
    pub metadata: RunMetadata,
    /// Ranked, best first.
    pub candidates: Vec<ScoredResult>,
    /// Id of `candidates[0]`, if the batch was not empty.
    pub winner: Option<String>,
}

impl BatchReport {
    pub fn new<T: AsRef<str>>(
        experiment_id: T,
        metadata: RunMetadata,
        candidates: Vec<ScoredResult>,
    ) -> Self {
        let winner = candidates.first().map(|s| s.raw.id.clone());
        Self {
            experiment_id: experiment_id.as_ref().to_owned(),
            metadata,
            candidates,
            winner,
        }
    }
}

/// A fresh id for a batch.
pub fn new_batch_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Per-candidate files of one batch, under `<root>/<candidate id>/`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    src_name: String,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>, T: AsRef<str>>(root: P, src_name: T) -> Self {
        Self {
            root: root.into(),
            src_name: src_name.as_ref().to_owned(),
        }
    }

    /// Directory of the candidate with the given id, see
    /// [Candidate::dir_name].
    pub fn dir_of(&self, id: &str) -> Result<PathBuf> {
        Ok(self.root.join(escape_dir_name(id)?))
    }

    /// Persist the source and prompt of `c`, returning the path of the
    /// source file.
    pub async fn materialize(&self, c: &Candidate) -> Result<PathBuf> {
        let dir = self.dir_of(&c.id)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Io(dir.clone(), e))?;

        let src = dir.join(&self.src_name);
        write(&src, &c.source).await?;
        write(&dir.join("prompt.txt"), &c.prompt).await?;
        Ok(src)
    }

    /// Save the diagnostic of `r` as `run.log`, and as `error.log` too
    /// if the candidate failed correctness.  Failures are only logged.
    pub async fn save_logs(&self, r: &RawResult) {
        let dir = match self.dir_of(&r.id) {
            Ok(d) => d,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        let mut logs = vec![dir.join("run.log")];
        if r.correctness == 0.0 {
            logs.push(dir.join("error.log"));
        }
        for p in logs {
            if let Err(e) = write(&p, &r.diagnostic).await {
                warn!("{}", e);
            }
        }
    }
}

async fn write(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| Error::Io(path.to_owned(), e))
}

fn check_unique(candidates: &[Candidate]) -> Result<()> {
    let mut seen = HashSet::new();
    for c in candidates {
        if !seen.insert(c.id.as_str()) {
            return Err(Error::DuplicateCandidate(c.id.clone()));
        }
    }
    Ok(())
}

/// Drives a batch through materialization, evaluation and scoring.
pub struct Pipeline {
    evaluator: Evaluator,
    store: ArtifactStore,
    weights: Weights,
}

impl Pipeline {
    pub fn new(evaluator: Evaluator, store: ArtifactStore, weights: Weights) -> Self {
        Self {
            evaluator,
            store,
            weights,
        }
    }

    /// Evaluate every candidate in turn and rank the batch.
    ///
    /// Fails only on duplicate ids.  Every candidate appears in the
    /// output, with correctness 0.0 and a diagnostic if it could not be
    /// fully evaluated.
    pub async fn evaluate_batch(&mut self, candidates: &[Candidate]) -> Result<Vec<ScoredResult>> {
        check_unique(candidates)?;

        let mut raw = Vec::with_capacity(candidates.len());
        for (i, c) in candidates.iter().enumerate() {
            info!("[{}/{}] evaluating {}", i + 1, candidates.len(), c.id);
            let r = match self.store.materialize(c).await {
                Ok(src) => {
                    let r = self.evaluator.evaluate(c, &src).await;
                    self.store.save_logs(&r).await;
                    r
                }
                Err(e) => {
                    warn!("{}", e);
                    RawResult::failed(&c.id, FailureKind::CandidateLoad, e.to_string())
                }
            };
            raw.push(r);
        }

        Ok(score(raw, &self.weights))
    }

    /// Take a batch from `source`, evaluate it and hand the report to
    /// `sink`.  `metadata.problem` is the statement `source` is asked to
    /// solve.
    pub async fn run<S, R>(
        &mut self,
        experiment_id: &str,
        metadata: RunMetadata,
        source: &mut S,
        sink: &mut R,
    ) -> Result<BatchReport>
    where
        S: ProposalSource + Send + ?Sized,
        R: ReportSink + ?Sized,
    {
        let candidates = source.propose(&metadata.problem).await?;
        info!(
            "batch {}: {} candidate(s) proposed",
            experiment_id,
            candidates.len()
        );

        let ranked = self.evaluate_batch(&candidates).await?;
        let report = BatchReport::new(experiment_id, metadata, ranked);
        match &report.winner {
            Some(w) => info!("batch {}: winner is {}", experiment_id, w),
            None => warn!("batch {}: no candidate to rank", experiment_id),
        }

        sink.publish(&report)?;
        Ok(report)
    }
}
