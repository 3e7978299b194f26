use std::path::PathBuf;

/// The error type of `autoalgo`.
///
/// Only batch-level problems are returned to the caller.  Everything that
/// goes wrong with a single candidate is folded into its
/// [RawResult](crate::RawResult) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entry point of a candidate cannot be bound to a solver.
    #[error("cannot load candidate {0}: {1}")]
    CandidateLoad(String, String),
    /// The solver panicked while it was being timed or traced.
    #[error("performance measurement failed at scale {0}: {1}")]
    PerformanceMeasurement(String, String),
    /// In-process profiling ran longer than the configured budget.
    #[error("profiling exceeded its budget of {0:?} at scale {1}")]
    ProfileBudgetExceeded(std::time::Duration, String),
    /// Two candidates of one batch share an id.
    #[error("duplicate candidate id {0} in batch")]
    DuplicateCandidate(String),
    /// An empty candidate id, which cannot name a directory.
    #[error("invalid candidate id {0:?}")]
    BadCandidateId(String),
    /// A configuration value outside its domain.
    #[error("bad configuration: {0}")]
    BadConfig(String),
    /// An error writing an artifact or a report file.
    #[error("cannot write {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    /// The proposal source could not supply a batch.
    #[error("cannot get proposals: {0}")]
    Proposal(String),
    /// A report sink failed to publish the ranked batch.
    #[error("cannot publish report: {0}")]
    Report(String),
}

/// Alias for a [Result][std::result::Result] with the error type [Error].
pub type Result<T> = std::result::Result<T, Error>;
