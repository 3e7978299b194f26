#![doc = include_str!("../README.md")]

mod alloc;
mod candidate;
mod correctness;
mod error;
mod evaluate;
mod graph;
mod pipeline;
mod profile;
mod run;
mod score;
mod solver;
pub mod solvers;
pub mod suite;

pub use alloc::{MemoryTrace, TracingAllocator};
pub use candidate::Candidate;
pub use correctness::{verdict, CorrectnessChecker, CorrectnessConfig, CorrectnessVerdict};
pub use error::{Error, Result};
pub use evaluate::{Evaluator, FailureKind, RawResult};
pub use graph::{Graph, GraphInput, InputGenerator, PathResult, RandomGraph};
pub use pipeline::{
    new_batch_id, ArtifactStore, BatchReport, Pipeline, ProposalSource, ReportSink, RunMetadata,
};
pub use profile::{ProfileConfig, Profiler, Series};
pub use run::{ProcessResult, Run, LAUNCH_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE};
pub use score::{mean, normalize, score, Direction, ScoredResult, Weights};
pub use solver::{Loader, Registry, Solver, SolverFn};
