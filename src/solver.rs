use crate::graph::{Graph, PathResult};
use crate::{Candidate, Error, Result};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Plain function signature of a shortest-path solver.
pub type SolverFn = fn(&Graph, &str, &str) -> PathResult;

type DynSolver = dyn Fn(&Graph, &str, &str) -> PathResult + Send + Sync;

/// A callable handle bound to the entry point of one candidate.
#[derive(Clone)]
pub struct Solver {
    entry: String,
    func: Arc<DynSolver>,
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver").field("entry", &self.entry).finish()
    }
}

impl Solver {
    pub fn new<T, F>(entry: T, func: F) -> Self
    where
        T: AsRef<str>,
        F: Fn(&Graph, &str, &str) -> PathResult + Send + Sync + 'static,
    {
        Self {
            entry: entry.as_ref().to_owned(),
            func: Arc::new(func),
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Call the solver.  A panic inside candidate code is caught and
    /// returned as its message.
    pub fn call(
        &self,
        graph: &Graph,
        start: &str,
        end: &str,
    ) -> std::result::Result<PathResult, String> {
        catch_unwind(AssertUnwindSafe(|| (self.func)(graph, start, end))).map_err(panic_message)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked with a non-string payload".to_owned()
    }
}

/// Binds the entry point of a [Candidate] to a [Solver].
pub trait Loader {
    fn load(&self, candidate: &Candidate) -> Result<Solver>;
}

/// A [Loader] resolving entry points by name among registered solvers.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    solvers: BTreeMap<String, Solver>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All solvers of [crate::solvers::BUILTIN].
    pub fn builtin() -> Self {
        crate::solvers::BUILTIN
            .iter()
            .fold(Self::new(), |r, b| r.register(Solver::new(b.entry, b.func)))
    }

    /// Register a solver under its entry name, replacing any previous one.
    pub fn register(mut self, solver: Solver) -> Self {
        self.solvers.insert(solver.entry.clone(), solver);
        self
    }

    pub fn get(&self, entry: &str) -> Option<&Solver> {
        self.solvers.get(entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.solvers.keys().map(String::as_str)
    }
}

impl Loader for Registry {
    fn load(&self, candidate: &Candidate) -> Result<Solver> {
        self.get(&candidate.entry).cloned().ok_or_else(|| {
            Error::CandidateLoad(
                candidate.id.clone(),
                format!("no entry point named {:?}", candidate.entry),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_catches_panic() {
        let s = Solver::new("boom", |_: &Graph, _: &str, _: &str| -> PathResult {
            panic!("negative cycle")
        });
        let e = s.call(&Graph::new(), "A", "B").unwrap_err();
        assert!(e.contains("negative cycle"), "{}", e);
    }

    #[test]
    fn test_registry_load() {
        let r = Registry::builtin();
        let c = Candidate::new("x", "", "bellman_ford");
        assert_eq!(r.load(&c).unwrap().entry(), "bellman_ford");

        let c = Candidate::new("y", "", "find_shortest_path");
        match r.load(&c) {
            Err(Error::CandidateLoad(id, why)) => {
                assert_eq!(id, "y");
                assert!(why.contains("find_shortest_path"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
