//! The reference correctness suite for shortest-path solvers.
//!
//! This is what `autoalgo check` runs in the child process.  Its textual
//! report follows the usual test-runner convention: a line per failing
//! case and a summary of `N passed` or `F failed, N passed`.

use crate::graph::{Graph, PathResult};
use crate::Solver;
use std::fmt;

enum Expect {
    Path(f64, &'static [&'static str]),
    AnyOf(f64, &'static [&'static [&'static str]]),
    Unreachable,
}

struct Case {
    name: &'static str,
    graph: fn() -> Graph,
    start: &'static str,
    end: &'static str,
    expect: Expect,
}

fn sample_graph() -> Graph {
    Graph::from_edges(&[
        ("A", "B", 1.0),
        ("A", "C", 4.0),
        ("B", "C", 2.0),
        ("B", "D", 5.0),
        ("C", "D", 1.0),
        ("D", "E", 2.0),
        ("E", "F", 1.0),
    ])
}

fn isolated_target() -> Graph {
    let mut g = Graph::from_edges(&[("A", "B", 1.0), ("C", "D", 1.0)]);
    g.add_node("F");
    g
}

fn complex_graph() -> Graph {
    Graph::from_edges(&[
        ("A", "B", 10.0),
        ("A", "C", 3.0),
        ("B", "C", 1.0),
        ("B", "D", 2.0),
        ("C", "B", 4.0),
        ("C", "D", 8.0),
        ("C", "E", 2.0),
        ("D", "E", 7.0),
        ("E", "D", 9.0),
    ])
}

fn two_components() -> Graph {
    Graph::from_edges(&[("A", "B", 1.0), ("C", "D", 1.0)])
}

fn negative_edge() -> Graph {
    Graph::from_edges(&[
        ("A", "B", 1.0),
        ("A", "C", 2.0),
        ("C", "D", 1.0),
        ("D", "B", -3.0),
    ])
}

fn equal_paths() -> Graph {
    Graph::from_edges(&[
        ("A", "B", 2.0),
        ("A", "C", 2.0),
        ("B", "D", 3.0),
        ("C", "D", 3.0),
    ])
}

const CASES: &[Case] = &[
    Case {
        name: "simple_path",
        graph: sample_graph,
        start: "A",
        end: "D",
        expect: Expect::Path(4.0, &["A", "B", "C", "D"]),
    },
    Case {
        name: "no_path",
        graph: isolated_target,
        start: "A",
        end: "F",
        expect: Expect::Unreachable,
    },
    Case {
        name: "start_equals_end",
        graph: sample_graph,
        start: "A",
        end: "A",
        expect: Expect::Path(0.0, &["A"]),
    },
    Case {
        name: "more_complex_path",
        graph: complex_graph,
        start: "A",
        end: "D",
        expect: Expect::Path(9.0, &["A", "C", "B", "D"]),
    },
    Case {
        name: "path_to_sink_node",
        graph: sample_graph,
        start: "A",
        end: "F",
        expect: Expect::Path(7.0, &["A", "B", "C", "D", "E", "F"]),
    },
    Case {
        name: "disconnected_component",
        graph: two_components,
        start: "A",
        end: "C",
        expect: Expect::Unreachable,
    },
    Case {
        name: "negative_weights",
        graph: negative_edge,
        start: "A",
        end: "B",
        expect: Expect::Path(0.0, &["A", "C", "D", "B"]),
    },
    Case {
        name: "multiple_equal_paths",
        graph: equal_paths,
        start: "A",
        end: "D",
        expect: Expect::AnyOf(5.0, &[&["A", "B", "D"], &["A", "C", "D"]]),
    },
];

impl Expect {
    fn check(&self, r: &PathResult) -> Result<(), String> {
        let ok = match self {
            Expect::Path(cost, path) => r.cost == *cost && r.path == *path,
            Expect::AnyOf(cost, paths) => r.cost == *cost && paths.iter().any(|p| r.path == *p),
            Expect::Unreachable => r.cost == f64::INFINITY && r.path.is_empty(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "expected {}, got cost {} path {:?}",
                self, r.cost, r.path
            ))
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Path(c, p) => write!(f, "cost {} path {:?}", c, p),
            Expect::AnyOf(c, ps) => write!(f, "cost {} with one of {:?}", c, ps),
            Expect::Unreachable => write!(f, "cost inf path []"),
        }
    }
}

/// Outcome of [run_suite].
#[derive(Debug, Default)]
pub struct SuiteReport {
    pub passed: usize,
    /// `(case name, reason)`
    pub failures: Vec<(String, String)>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, why) in &self.failures {
            writeln!(f, "FAILED {}: {}", name, why)?;
        }
        if self.failures.is_empty() {
            write!(f, "{} passed", self.passed)
        } else {
            write!(f, "{} failed, {} passed", self.failures.len(), self.passed)
        }
    }
}

/// Run every reference case against `solver`.  A panicking case counts as
/// failed; the remaining cases still run.
pub fn run_suite(solver: &Solver) -> SuiteReport {
    let mut report = SuiteReport::default();
    for case in CASES {
        let graph = (case.graph)();
        let outcome = solver
            .call(&graph, case.start, case.end)
            .and_then(|r| case.expect.check(&r));
        match outcome {
            Ok(()) => report.passed += 1,
            Err(why) => report.failures.push((case.name.to_owned(), why)),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    #[test]
    fn test_correct_solvers_pass() {
        let r = Registry::builtin();
        for entry in ["bellman_ford", "spfa"] {
            let report = run_suite(r.get(entry).unwrap());
            assert!(report.is_success(), "{}:\n{}", entry, report);
            assert_eq!(report.passed, CASES.len());
            assert_eq!(report.to_string(), format!("{} passed", CASES.len()));
        }
    }

    #[test]
    fn test_dijkstra_fails_negative_weights_only() {
        let r = Registry::builtin();
        for entry in ["dijkstra_heap", "dijkstra_list"] {
            let report = run_suite(r.get(entry).unwrap());
            let names = report.failures.iter().map(|x| x.0.as_str()).collect::<Vec<_>>();
            assert_eq!(names, ["negative_weights"], "{}", entry);
            let text = report.to_string();
            assert!(text.starts_with("FAILED negative_weights"), "{}", text);
            assert!(text.ends_with("1 failed, 7 passed"), "{}", text);
        }
    }

    #[test]
    fn test_panicking_solver_fails_every_case() {
        let s = Solver::new("boom", |_: &Graph, _: &str, _: &str| -> PathResult {
            panic!("index out of bounds")
        });
        let report = run_suite(&s);
        assert_eq!(report.passed, 0);
        assert_eq!(report.failures.len(), CASES.len());
        assert!(report.failures[0].1.contains("index out of bounds"));
    }
}
