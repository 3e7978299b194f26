//! Batch-level normalization and ranking.

use crate::evaluate::RawResult;
use crate::profile::Series;
use serde::{Deserialize, Serialize};

/// Weights of the normalized metrics in the final score.  They are meant
/// to sum to 1.0; nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub correctness: f64,
    pub runtime: f64,
    pub memory: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            correctness: 0.6,
            runtime: 0.3,
            memory: 0.1,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.correctness + self.runtime + self.memory
    }
}

/// Which end of a metric is good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// A [RawResult] with its batch-relative scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub raw: RawResult,
    /// `inf` without runtime data.
    pub avg_runtime_ms: f64,
    /// `inf` without memory data.
    pub avg_memory_kb: f64,
    pub norm_correctness: f64,
    pub norm_runtime: f64,
    pub norm_memory: f64,
    pub final_score: f64,
}

/// Arithmetic mean of a series; `inf` if it is empty.
pub fn mean(s: &Series) -> f64 {
    if s.is_empty() {
        f64::INFINITY
    } else {
        s.values().sum::<f64>() / s.len() as f64
    }
}

/// Map `values` onto `[0, 1]` using their own finite min and max.
///
/// Non-finite values map to 0.0 whatever the direction.  If nothing is
/// finite, or all finite values are equal, the finite ones (or all, when
/// none are finite) map to 1.0.
pub fn normalize(values: &[f64], dir: Direction) -> Vec<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        return vec![1.0; values.len()];
    }

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                0.0
            } else if lo == hi {
                1.0
            } else {
                match dir {
                    Direction::HigherIsBetter => (v - lo) / (hi - lo),
                    Direction::LowerIsBetter => (hi - v) / (hi - lo),
                }
            }
        })
        .collect()
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Score a whole batch and rank it, best first.  Equal final scores keep
/// their input order.
pub fn score(batch: Vec<RawResult>, weights: &Weights) -> Vec<ScoredResult> {
    let avg_rt = batch.iter().map(|r| mean(&r.runtime_ms)).collect::<Vec<_>>();
    let avg_mem = batch.iter().map(|r| mean(&r.memory_kb)).collect::<Vec<_>>();
    let corr = batch.iter().map(|r| r.correctness).collect::<Vec<_>>();

    let n_corr = normalize(&corr, Direction::HigherIsBetter);
    let n_rt = normalize(&avg_rt, Direction::LowerIsBetter);
    let n_mem = normalize(&avg_mem, Direction::LowerIsBetter);

    let mut scored = batch
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let total = weights.correctness * n_corr[i]
                + weights.runtime * n_rt[i]
                + weights.memory * n_mem[i];
            ScoredResult {
                raw,
                avg_runtime_ms: avg_rt[i],
                avg_memory_kb: avg_mem[i],
                norm_correctness: round4(n_corr[i]),
                norm_runtime: round4(n_rt[i]),
                norm_memory: round4(n_mem[i]),
                final_score: round4(total),
            }
        })
        .collect::<Vec<_>>();

    // Vec::sort_by is stable.
    scored.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::FailureKind;

    fn series(xs: &[(&str, f64)]) -> Series {
        xs.iter().map(|&(k, v)| (k.to_owned(), v)).collect()
    }

    fn ok(id: &str, rt: f64, mem: f64) -> RawResult {
        RawResult {
            id: id.to_owned(),
            correctness: 1.0,
            runtime_ms: series(&[("10", rt)]),
            memory_kb: series(&[("10", mem)]),
            diagnostic: String::new(),
            failure: None,
        }
    }

    fn bad(id: &str) -> RawResult {
        RawResult::failed(id, FailureKind::CorrectnessFailure, "1 failed".into())
    }

    fn ids(v: &[ScoredResult]) -> Vec<&str> {
        v.iter().map(|s| s.raw.id.as_str()).collect()
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&series(&[("10", 1.0), ("50", 2.0), ("100", 6.0)])), 3.0);
        assert_eq!(mean(&Series::new()), f64::INFINITY);
    }

    #[test]
    fn test_normalize_directions() {
        let v = [1.0, 3.0, 2.0];
        assert_eq!(normalize(&v, Direction::HigherIsBetter), [0.0, 1.0, 0.5]);
        assert_eq!(normalize(&v, Direction::LowerIsBetter), [1.0, 0.0, 0.5]);
        assert!(normalize(&[], Direction::LowerIsBetter).is_empty());
    }

    #[test]
    fn test_normalize_non_finite_is_worst() {
        let v = [f64::INFINITY, 4.0, f64::NAN, 2.0];
        assert_eq!(normalize(&v, Direction::LowerIsBetter), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(normalize(&v, Direction::HigherIsBetter), [0.0, 1.0, 0.0, 0.0]);
        let v = [f64::NEG_INFINITY, 1.0];
        assert_eq!(normalize(&v, Direction::HigherIsBetter), [0.0, 1.0]);
    }

    #[test]
    fn test_normalize_degenerate() {
        let all_inf = [f64::INFINITY, f64::NAN];
        assert_eq!(normalize(&all_inf, Direction::LowerIsBetter), [1.0, 1.0]);
        let tied = [5.0, f64::INFINITY, 5.0];
        assert_eq!(normalize(&tied, Direction::LowerIsBetter), [1.0, 0.0, 1.0]);
        assert_eq!(normalize(&tied, Direction::HigherIsBetter), [1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normalize_idempotent() {
        let v = [0.0, 0.25, 1.0, 0.6];
        let once = normalize(&v, Direction::HigherIsBetter);
        assert_eq!(once, v);
        assert_eq!(normalize(&once, Direction::HigherIsBetter), once);
    }

    #[test]
    fn test_three_candidate_scenario() {
        let batch = vec![bad("C"), ok("B", 20.0, 50.0), ok("A", 10.0, 100.0)];
        let r = score(batch, &Weights::default());
        assert_eq!(ids(&r), ["A", "B", "C"]);

        let (a, b, c) = (&r[0], &r[1], &r[2]);
        assert_eq!((a.norm_runtime, b.norm_runtime, c.norm_runtime), (1.0, 0.0, 0.0));
        assert_eq!((a.norm_memory, b.norm_memory, c.norm_memory), (0.0, 1.0, 0.0));
        assert_eq!(a.final_score, 0.9);
        assert_eq!(b.final_score, 0.7);
        assert_eq!(c.final_score, 0.0);
        assert_eq!(c.avg_runtime_ms, f64::INFINITY);
        assert!(c.raw.runtime_ms.is_empty() && c.raw.memory_kb.is_empty());
    }

    #[test]
    fn test_all_failed_keeps_input_order() {
        let batch = vec![bad("x"), bad("y"), bad("z")];
        let r = score(batch, &Weights::default());
        assert_eq!(ids(&r), ["x", "y", "z"]);
        assert!(r.iter().all(|s| s.final_score == r[0].final_score));
    }

    #[test]
    fn test_ties_are_stable() {
        let batch = vec![ok("p", 5.0, 5.0), ok("q", 5.0, 5.0), ok("r", 1.0, 1.0)];
        let r = score(batch, &Weights::default());
        assert_eq!(ids(&r), ["r", "p", "q"]);
    }

    #[test]
    fn test_tied_metric_gives_full_weight() {
        let batch = vec![ok("a", 3.0, 10.0), ok("b", 3.0, 20.0), bad("c")];
        let r = score(batch, &Weights::default());
        for s in r.iter().filter(|s| s.raw.correctness == 1.0) {
            assert_eq!(s.norm_runtime, 1.0, "{}", s.raw.id);
        }
        assert_eq!(r[0].final_score, 1.0);
        assert_eq!(r[1].final_score, 0.9);
    }

    #[test]
    fn test_final_score_bounds() {
        let weight_sets = [
            Weights::default(),
            Weights {
                correctness: 1.0,
                runtime: 0.0,
                memory: 0.0,
            },
            Weights {
                correctness: 0.2,
                runtime: 0.2,
                memory: 0.6,
            },
            Weights {
                correctness: 1.0 / 3.0,
                runtime: 1.0 / 3.0,
                memory: 1.0 / 3.0,
            },
        ];
        let batch = vec![
            ok("a", 0.013, 3.7),
            ok("b", 2.5, 228.0),
            bad("c"),
            ok("d", 0.7, 60.0),
            bad("e"),
        ];
        for w in &weight_sets {
            for s in score(batch.clone(), w) {
                assert!((0.0..=1.0).contains(&s.final_score), "{:?} {:?}", w, s);
                for n in [s.norm_correctness, s.norm_runtime, s.norm_memory] {
                    assert!((0.0..=1.0).contains(&n));
                }
            }
        }
    }

    #[test]
    fn test_lower_runtime_never_scores_lower() {
        for (fast, slow) in [(1.0, 2.0), (0.5, 0.51), (10.0, 1000.0)] {
            let batch = vec![ok("slow", slow, 40.0), ok("mid", 5.0, 10.0), ok("fast", fast, 40.0)];
            let r = score(batch, &Weights::default());
            let get = |id: &str| r.iter().find(|s| s.raw.id == id).unwrap().final_score;
            assert!(get("fast") >= get("slow"));
        }
    }
}
