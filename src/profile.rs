use crate::alloc::{self, MemoryTrace};
use crate::graph::InputGenerator;
use crate::{Error, Result, Solver};
use byte_unit::{Byte, UnitType};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Once;
use std::time::{Duration, Instant};

/// Scale label (`"10"`, `"50"`, ...) to measured value, in scale order.
pub type Series = IndexMap<String, f64>;

/// What the [Profiler] measures.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Node counts of the generated graphs.
    pub scales: Vec<usize>,
    /// Edge probability for every ordered node pair.
    pub density: f64,
    /// Timed calls per scale.
    pub repetitions: u32,
    /// Wall-clock limit for profiling one candidate.  Checked between
    /// solver calls, so a call that never returns is not interrupted.
    #[serde_as(as = "Option<serde_with::DurationSeconds<f64, serde_with::formats::Flexible>>")]
    pub budget: Option<Duration>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            scales: vec![10, 50, 100],
            density: 0.5,
            repetitions: 5,
            budget: None,
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scales.is_empty() {
            return Err(Error::BadConfig("no profiling scale configured".into()));
        }
        if let Some(s) = self.scales.iter().find(|&&s| s == 0) {
            return Err(Error::BadConfig(format!("profiling scale {} is empty", s)));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(Error::BadConfig(format!(
                "density {} is not a probability",
                self.density
            )));
        }
        Ok(())
    }
}

/// Measures the runtime and peak memory of a [Solver] in this process.
pub struct Profiler {
    cfg: ProfileConfig,
    generator: Box<dyn InputGenerator + Send>,
}

static UNTRACED: Once = Once::new();

impl Profiler {
    pub fn new<G: InputGenerator + Send + 'static>(cfg: ProfileConfig, generator: G) -> Self {
        Self {
            cfg,
            generator: Box::new(generator),
        }
    }

    /// Returns `(runtime_ms, memory_kb)`.
    ///
    /// Runtime is the mean over `repetitions` calls, each on a freshly
    /// generated input, timing only the call.  Memory is the peak heap
    /// growth of one more call on yet another input.  The values are one
    /// noisy sample, not exact figures.
    ///
    /// Input generation is outside both the timed region and the trace,
    /// so these figures are lower than ones that measure generating the
    /// graph together with solving it, and are not comparable to them.
    pub fn profile(&mut self, solver: &Solver) -> Result<(Series, Series)> {
        if !alloc::is_installed() {
            UNTRACED.call_once(|| {
                warn!("TracingAllocator is not the global allocator, memory will read 0")
            });
        }

        let started = Instant::now();
        let reps = self.cfg.repetitions.max(1);
        let mut runtime = Series::new();
        let mut memory = Series::new();

        for &scale in &self.cfg.scales {
            let label = scale.to_string();

            let mut total = Duration::ZERO;
            for _ in 0..reps {
                let input = self.generator.generate(scale, self.cfg.density);
                let t0 = Instant::now();
                solver
                    .call(&input.graph, &input.start, &input.end)
                    .map_err(|e| Error::PerformanceMeasurement(label.clone(), e))?;
                total += t0.elapsed();
                self.check_budget(started, &label)?;
            }
            let avg_ms = total.as_secs_f64() * 1000.0 / f64::from(reps);

            let input = self.generator.generate(scale, self.cfg.density);
            let trace = MemoryTrace::start();
            let r = solver.call(&input.graph, &input.start, &input.end);
            let peak = trace.peak_bytes();
            r.map_err(|e| Error::PerformanceMeasurement(label.clone(), e))?;
            self.check_budget(started, &label)?;

            debug!(
                "{} at scale {}: {:.4} ms per call, {} peak",
                solver.entry(),
                label,
                avg_ms,
                Byte::from_u64(peak as u64).get_appropriate_unit(UnitType::Binary)
            );
            runtime.insert(label.clone(), avg_ms);
            memory.insert(label, peak as f64 / 1024.0);
        }

        Ok((runtime, memory))
    }

    fn check_budget(&self, started: Instant, label: &str) -> Result<()> {
        match self.cfg.budget {
            Some(b) if started.elapsed() > b => {
                Err(Error::ProfileBudgetExceeded(b, label.to_owned()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::TRACE_LOCK;
    use crate::graph::{Graph, PathResult, RandomGraph};
    use crate::Registry;

    fn profiler(cfg: ProfileConfig) -> Profiler {
        Profiler::new(cfg, RandomGraph::seeded(42))
    }

    #[test]
    fn test_series_follow_scale_order() {
        let _guard = TRACE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let solver = Registry::builtin().get("bellman_ford").cloned().unwrap();
        let cfg = ProfileConfig {
            scales: vec![50, 10, 20],
            repetitions: 2,
            ..Default::default()
        };
        let (rt, mem) = profiler(cfg).profile(&solver).unwrap();
        assert_eq!(rt.keys().collect::<Vec<_>>(), ["50", "10", "20"]);
        assert_eq!(mem.keys().collect::<Vec<_>>(), ["50", "10", "20"]);
        assert!(rt.values().all(|v| v.is_finite() && *v >= 0.0));
        // Frees on other test threads can cancel the solver's allocations
        // in the process-wide counters, so a zero peak is possible.
        assert!(mem.values().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_panic_becomes_measurement_error() {
        let _guard = TRACE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let solver = Solver::new("big-only", |g: &Graph, s: &str, e: &str| {
            if g.nodes().len() > 20 {
                panic!("stack overflow simulated");
            }
            PathResult::from_predecessors(s, e, f64::INFINITY, &Default::default())
        });
        let cfg = ProfileConfig {
            scales: vec![10, 50],
            repetitions: 1,
            ..Default::default()
        };
        match profiler(cfg).profile(&solver) {
            Err(Error::PerformanceMeasurement(scale, msg)) => {
                assert_eq!(scale, "50");
                assert!(msg.contains("stack overflow simulated"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_budget_is_enforced_between_calls() {
        let solver = Solver::new("slow", |_: &Graph, _: &str, _: &str| {
            std::thread::sleep(Duration::from_millis(5));
            PathResult::unreachable()
        });
        let cfg = ProfileConfig {
            scales: vec![10, 50, 100],
            repetitions: 3,
            budget: Some(Duration::from_millis(1)),
            ..Default::default()
        };
        match profiler(cfg).profile(&solver) {
            Err(Error::ProfileBudgetExceeded(_, scale)) => assert_eq!(scale, "10"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate() {
        assert!(ProfileConfig::default().validate().is_ok());
        let bad = [
            ProfileConfig {
                scales: vec![],
                ..Default::default()
            },
            ProfileConfig {
                scales: vec![10, 0],
                ..Default::default()
            },
            ProfileConfig {
                density: 1.5,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{:?}", cfg);
        }
    }
}
