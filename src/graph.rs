//! The shortest-path problem every candidate solves.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet, HashMap};

const MAX_WEIGHT: u32 = 100;

/// A directed graph with `f64` edge weights.  Weights may be negative.
///
/// A node only reached by edges does not need an adjacency entry of its
/// own; [Graph::nodes] still lists it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    adj: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to, weight)` triples.
    pub fn from_edges(edges: &[(&str, &str, f64)]) -> Self {
        let mut g = Self::new();
        for &(u, v, w) in edges {
            g.add_edge(u, v, w);
        }
        g
    }

    /// Add a node without outgoing edges.  Does nothing if it exists.
    pub fn add_node<T: AsRef<str>>(&mut self, n: T) {
        self.adj.entry(n.as_ref().to_owned()).or_default();
    }

    /// Add or replace the edge `from -> to`.
    pub fn add_edge<U: AsRef<str>, V: AsRef<str>>(&mut self, from: U, to: V, weight: f64) {
        self.adj
            .entry(from.as_ref().to_owned())
            .or_default()
            .insert(to.as_ref().to_owned(), weight);
    }

    pub fn neighbors<'a>(&'a self, n: &str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.adj
            .get(n)
            .into_iter()
            .flat_map(|m| m.iter().map(|(v, &w)| (v.as_str(), w)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.adj
            .iter()
            .flat_map(|(u, m)| m.iter().map(move |(v, &w)| (u.as_str(), v.as_str(), w)))
    }

    /// Every node, with or without an adjacency entry.
    pub fn nodes(&self) -> BTreeSet<&str> {
        let mut r: BTreeSet<&str> = self.adj.keys().map(String::as_str).collect();
        r.extend(self.adj.values().flat_map(|m| m.keys().map(String::as_str)));
        r
    }

    pub fn edge_count(&self) -> usize {
        self.adj.values().map(BTreeMap::len).sum()
    }
}

/// The answer of a solver: total cost and the node sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub cost: f64,
    pub path: Vec<String>,
}

impl PathResult {
    /// `(inf, [])`, the answer when `end` cannot be reached.
    pub fn unreachable() -> Self {
        Self {
            cost: f64::INFINITY,
            path: vec![],
        }
    }

    /// `(0, [start])`, the answer when `start == end`.
    pub fn trivial(start: &str) -> Self {
        Self {
            cost: 0.0,
            path: vec![start.to_owned()],
        }
    }

    /// Walk a predecessor map back from `end` to `start`.
    pub fn from_predecessors(
        start: &str,
        end: &str,
        cost: f64,
        prev: &HashMap<&str, &str>,
    ) -> Self {
        if start == end {
            return Self::trivial(start);
        }
        if !cost.is_finite() {
            return Self::unreachable();
        }
        let mut path = vec![end.to_owned()];
        let mut cur = end;
        while cur != start {
            match prev.get(cur) {
                Some(&p) => {
                    path.push(p.to_owned());
                    cur = p;
                }
                None => return Self::unreachable(),
            }
            // A predecessor cycle, only possible with negative cycles.
            if path.len() > prev.len() + 1 {
                return Self::unreachable();
            }
        }
        path.reverse();
        Self { cost, path }
    }
}

/// One generated problem instance.
#[derive(Debug, Clone)]
pub struct GraphInput {
    pub graph: Graph,
    pub start: String,
    pub end: String,
}

/// Produces problem instances for the profiler.  Every call must draw
/// fresh randomness.
pub trait InputGenerator {
    fn generate(&mut self, scale: usize, density: f64) -> GraphInput;
}

/// Random directed graphs over nodes `"0"..scale`: every ordered pair of
/// distinct nodes gets an edge with probability `density`, its weight an
/// integer in `1..=100`.  Start and end are picked uniformly.
pub struct RandomGraph {
    rng: StdRng,
}

impl RandomGraph {
    /// Reproducible across runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl InputGenerator for RandomGraph {
    fn generate(&mut self, scale: usize, density: f64) -> GraphInput {
        let names = (0..scale).map(|i| i.to_string()).collect::<Vec<_>>();
        let mut graph = Graph::new();
        for u in &names {
            graph.add_node(u);
        }
        for (i, u) in names.iter().enumerate() {
            for (j, v) in names.iter().enumerate() {
                if i != j && self.rng.gen::<f64>() < density {
                    let w = self.rng.gen_range(1..=MAX_WEIGHT);
                    graph.add_edge(u, v, f64::from(w));
                }
            }
        }

        let (start, end) = if scale == 0 {
            (String::new(), String::new())
        } else {
            let s = self.rng.gen_range(0..scale);
            let e = self.rng.gen_range(0..scale);
            (names[s].clone(), names[e].clone())
        };
        GraphInput { graph, start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_include_sinks() {
        let g = Graph::from_edges(&[("A", "B", 1.0), ("B", "C", 2.0)]);
        let nodes = g.nodes().into_iter().collect::<Vec<_>>();
        assert_eq!(nodes, ["A", "B", "C"]);
        assert_eq!(g.neighbors("C").count(), 0);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let a = RandomGraph::seeded(42).generate(20, 0.5);
        let b = RandomGraph::seeded(42).generate(20, 0.5);
        assert_eq!(a.graph, b.graph);
        assert_eq!((a.start, a.end), (b.start, b.end));
    }

    #[test]
    fn test_density_extremes() {
        let mut gen = RandomGraph::seeded(7);
        let empty = gen.generate(10, 0.0);
        assert_eq!(empty.graph.edge_count(), 0);
        assert_eq!(empty.graph.nodes().len(), 10);

        let full = gen.generate(10, 1.0);
        assert_eq!(full.graph.edge_count(), 10 * 9);
        assert!(full
            .graph
            .edges()
            .all(|(u, v, w)| u != v && (1.0..=100.0).contains(&w) && w.fract() == 0.0));
        assert!(full.graph.nodes().contains(full.start.as_str()));
        assert!(full.graph.nodes().contains(full.end.as_str()));
    }

    #[test]
    fn test_zero_scale() {
        let input = RandomGraph::seeded(1).generate(0, 0.5);
        assert!(input.graph.nodes().is_empty());
        assert!(input.start.is_empty() && input.end.is_empty());
    }

    #[test]
    fn test_from_predecessors() {
        let prev = HashMap::from([("B", "A"), ("C", "B")]);
        let r = PathResult::from_predecessors("A", "C", 3.0, &prev);
        assert_eq!(r.path, ["A", "B", "C"]);
        assert_eq!(r.cost, 3.0);

        let r = PathResult::from_predecessors("A", "D", f64::INFINITY, &prev);
        assert_eq!(r, PathResult::unreachable());

        assert_eq!(
            PathResult::from_predecessors("A", "A", 0.0, &prev),
            PathResult::trivial("A")
        );
    }
}
