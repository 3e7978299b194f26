use crate::graph::{Graph, PathResult};
use std::collections::{BTreeSet, HashMap};

/// Quadratic Dijkstra: every round scans all unvisited nodes for the
/// closest one.  Settled nodes are never updated again.
pub fn find_shortest_path(graph: &Graph, start: &str, end: &str) -> PathResult {
    let mut unvisited: BTreeSet<&str> = graph.nodes();
    if !unvisited.contains(start) || !unvisited.contains(end) {
        return PathResult::unreachable();
    }
    if start == end {
        return PathResult::trivial(start);
    }

    let mut dist: HashMap<&str, f64> = unvisited.iter().map(|&n| (n, f64::INFINITY)).collect();
    let mut prev: HashMap<&str, &str> = HashMap::new();
    dist.insert(start, 0.0);

    loop {
        let mut best: Option<(&str, f64)> = None;
        for &n in &unvisited {
            let d = dist[n];
            if d.is_finite() && best.map_or(true, |(_, b)| d < b) {
                best = Some((n, d));
            }
        }
        let (u, du) = match best {
            Some(x) => x,
            None => break,
        };
        unvisited.remove(u);
        if u == end {
            break;
        }
        for (v, w) in graph.neighbors(u) {
            if unvisited.contains(v) && du + w < dist[v] {
                dist.insert(v, du + w);
                prev.insert(v, u);
            }
        }
    }

    PathResult::from_predecessors(start, end, dist[end], &prev)
}
