use crate::graph::{Graph, PathResult};
use std::collections::HashMap;

/// Relax every edge until nothing changes, at most `|V| - 1` rounds.
pub fn find_shortest_path(graph: &Graph, start: &str, end: &str) -> PathResult {
    let nodes = graph.nodes();
    if !nodes.contains(start) || !nodes.contains(end) {
        return PathResult::unreachable();
    }
    if start == end {
        return PathResult::trivial(start);
    }

    let mut dist: HashMap<&str, f64> = nodes.iter().map(|&n| (n, f64::INFINITY)).collect();
    let mut prev: HashMap<&str, &str> = HashMap::new();
    dist.insert(start, 0.0);

    for _ in 1..nodes.len() {
        let mut changed = false;
        for (u, v, w) in graph.edges() {
            let du = dist[u];
            if du.is_infinite() {
                continue;
            }
            if du + w < dist[v] {
                dist.insert(v, du + w);
                prev.insert(v, u);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    PathResult::from_predecessors(start, end, dist[end], &prev)
}
