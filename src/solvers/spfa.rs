use crate::graph::{Graph, PathResult};
use std::collections::{HashMap, HashSet, VecDeque};

/// Bellman-Ford driven by a FIFO of nodes whose distance just dropped.
pub fn find_shortest_path(graph: &Graph, start: &str, end: &str) -> PathResult {
    let nodes = graph.nodes();
    if !nodes.contains(start) || !nodes.contains(end) {
        return PathResult::unreachable();
    }
    if start == end {
        return PathResult::trivial(start);
    }

    let mut dist: HashMap<&str, f64> = HashMap::from([(start, 0.0)]);
    let mut prev: HashMap<&str, &str> = HashMap::new();
    let mut relaxed: HashMap<&str, usize> = HashMap::new();
    let mut queued: HashSet<&str> = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(u) = queue.pop_front() {
        queued.remove(u);
        // Queued more than |V| times means a negative cycle.
        let n = relaxed.entry(u).or_insert(0);
        *n += 1;
        if *n > nodes.len() {
            return PathResult::unreachable();
        }
        let du = dist[u];
        for (v, w) in graph.neighbors(u) {
            let better = dist.get(v).map_or(true, |&dv| du + w < dv);
            if better {
                dist.insert(v, du + w);
                prev.insert(v, u);
                if queued.insert(v) {
                    queue.push_back(v);
                }
            }
        }
    }

    let cost = dist.get(end).copied().unwrap_or(f64::INFINITY);
    PathResult::from_predecessors(start, end, cost, &prev)
}
