use crate::graph::{Graph, PathResult};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

struct State<'a> {
    cost: f64,
    node: &'a str,
}

impl PartialEq for State<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State<'_> {}

impl PartialOrd for State<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State<'_> {
    // Reversed so that BinaryHeap pops the cheapest state first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

/// Dijkstra with lazy deletion; assumes non-negative weights.
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
    let mut heap = BinaryHeap::from([State {
        cost: 0.0,
        node: start,
    }]);

    while let Some(State { cost, node }) = heap.pop() {
        if node == end {
            break;
        }
        if cost > dist.get(node).copied().unwrap_or(f64::INFINITY) {
            continue;
        }
        for (v, w) in graph.neighbors(node) {
            let next = cost + w;
            if next < dist.get(v).copied().unwrap_or(f64::INFINITY) {
                dist.insert(v, next);
                prev.insert(v, node);
                heap.push(State { cost: next, node: v });
            }
        }
    }

    let cost = dist.get(end).copied().unwrap_or(f64::INFINITY);
    PathResult::from_predecessors(start, end, cost, &prev)
}
