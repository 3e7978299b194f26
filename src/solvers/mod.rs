//! Built-in shortest-path solvers.
//!
//! Each one lives in its own file so the file itself can be handed out as
//! the candidate source.

mod bellman_ford;
mod dijkstra_heap;
mod dijkstra_list;
mod spfa;

use crate::SolverFn;

/// A solver compiled into this crate, together with its source text.
pub struct Builtin {
    pub entry: &'static str,
    pub summary: &'static str,
    pub source: &'static str,
    pub func: SolverFn,
}

pub const BUILTIN: [Builtin; 4] = [
    Builtin {
        entry: "bellman_ford",
        summary: "Bellman-Ford with early exit, handles negative weights",
        source: include_str!("bellman_ford.rs"),
        func: bellman_ford::find_shortest_path,
    },
    Builtin {
        entry: "spfa",
        summary: "queue-based Bellman-Ford (SPFA)",
        source: include_str!("spfa.rs"),
        func: spfa::find_shortest_path,
    },
    Builtin {
        entry: "dijkstra_heap",
        summary: "Dijkstra on a binary heap, stops when the target is settled",
        source: include_str!("dijkstra_heap.rs"),
        func: dijkstra_heap::find_shortest_path,
    },
    Builtin {
        entry: "dijkstra_list",
        summary: "Dijkstra scanning an unvisited list for the minimum",
        source: include_str!("dijkstra_list.rs"),
        func: dijkstra_list::find_shortest_path,
    },
];
