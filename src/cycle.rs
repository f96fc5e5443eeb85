//! Cycle enumeration over the merged lock-dependency graph.
//!
//! A directed cycle in the merged graph is a necessary (not sufficient)
//! condition for deadlock, so everything found here is a *potential* deadlock.
//!
//! The enumeration is a best-effort cycle dump, not a canonical listing of
//! simple cycles. Each recorded path is the DFS path at the moment it ran
//! into a node already on it, extended with that closing node, so the
//! repeated node is explicit at the end, and a lead-in prefix from the start
//! node is retained when the cycle is entered from outside. Interleaved
//! cycles through one subgraph are all emitted in a single pass. Nodes enter
//! the visited set when first expanded and stay there across start nodes,
//! which prunes re-exploration of regions already walked.

use crate::graph::LockGraph;
use fnv::FnvHashSet;

/// Enumerate the cycles of `graph`, starting a DFS from every node in sorted
/// order. Returns the closed walks in the order they were found.
pub fn enumerate_cycles(graph: &LockGraph) -> Vec<Vec<String>> {
    let mut finder = CycleFinder {
        graph,
        visited: FnvHashSet::default(),
        on_path: FnvHashSet::default(),
        path: Vec::new(),
        cycles: Vec::new(),
    };
    for node in graph.nodes() {
        finder.visit(node);
    }
    finder.cycles
}

struct CycleFinder<'a> {
    graph: &'a LockGraph,
    /// Fully expanded nodes, preserved across start nodes.
    visited: FnvHashSet<String>,
    /// Nodes on the current DFS path.
    on_path: FnvHashSet<String>,
    path: Vec<String>,
    cycles: Vec<Vec<String>>,
}

impl CycleFinder<'_> {
    fn visit(&mut self, node: &str) {
        if self.on_path.contains(node) {
            let mut closed = self.path.clone();
            closed.push(node.to_owned());
            self.cycles.push(closed);
            return;
        }
        if self.visited.contains(node) {
            return;
        }
        self.visited.insert(node.to_owned());
        self.on_path.insert(node.to_owned());
        self.path.push(node.to_owned());
        for next in self.graph.neighbors(node) {
            self.visit(next);
        }
        self.path.pop();
        self.on_path.remove(node);
    }
}
