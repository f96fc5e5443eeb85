//! Lock-dependency graphs.
//!
//! An edge `L1 -> L2` records that some program point holds `L1` while
//! acquiring `L2`. Per-function graphs are keyed by fully-qualified lock
//! identities (`TYPE:SITE`); the merged global graph is keyed by canonical
//! identities (the `TYPE` part alone), which collapses every instance of a
//! monitor-bearing type onto one node. That collapse is a deliberate
//! over-approximation: it cannot tell deadlock-safe multi-instance nesting
//! apart from a genuine cycle.
//!
//! Nodes are value-typed strings, so the inherently cyclic graph needs no
//! pointer structure at all; adjacency is a map from source to the set of
//! destinations, and every observable iteration is in sorted order.

use crate::parser::{Function, Statement};
use fnv::{FnvHashMap, FnvHashSet};
use itertools::Itertools;

/// A directed graph over lock identities with unique edges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockGraph {
    edges: FnvHashMap<String, FnvHashSet<String>>,
}

impl LockGraph {
    /// Insert the edge `from -> to`; duplicates collapse.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges
            .entry(from.to_owned())
            .or_default()
            .insert(to.to_owned());
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.get(from).map_or(false, |dests| dests.contains(to))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(FnvHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every node that appears as a source or a destination, sorted.
    pub fn nodes(&self) -> Vec<&str> {
        self.edges
            .iter()
            .flat_map(|(from, dests)| {
                std::iter::once(from.as_str()).chain(dests.iter().map(String::as_str))
            })
            .unique()
            .sorted()
            .collect()
    }

    /// Successors of `node`, sorted. Destination-only nodes have none.
    pub fn neighbors(&self, node: &str) -> Vec<&str> {
        self.edges.get(node).map_or_else(Vec::new, |dests| {
            dests.iter().map(String::as_str).sorted().collect()
        })
    }

    /// Every edge, sorted by source then destination.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(from, dests)| dests.iter().map(move |to| (from.as_str(), to.as_str())))
            .sorted()
            .collect()
    }

    /// The same graph with every identity collapsed to its canonical form.
    pub fn canonicalized(&self) -> LockGraph {
        let mut canon = LockGraph::default();
        for (from, to) in self.edges() {
            canon.add_edge(canonical(from), canonical(to));
        }
        canon
    }

    /// Dump every edge, one per line.
    pub fn dump(&self) {
        for (from, to) in self.edges() {
            println!("  {} -> {}", from, to);
        }
    }

    /// Write this graph in Graphviz DOT format.
    #[cfg(feature = "dot")]
    pub fn export_dot(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        let mut buffer = Vec::new();
        {
            let mut writer = dot_writer::DotWriter::from(&mut buffer);
            let mut digraph = writer.digraph();
            for (from, to) in self.edges() {
                digraph.edge(format!("\"{}\"", from), format!("\"{}\"", to));
            }
        }
        out.write_all(&buffer)
    }
}

/// The `TYPE` portion of a lock identity: the substring before the first `:`,
/// or the whole string when there is none (degraded identities).
pub fn canonical(id: &str) -> &str {
    match id.find(':') {
        Some(colon) => &id[..colon],
        None => id,
    }
}

/// Build a function's lock-dependency graph by walking its statement tree in
/// source order with a stack of currently held lock identities.
///
/// Entering a monitor region acquires on top of whatever is held, so an edge
/// is emitted from the stack top to the region's identity (self-edges
/// included) before the region is pushed. A wait operation releases and
/// re-acquires its own monitor: it contributes an edge from the stack top
/// unless it targets that same identity, and is never pushed.
pub fn function_graph(function: &Function) -> LockGraph {
    let mut graph = LockGraph::default();
    let mut held: Vec<String> = Vec::new();
    collect_edges(&function.body, &mut held, &mut graph);
    debug_assert!(held.is_empty());
    graph
}

fn collect_edges(body: &[Statement], held: &mut Vec<String>, graph: &mut LockGraph) {
    for stmt in body {
        match stmt {
            Statement::Monitor(region) => {
                let id = region.lock_id();
                if let Some(top) = held.last() {
                    graph.add_edge(top, &id);
                }
                held.push(id);
                collect_edges(&region.body, held, graph);
                held.pop();
            }
            Statement::Wait(wait) => {
                let id = wait.lock_id();
                if let Some(top) = held.last() {
                    if *top != id {
                        graph.add_edge(top, &id);
                    }
                }
            }
            Statement::Generic { .. } | Statement::VarDecl { .. } => {}
        }
    }
}

/// Union per-function graphs into the merged global graph, canonicalising
/// every endpoint on the way in.
pub fn merge_graphs<'a>(graphs: impl IntoIterator<Item = &'a LockGraph>) -> LockGraph {
    let mut merged = LockGraph::default();
    for graph in graphs {
        for (from, to) in graph.edges() {
            merged.add_edge(canonical(from), canonical(to));
        }
    }
    merged
}
