use crate::cycle::enumerate_cycles;
use crate::graph::LockGraph;
use crate::graph_tests::{DEADLOCK_DEMO_SRC, NESTED_SRC};
use crate::parser_tests::mk_analysis;

fn graph_of(edges: &[(&str, &str)]) -> LockGraph {
    let mut graph = LockGraph::default();
    for (from, to) in edges {
        graph.add_edge(from, to);
    }
    graph
}

fn cycles_of(edges: &[(&str, &str)]) -> Vec<Vec<String>> {
    enumerate_cycles(&graph_of(edges))
}

#[test]
fn empty_graph_has_no_cycles() {
    assert!(enumerate_cycles(&LockGraph::default()).is_empty());
}

#[test]
fn chains_and_diamonds_have_no_cycles() {
    assert!(cycles_of(&[("A", "B"), ("B", "C")]).is_empty());
    assert!(cycles_of(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]).is_empty());
}

#[test]
fn self_edge_closes_immediately() {
    assert_eq!(cycles_of(&[("A", "A")]), vec![vec!["A", "A"]]);
}

#[test]
fn three_cycle_is_reported_once() {
    assert_eq!(
        cycles_of(&[("A", "B"), ("B", "C"), ("C", "A")]),
        vec![vec!["A", "B", "C", "A"]]
    );
}

#[test]
fn lead_in_prefix_is_retained() {
    // The cycle B -> C -> B is entered from A, so the recorded walk keeps
    // the lead-in vertex.
    assert_eq!(
        cycles_of(&[("A", "B"), ("B", "C"), ("C", "B")]),
        vec![vec!["A", "B", "C", "B"]]
    );
}

#[test]
fn interleaved_cycles_come_out_of_one_pass() {
    assert_eq!(
        cycles_of(&[("A", "B"), ("B", "A"), ("B", "C"), ("C", "A")]),
        vec![vec!["A", "B", "A"], vec!["A", "B", "C", "A"]]
    );
}

#[test]
fn disjoint_cycles_are_both_found() {
    assert_eq!(
        cycles_of(&[("A", "B"), ("B", "A"), ("X", "Y"), ("Y", "X")]),
        vec![vec!["A", "B", "A"], vec!["X", "Y", "X"]]
    );
}

#[test]
fn visited_regions_are_not_reexplored_from_later_starts() {
    // Every node of the cycle is also a start node; the cycle must still
    // come out exactly once.
    let cycles = cycles_of(&[("A", "B"), ("B", "C"), ("C", "A"), ("D", "B")]);
    assert_eq!(cycles, vec![vec!["A", "B", "C", "A"]]);
}

#[test]
fn nested_fixture_reports_the_inter_procedural_cycle() {
    let mut analysis = mk_analysis(NESTED_SRC);
    let cycles = analysis.cycles_pass();
    assert_eq!(cycles, &[vec!["A", "B", "C", "A"]]);
}

#[test]
fn deadlock_demo_reports_the_type_self_cycle() {
    let mut analysis = mk_analysis(DEADLOCK_DEMO_SRC);
    let cycles = analysis.cycles_pass();
    assert_eq!(cycles, &[vec!["Object", "Object"]]);
}
