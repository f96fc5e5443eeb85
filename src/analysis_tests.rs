use crate::analysis::{Analysis, AnalysisOptions};
use crate::graph_tests::NESTED_SRC;
use crate::parser_tests::mk_analysis;

const PHILOSOPHER_SRC: &str = "\
public class Philosopher {
    Fork fork;

    public void pickUp() {
        synchronized (fork) {
            eat();
        }
    }
}
";

#[test]
fn a_single_region_with_no_nesting_reports_nothing() {
    let mut analysis = mk_analysis(PHILOSOPHER_SRC);
    assert!(analysis.merged_pass().is_empty());
    assert!(analysis.cycles_pass().is_empty());
}

#[test]
fn empty_input_yields_an_empty_graph() {
    let mut analysis = mk_analysis("");
    assert!(analysis.parse_result().functions.is_empty());
    assert!(analysis.parse_result().globals.is_empty());
    assert!(analysis.merged_pass().is_empty());
    assert!(analysis.cycles_pass().is_empty());
}

#[test]
fn reparse_resets_accumulated_state() {
    let mut analysis = mk_analysis(NESTED_SRC);
    assert!(!analysis.cycles_pass().is_empty());
    analysis.parse(vec![("empty.src".to_owned(), String::new())]);
    assert!(analysis.parse_result().functions.is_empty());
    assert!(analysis.parse_result().globals.is_empty());
    assert!(analysis.cycles_pass().is_empty());
}

#[test]
fn rerunning_the_same_input_is_deterministic() {
    let sources = vec![
        ("one.src".to_owned(), NESTED_SRC.to_owned()),
        ("two.src".to_owned(), PHILOSOPHER_SRC.to_owned()),
    ];
    let mut first = Analysis::new(AnalysisOptions::default());
    first.parse(sources.clone());
    let mut second = Analysis::new(AnalysisOptions::default());
    second.parse(sources);

    assert_eq!(
        first.parse_result().functions,
        second.parse_result().functions
    );
    assert_eq!(first.parse_result().globals, second.parse_result().globals);
    assert_eq!(first.merged_pass(), second.merged_pass());
    assert_eq!(first.cycles_pass(), second.cycles_pass());
}

const CLASS_FILE_SRC: &str = "\
public class Alpha {
    Object pivot;
}
";

const CLASSLESS_FILE_SRC: &str = "\
    public synchronized void spin() {
        synchronized (pivot) {
            turn();
        }
    }
";

const SECOND_CLASS_SRC: &str = "\
public class Beta {
    public void other() {
        run();
    }
}
";

#[test]
fn ambient_class_carries_into_later_files() {
    let mut analysis = Analysis::new(AnalysisOptions::default());
    analysis.parse(vec![
        ("alpha.src".to_owned(), CLASS_FILE_SRC.to_owned()),
        ("spin.src".to_owned(), CLASSLESS_FILE_SRC.to_owned()),
    ]);
    let spin = &analysis.parse_result().functions[0];
    assert_eq!(spin.class_name, "Alpha");
    assert!(spin.monitor_method);
    // `pivot` was declared at class-body level in the earlier file.
    let (_, graph) = &analysis.local_graphs_pass()[0];
    assert!(graph.has_edge("Alpha:ground", "Object:2"));
}

#[test]
fn a_later_class_overwrites_the_ambient_class() {
    let mut analysis = Analysis::new(AnalysisOptions::default());
    analysis.parse(vec![
        ("alpha.src".to_owned(), CLASS_FILE_SRC.to_owned()),
        ("beta.src".to_owned(), SECOND_CLASS_SRC.to_owned()),
    ]);
    let other = &analysis.parse_result().functions[0];
    assert_eq!(other.class_name, "Beta");
}
