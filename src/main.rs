use clap::{App, Arg};
use lockgraph::{Analysis, AnalysisOptions};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process;

fn main() {
    let app = App::new("lockgraph")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Static lock-order analysis for monitor-based sources")
        .arg(
            Arg::with_name("INPUT")
                .help("Source files to analyse, in order")
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::with_name("timing")
                .long("timing")
                .help("Print milliseconds spent in each analysis pass"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        );
    #[cfg(feature = "dot")]
    let app = app.arg(
        Arg::with_name("export-graph-dot")
            .long("export-graph-dot")
            .help("Write the merged lock-dependency graph to lock-graph.dot"),
    );
    let matches = app.get_matches();

    let level = if matches.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new().with_level(level).init().unwrap();

    let paths: Vec<PathBuf> = matches
        .values_of("INPUT")
        .unwrap()
        .map(PathBuf::from)
        .collect();

    let options = AnalysisOptions {
        timing: matches.is_present("timing"),
    };
    let mut analysis = Analysis::new(options);
    if let Err(error) = analysis.parse_files(&paths) {
        eprintln!("lockgraph: {}", error);
        process::exit(1);
    }

    analysis.print_report();

    #[cfg(feature = "dot")]
    if matches.is_present("export-graph-dot") {
        if let Err(error) = analysis.export_graph_dot() {
            eprintln!("lockgraph: {}", error);
            process::exit(1);
        }
    }
}
