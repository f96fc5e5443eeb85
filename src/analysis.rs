//! Main API entry point for running the deadlock analysis.
//!
//! A variable of type `Analysis` represents one analyser instance. Construct
//! it with the options that should hold for its lifetime, load sources with
//! the `parse` method (from disk via [`Analysis::parse_files`], or from
//! memory, which is how the tests drive it), then query analysis results,
//! which are computed on demand. Calling `parse` again replaces everything:
//! accumulated functions, class-body statements and symbol state are reset at
//! the start of each run, so re-running on the same input reproduces the same
//! output byte for byte.
//!
//! ## Passes
//!
//! Results are produced by three passes layered on the parse:
//!
//! * **local graphs**: one lock-dependency graph per parsed function,
//!   keyed by fully-qualified lock identities;
//! * **merge**: the union of every local graph under canonical (per-type)
//!   identities;
//! * **cycles**: the closed walks of the merged graph.
//!
//! Each pass is lazy and cached until the next `parse`. The `*_pass` methods
//! compute and return; the `*_result` getters return what a previous pass
//! computed. With the `timing` option set, each pass prints its wall-clock
//! milliseconds on completion.
//!
//! The `print_*` methods produce the report sections in their fixed order;
//! [`Analysis::print_report`] emits the whole report.

use crate::cycle;
use crate::graph;
use crate::graph::LockGraph;
use crate::parser::{Parser, SourceModel};
use itertools::Itertools;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

/// Options that affect analysis processing, constant for the lifetime of the
/// analyser instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnalysisOptions {
    /// If true, time in milliseconds is printed after the completion of each
    /// pass.
    pub timing: bool,
}

fn time<R, F: FnOnce() -> R>(options: &AnalysisOptions, name: &str, f: F) -> R {
    let now = Instant::now();
    let ret = f();
    if options.timing {
        println!("{} {}ms", name, now.elapsed().as_millis());
    }
    ret
}

/// Master type of analyser instances: the parsed model plus the cached
/// results of every pass run so far.
#[derive(Debug, Default)]
pub struct Analysis {
    options: AnalysisOptions,
    model: SourceModel,
    /// Per-function graphs, in function declaration order.
    local_graphs: Option<Vec<(String, LockGraph)>>,
    merged: Option<LockGraph>,
    cycles: Option<Vec<Vec<String>>>,
}

impl Analysis {
    /// Constructs a new analyser holding an empty model.
    pub fn new(options: AnalysisOptions) -> Analysis {
        Analysis {
            options,
            ..Analysis::default()
        }
    }

    /// Replaces the analysed model with the parsed content of the given
    /// named sources, invalidating every cached pass.
    ///
    /// Sources are parsed in order; the ambient class and class-body scope
    /// carry forward across them, so the pair order matters exactly as the
    /// argument order of the command line does.
    pub fn parse(&mut self, sources: Vec<(String, String)>) {
        time(&self.options, "parse", || {
            let mut parser = Parser::new();
            for (name, text) in &sources {
                debug!("parsing {}", name);
                parser.parse_source(name, text);
            }
            self.model = parser.finish();
            self.local_graphs = None;
            self.merged = None;
            self.cycles = None;
            info!(
                "parsed {} function(s), {} global statement(s)",
                self.model.functions.len(),
                self.model.globals.len()
            );
        });
    }

    /// Reads each path and hands the contents to [`Analysis::parse`]. Any
    /// read failure aborts the whole run with an error naming the file.
    pub fn parse_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> io::Result<()> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let text = fs::read_to_string(path)
                .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
            sources.push((path.display().to_string(), text));
        }
        self.parse(sources);
        Ok(())
    }

    /// Obtains a reference to the current parsed model.
    pub fn parse_result(&self) -> &SourceModel {
        &self.model
    }

    /// Computes and returns the per-function lock-dependency graphs.
    pub fn local_graphs_pass(&mut self) -> &[(String, LockGraph)] {
        if self.local_graphs.is_none() {
            time(&self.options, "local graphs", || {
                let graphs = self
                    .model
                    .functions
                    .iter()
                    .map(|function| (function.name.clone(), graph::function_graph(function)))
                    .collect();
                self.local_graphs = Some(graphs);
            });
        }
        self.local_graphs_result()
    }

    /// Returns the per-function graphs.
    /// Panics if [`Analysis::local_graphs_pass`] was not previously called.
    pub fn local_graphs_result(&self) -> &[(String, LockGraph)] {
        self.local_graphs.as_ref().unwrap()
    }

    /// Computes and returns the merged global lock-dependency graph.
    pub fn merged_pass(&mut self) -> &LockGraph {
        if self.merged.is_none() {
            self.local_graphs_pass();
            time(&self.options, "merge", || {
                let local = self.local_graphs.as_ref().unwrap();
                let merged = graph::merge_graphs(local.iter().map(|(_, g)| g));
                self.merged = Some(merged);
            });
        }
        self.merged_result()
    }

    /// Returns the merged graph.
    /// Panics if [`Analysis::merged_pass`] was not previously called.
    pub fn merged_result(&self) -> &LockGraph {
        self.merged.as_ref().unwrap()
    }

    /// Computes and returns the potential deadlock cycles.
    pub fn cycles_pass(&mut self) -> &[Vec<String>] {
        if self.cycles.is_none() {
            self.merged_pass();
            time(&self.options, "cycles", || {
                let cycles = cycle::enumerate_cycles(self.merged.as_ref().unwrap());
                info!("{} potential deadlock path(s)", cycles.len());
                self.cycles = Some(cycles);
            });
        }
        self.cycles_result()
    }

    /// Returns the cycles of the merged graph.
    /// Panics if [`Analysis::cycles_pass`] was not previously called.
    pub fn cycles_result(&self) -> &[Vec<String>] {
        self.cycles.as_ref().unwrap()
    }

    /// Dump every parsed function declaration.
    pub fn print_functions(&self) {
        println!("---- Function Declarations ----");
        for function in &self.model.functions {
            function.dump();
        }
    }

    /// Dump every class-body-level statement.
    pub fn print_globals(&self) {
        println!("---- Global Statements ----");
        for stmt in &self.model.globals {
            stmt.dump(0);
        }
    }

    /// Dump the per-function lock-dependency graphs.
    pub fn print_local_graphs(&mut self) {
        println!("---- Lock-dependancy graphs (Local per Function) ----");
        for (name, graph) in self.local_graphs_pass() {
            println!("Function {}:", name);
            println!("Lock Order Graph:");
            graph.dump();
        }
    }

    /// Dump the merged global lock-dependency graph.
    pub fn print_merged(&mut self) {
        println!("---- Merged global lock-dependancy graph ----");
        self.merged_pass().dump();
    }

    /// Dump the potential deadlock paths as a bracketed list of vertex lists.
    pub fn print_cycles(&mut self) {
        let rendered = self
            .cycles_pass()
            .iter()
            .map(|cycle| format!("[{}]", cycle.iter().join(", ")))
            .join(", ");
        println!("Potential deadlock paths: [{}]", rendered);
    }

    /// Runs every pass and prints the full report in its fixed order.
    pub fn print_report(&mut self) {
        self.print_functions();
        self.print_globals();
        self.print_local_graphs();
        self.print_merged();
        self.print_cycles();
    }

    /// Export the merged graph of this analysis in DOT format.
    #[cfg(feature = "dot")]
    pub fn export_graph_dot(&mut self) -> io::Result<()> {
        self.merged_pass();
        let mut file = fs::File::create("lock-graph.dot")?;
        self.merged_result().export_dot(&mut file)
    }
}
