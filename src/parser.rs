//! The line-oriented source parser.
//!
//! The input language is a brace-delimited, C-family object language with
//! monitor-style intrinsic locking. We do not attempt a grammar for it. The
//! parser walks the physical lines of each file and recognises exactly four
//! line shapes (function header, monitor-region header, wait operation,
//! variable declaration) by regular expression; every other non-empty line
//! that is not a lone `}` is kept as an opaque generic statement. A block ends
//! at the first trimmed line that is exactly `}`.
//!
//! This is deliberately syntactic. The parser keeps no string-literal or
//! comment state, assumes one statement per physical line, and will be fooled
//! by inline braces or multi-line constructs. Anything it cannot read it
//! recovers into a generic statement, so malformed input never aborts a run.
//!
//! Monitor expressions are resolved while parsing, against the scope chain
//! visible at the line where the region or wait appears (see [`crate::scope`]).
//! Line numbers are stored 1-origin everywhere they surface.

use crate::scope::{DeclSite, MonitorIdentity, ScopeStack};
use itertools::Itertools;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    /// First line of this shape names the file's ambient class.
    static ref CLASS_RE: Regex = Regex::new(
        r"^\s*(?:(?:public|protected|private|abstract|final|static)\s+)*class\s+([A-Za-z_$][\w$]*)"
    )
    .unwrap();
    /// `synchronized ( <expr> ) {`; inner parentheses unsupported.
    static ref MONITOR_RE: Regex =
        Regex::new(r"^synchronized\s*\(\s*([^)]*?)\s*\)\s*\{$").unwrap();
    /// `<ident>.wait();` or bare `wait();`. Timed waits do not match.
    static ref WAIT_RE: Regex =
        Regex::new(r"^(?:([A-Za-z_$][\w$]*)\s*\.\s*)?wait\s*\(\s*\)\s*;$").unwrap();
    /// `<type> <name> [= <init>];` where the type may carry `<...>` or `[]`.
    static ref VAR_DECL_RE: Regex =
        Regex::new(r"^([A-Za-z_$][\w$<>\[\],]*)\s+([A-Za-z_$][\w$]*)\s*(?:=[^;]*)?;$").unwrap();
    /// `(<mods>)* <return-type> <name> ( <params> ) (throws …)? {`
    static ref FUNCTION_RE: Regex = Regex::new(
        r"^((?:(?:public|protected|private|static|final|abstract|synchronized)\s+)*)([A-Za-z_$][\w$<>\[\],]*)\s+([A-Za-z_$][\w$]*)\s*\(([^)]*)\)\s*(?:throws\s+[\w$.,\s]+)?\{$"
    )
    .unwrap();
    /// A bare identifier, the only expression form the resolver accepts.
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
}

/// A monitor-protected region: `synchronized (expr) { … }`, or the synthetic
/// outer region wrapped around the body of a monitor-method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorRegion {
    /// 1-origin line of the region header.
    pub line: usize,
    /// The monitor expression, verbatim from between the parentheses.
    pub expr: String,
    /// The statements enclosed by the region.
    pub body: Vec<Statement>,
    /// Resolved identity, or `None` when `expr` is not a known identifier.
    pub identity: Option<MonitorIdentity>,
}

/// A `wait()` call: releases the target's monitor, suspends, re-acquires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitOperation {
    /// 1-origin line of the call.
    pub line: usize,
    /// The qualifier, or `this` when the source wrote a bare `wait()`.
    pub target: String,
    /// Resolved identity, or `None` when `target` is not a known identifier.
    pub identity: Option<MonitorIdentity>,
}

/// One parsed statement. Everything the analyser does not understand is a
/// `Generic`, which downstream passes ignore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// An opaque line, stored trimmed.
    Generic { line: usize, text: String },
    /// A variable declaration, also bound into the scope at parse time.
    VarDecl {
        line: usize,
        var_type: String,
        name: String,
    },
    /// A monitor-protected region.
    Monitor(MonitorRegion),
    /// A wait operation.
    Wait(WaitOperation),
}

fn lock_id(identity: &Option<MonitorIdentity>, raw: &str) -> String {
    match identity {
        Some(identity) => identity.to_string(),
        // Degraded identity: the raw expression text, used for equality only.
        None => raw.to_owned(),
    }
}

impl MonitorRegion {
    /// The fully-qualified lock identity guarding this region.
    pub fn lock_id(&self) -> String {
        lock_id(&self.identity, &self.expr)
    }
}

impl WaitOperation {
    /// The fully-qualified lock identity of the wait target.
    pub fn lock_id(&self) -> String {
        lock_id(&self.identity, &self.target)
    }
}

impl Statement {
    /// 1-origin source line of this statement.
    pub fn line(&self) -> usize {
        match self {
            Statement::Generic { line, .. } | Statement::VarDecl { line, .. } => *line,
            Statement::Monitor(region) => region.line,
            Statement::Wait(wait) => wait.line,
        }
    }

    /// Dump this statement (and any enclosed ones) one per indented line.
    pub fn dump(&self, indent: usize) {
        let pad = indent * 2;
        match self {
            Statement::Generic { text, .. } => println!("{:pad$}{}", "", text, pad = pad),
            Statement::VarDecl {
                var_type, name, ..
            } => println!("{:pad$}{} {};", "", var_type, name, pad = pad),
            Statement::Monitor(region) => {
                println!(
                    "{:pad$}synchronized ({}) [{}] {{",
                    "",
                    region.expr,
                    region.lock_id(),
                    pad = pad
                );
                for stmt in &region.body {
                    stmt.dump(indent + 1);
                }
                println!("{:pad$}}}", "", pad = pad);
            }
            Statement::Wait(wait) => println!(
                "{:pad$}{}.wait(); [{}]",
                "",
                wait.target,
                wait.lock_id(),
                pad = pad
            ),
        }
    }
}

/// A formal parameter, bound into the function scope at the header line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub param_type: String,
    pub name: String,
}

/// A parsed function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    /// The ambient class at the point the function was parsed.
    pub class_name: String,
    /// Declared return type, verbatim.
    pub return_type: String,
    pub name: String,
    pub params: Vec<Parameter>,
    /// 1-origin line of the header.
    pub line: usize,
    /// Top-level statements of the body. For a monitor-method this is exactly
    /// one synthetic `this` monitor region enclosing the real body.
    pub body: Vec<Statement>,
    /// True when the header carried the `synchronized` modifier.
    pub monitor_method: bool,
}

impl Function {
    /// Dump the header and the body statement tree.
    pub fn dump(&self) {
        let params = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.param_type, p.name))
            .join(", ");
        println!(
            "{}{} {}.{}({}) (line {})",
            if self.monitor_method {
                "synchronized "
            } else {
                ""
            },
            self.return_type,
            self.class_name,
            self.name,
            params,
            self.line
        );
        for stmt in &self.body {
            stmt.dump(1);
        }
    }
}

/// Everything one run parsed: the functions of all input files, in order, and
/// the statements that appeared at class-body level.
#[derive(Debug, Default)]
pub struct SourceModel {
    pub functions: Vec<Function>,
    pub globals: Vec<Statement>,
}

/// The recursive-descent line parser. One `Parser` serves a whole run; the
/// ambient class and the class-body scope carry forward from file to file,
/// so a later file's class name governs statements parsed after it.
#[derive(Debug, Default)]
pub struct Parser {
    class_name: String,
    scopes: ScopeStack,
    model: SourceModel,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Consume the parser, yielding the accumulated model.
    pub fn finish(self) -> SourceModel {
        self.model
    }

    /// Parse one named source text into the accumulated model.
    pub fn parse_source(&mut self, name: &str, text: &str) {
        let lines: Vec<&str> = text.lines().collect();
        self.extract_class(name, &lines);
        self.parse_top_level(&lines);
    }

    /// The class extractor: the first matching line names the ambient class.
    fn extract_class(&mut self, name: &str, lines: &[&str]) {
        for line in lines {
            if let Some(caps) = CLASS_RE.captures(line) {
                self.class_name = caps[1].to_owned();
                debug!("{}: ambient class {}", name, self.class_name);
                return;
            }
        }
        debug!("{}: no class declaration, ambient class unchanged", name);
    }

    /// Top-level scheduler: function headers are recognised here, a lone `}`
    /// is the class closer and is skipped, everything else goes through the
    /// same statement scheduler as block bodies and lands in the globals.
    fn parse_top_level(&mut self, lines: &[&str]) {
        let mut i = 0;
        while i < lines.len() {
            let trimmed = lines[i].trim();
            if trimmed.is_empty() || trimmed == "}" {
                i += 1;
            } else if FUNCTION_RE.is_match(trimmed) {
                i = self.parse_function(lines, i);
            } else {
                let (stmt, next) = self.parse_statement(lines, i);
                self.model.globals.push(stmt);
                i = next;
            }
        }
    }

    /// Parse a function starting at its header line index; returns the index
    /// past the body's closing `}`.
    fn parse_function(&mut self, lines: &[&str], header: usize) -> usize {
        let trimmed = lines[header].trim();
        let caps = FUNCTION_RE
            .captures(trimmed)
            .expect("caller matched the header");
        let line = header + 1;
        let mods = &caps[1];
        let params = parse_parameters(&caps[4]);

        self.scopes.push();
        for param in &params {
            self.scopes.bind(&param.name, &param.param_type, line);
        }
        let (body, next) = self.parse_block(lines, header + 1);
        self.scopes.pop();

        let monitor_method = mods.split_whitespace().any(|m| m == "synchronized");
        let body = if monitor_method {
            // The whole body of a monitor-method runs under the receiver's
            // monitor; represent that as an ordinary region on `this` so the
            // graph builder needs no special case.
            vec![Statement::Monitor(MonitorRegion {
                line,
                expr: "this".to_owned(),
                body,
                identity: Some(MonitorIdentity {
                    object_type: self.class_name.clone(),
                    site: DeclSite::Ground,
                }),
            })]
        } else {
            body
        };

        debug!(
            "parsed function {}.{} at line {}",
            self.class_name, &caps[3], line
        );
        self.model.functions.push(Function {
            class_name: self.class_name.clone(),
            return_type: caps[2].to_owned(),
            name: caps[3].to_owned(),
            params,
            line,
            body,
            monitor_method,
        });
        next
    }

    /// Parse a block body starting at `start`, up to the line that is exactly
    /// `}`. Returns the statements and the index past the closer. Hitting EOF
    /// first returns what was collected; a missing brace never aborts.
    fn parse_block(&mut self, lines: &[&str], start: usize) -> (Vec<Statement>, usize) {
        self.scopes.push();
        let mut body = Vec::new();
        let mut i = start;
        while i < lines.len() {
            let trimmed = lines[i].trim();
            if trimmed.is_empty() {
                i += 1;
                continue;
            }
            if trimmed == "}" {
                self.scopes.pop();
                return (body, i + 1);
            }
            let (stmt, next) = self.parse_statement(lines, i);
            body.push(stmt);
            i = next;
        }
        self.scopes.pop();
        (body, i)
    }

    /// The statement scheduler, in priority order: monitor-region header,
    /// wait operation, variable declaration, generic.
    fn parse_statement(&mut self, lines: &[&str], i: usize) -> (Statement, usize) {
        let trimmed = lines[i].trim();
        let line = i + 1;

        if let Some(caps) = MONITOR_RE.captures(trimmed) {
            let expr = caps[1].to_owned();
            // Resolve against the scope visible at the header, not inside
            // the region's own block.
            let identity = self.resolve(&expr, line);
            let (body, next) = self.parse_block(lines, i + 1);
            return (
                Statement::Monitor(MonitorRegion {
                    line,
                    expr,
                    body,
                    identity,
                }),
                next,
            );
        }

        if let Some(caps) = WAIT_RE.captures(trimmed) {
            let target = caps.get(1).map_or("this", |m| m.as_str()).to_owned();
            let identity = self.resolve(&target, line);
            return (
                Statement::Wait(WaitOperation {
                    line,
                    target,
                    identity,
                }),
                i + 1,
            );
        }

        if let Some(caps) = VAR_DECL_RE.captures(trimmed) {
            let var_type = caps[1].to_owned();
            let name = caps[2].to_owned();
            self.scopes.bind(&name, &var_type, line);
            return (
                Statement::VarDecl {
                    line,
                    var_type,
                    name,
                },
                i + 1,
            );
        }

        (
            Statement::Generic {
                line,
                text: trimmed.to_owned(),
            },
            i + 1,
        )
    }

    /// The monitor resolver (see the module docs of [`crate::scope`]).
    fn resolve(&self, expr: &str, line: usize) -> Option<MonitorIdentity> {
        if expr == "this" {
            return Some(MonitorIdentity {
                object_type: self.class_name.clone(),
                site: DeclSite::Ground,
            });
        }
        if IDENT_RE.is_match(expr) {
            if let Some(binding) = self.scopes.lookup(expr) {
                return Some(MonitorIdentity {
                    object_type: binding.var_type.clone(),
                    site: DeclSite::Line(binding.line),
                });
            }
        }
        debug!("unresolved monitor expression `{}` at line {}", expr, line);
        None
    }
}

/// Split a parameter list on commas; each piece contributes a parameter only
/// when whitespace-splitting yields at least a type token and a name token.
fn parse_parameters(raw: &str) -> Vec<Parameter> {
    raw.split(',')
        .filter_map(|piece| {
            let mut tokens = piece.trim().split_whitespace();
            let param_type = tokens.next()?;
            let name = tokens.next()?;
            Some(Parameter {
                param_type: param_type.to_owned(),
                name: name.to_owned(),
            })
        })
        .collect()
}
