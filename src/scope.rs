//! Lexical scoping and monitor identity.
//!
//! The parser consults this module inline: variable declarations and function
//! parameters are bound into the innermost frame as they are read, and every
//! monitor expression is resolved against the frames visible at that point.
//! There is no post-pass; a name is looked up in exactly the scope a reader of
//! the source would see.

use fnv::FnvHashMap;
use std::fmt;

/// Where the object named by a monitor expression was declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclSite {
    /// The receiver object itself (`this` and monitor-methods).
    Ground,
    /// A 1-origin source line: a variable declaration, or the header line of
    /// the function that declared the parameter.
    Line(usize),
}

impl fmt::Display for DeclSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeclSite::Ground => f.write_str("ground"),
            DeclSite::Line(line) => write!(f, "{}", line),
        }
    }
}

/// The (type, declaration site) pair that equates monitor expressions across
/// call sites. Rendered as `TYPE:SITE` this is the fully-qualified lock
/// identity used in per-function graphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorIdentity {
    /// Declared type of the monitor object.
    pub object_type: String,
    /// Declaration site of the monitor object.
    pub site: DeclSite,
}

impl fmt::Display for MonitorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.site)
    }
}

/// What a variable name is bound to: its declared type and declaration line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Declared type, verbatim from the declaration (may carry `<…>` or `[]`).
    pub var_type: String,
    /// 1-origin line of the declaration.
    pub line: usize,
}

/// A stack of scope frames consulted top-down on lookup.
///
/// The bottom frame is the class-body (global) scope and lives for the whole
/// run; every block pushes a frame on entry and pops it on exit, so a block's
/// declarations can never leak into a sibling's scope. Shadowing works by
/// construction: the innermost frame wins.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<FnvHashMap<String, Binding>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack {
            frames: vec![FnvHashMap::default()],
        }
    }
}

impl ScopeStack {
    /// Enter a nested block.
    pub fn push(&mut self) {
        self.frames.push(FnvHashMap::default());
    }

    /// Leave the innermost block, discarding its bindings.
    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "popped the global scope");
        self.frames.pop();
    }

    /// Bind `name` in the innermost frame.
    pub fn bind(&mut self, name: &str, var_type: &str, line: usize) {
        let binding = Binding {
            var_type: var_type.to_owned(),
            line,
        };
        // frames is never empty: the global frame is created in default()
        // and pop() refuses to remove it.
        self.frames
            .last_mut()
            .expect("scope stack has a global frame")
            .insert(name.to_owned(), binding);
    }

    /// Look `name` up through the frames, innermost first.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_inner_frame() {
        let mut scopes = ScopeStack::default();
        scopes.bind("x", "Outer", 3);
        scopes.push();
        scopes.bind("x", "Inner", 7);
        assert_eq!(scopes.lookup("x").unwrap().var_type, "Inner");
        scopes.pop();
        assert_eq!(scopes.lookup("x").unwrap().var_type, "Outer");
    }

    #[test]
    fn sibling_frames_do_not_leak() {
        let mut scopes = ScopeStack::default();
        scopes.push();
        scopes.bind("only_here", "A", 2);
        scopes.pop();
        scopes.push();
        assert!(scopes.lookup("only_here").is_none());
        scopes.pop();
    }

    #[test]
    fn identity_rendering() {
        let ground = MonitorIdentity {
            object_type: "Account".to_owned(),
            site: DeclSite::Ground,
        };
        let sited = MonitorIdentity {
            object_type: "Fork".to_owned(),
            site: DeclSite::Line(12),
        };
        assert_eq!(ground.to_string(), "Account:ground");
        assert_eq!(sited.to_string(), "Fork:12");
    }
}
