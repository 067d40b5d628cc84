//! Declarative tree-shape queries.
//!
//! A pattern is compiled once from a textual spec and then evaluated against
//! any number of nodes, concurrently if desired; compiled patterns are
//! immutable and carry no evaluation state.
//!
//! Syntax:
//!
//! ```text
//! pattern  := '(' TAG element* ')'   node of TAG whose children match the sequence
//!           | TAG                    node of TAG, children unconstrained
//!           | '{' pattern+ '}'       alternation, first match wins; all-symbol
//!                                    bodies compile to a set-membership test
//!           | '$' NAME ':' pattern   capture the matched node under NAME
//!           | '_'                    any single node
//!           | ':' IDENT              sym leaf with that value
//!           | INT                    int leaf with that value
//!           | '"' text '"'           str leaf with that value
//! element  := pattern | '...' | '$' NAME ':' '...'
//! ```
//!
//! A child sequence matches greedily from both ends: fixed positions before
//! the `...` bind from the front, fixed positions after it from the back,
//! and the `...` absorbs the middle (as an ordered capture when named).
//! Without `...` the child count must match exactly. For leaf tags a single
//! child position constrains the value: `(int 3)`, `(sym _)`.

mod lexer;
mod matcher;
mod parser;

use std::collections::HashMap;

use thiserror::Error;

use crate::tree::{NodeId, Tree};

pub use parser::pattern_summary;

/// Compile-time failure of a pattern spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unexpected character `{ch}` at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("capture at byte {pos} must be written `$name:pattern`")]
    MalformedCapture { pos: usize },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected end of pattern")]
    UnexpectedEnd,
    #[error("unbalanced group: expected `{expected}`")]
    UnbalancedGroup { expected: char },
    #[error("trailing input after pattern")]
    TrailingInput,
    #[error("unknown tag name `{0}`")]
    UnknownTag(String),
    #[error("alternation group may not be empty")]
    EmptyAlternation,
    #[error("`...` is only allowed inside a child sequence")]
    MisplacedRest,
    #[error("more than one `...` in a child sequence")]
    DuplicateRest,
    #[error("duplicate capture name `{0}`")]
    DuplicateCapture(String),
    #[error("capture `{0}` is not bound by every alternation branch")]
    CaptureMismatch(String),
    #[error("invalid value pattern for leaf tag `{0}`")]
    InvalidLeafPattern(String),
}

/// A single captured binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    One(NodeId),
    Many(Vec<NodeId>),
}

/// Named bindings produced by a successful match.
#[derive(Debug, Clone, Default)]
pub struct CaptureSet {
    map: HashMap<String, Capture>,
}

impl CaptureSet {
    pub(crate) fn from_log(log: Vec<(String, Capture)>) -> Self {
        Self {
            map: log.into_iter().collect(),
        }
    }

    /// The single node bound under `name`.
    pub fn node(&self, name: &str) -> Option<NodeId> {
        match self.map.get(name)? {
            Capture::One(id) => Some(*id),
            Capture::Many(_) => None,
        }
    }

    /// The ordered node sequence bound under `name` by a `$name:...` rest.
    pub fn nodes(&self, name: &str) -> Option<&[NodeId]> {
        match self.map.get(name)? {
            Capture::Many(ids) => Some(ids),
            Capture::One(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A compiled, reentrant tree-shape query.
#[derive(Debug)]
pub struct Pattern {
    root: matcher::Step,
}

impl Pattern {
    /// Compile a pattern spec, validating structure, tag names, and capture
    /// bindings. Compiled patterns are `Send + Sync` and may be shared
    /// across threads.
    pub fn compile(spec: &str) -> Result<Pattern, PatternError> {
        let tokens = lexer::tokenize(spec)?;
        let ast = parser::parse(tokens)?;
        parser::binding_names(&ast)?;
        let root = matcher::lower(&ast)?;
        Ok(Pattern { root })
    }

    /// Evaluate the pattern against one node. Returns the captured bindings
    /// on success, `None` on any mismatch.
    pub fn match_at(&self, tree: &Tree, node: NodeId) -> Option<CaptureSet> {
        let mut log = Vec::new();
        if self.root.matches(tree, node, &mut log) {
            Some(CaptureSet::from_log(log))
        } else {
            None
        }
    }
}
