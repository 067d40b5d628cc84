//! Immutable tree model for parsed source.
//!
//! Nodes are produced once (by an external parser or by [`TreeBuilder`]) and
//! never mutated during analysis; all rewriting happens at the text-buffer
//! level via edits. Parent links are non-owning back-references used only
//! for upward queries such as "is my parent also a call".

pub mod render;

use thiserror::Error;

use crate::source::SourceBuffer;

/// Half-open `[start, end)` byte range into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {start}..{end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The range between the quotes of a quoted literal.
    pub fn interior(&self) -> SourceRange {
        SourceRange::new(self.start + 1, self.end.saturating_sub(1))
    }
}

/// Closed set of syntactic kinds the engine understands.
///
/// Structural conventions (child order) every tree producer must follow:
/// - `Send`: `[receiver, selector, arg...]`; receiver is a `Nil` node for
///   receiverless calls, selector a `Sym` leaf over the method name token.
/// - `Block`: `[call, params, body]`; `params` is an `Args` node, `body` a
///   single node, a `Begin` sequence, or a zero-width `Nil` node.
/// - `Const`: `[scope, name]`; scope `Nil` or `Const`, name a `Sym` leaf.
/// - `Pair`: `[key, value]`; `Hash` children are `Pair`s.
/// - `Dstr` children are `Str` and `Embed` fragments, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Tag {
    Send,
    Block,
    Args,
    Arg,
    Begin,
    Str,
    Dstr,
    Embed,
    Sym,
    Int,
    Float,
    True,
    False,
    Nil,
    Const,
    Lvar,
    Pair,
    Hash,
    Array,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Send => "send",
            Tag::Block => "block",
            Tag::Args => "args",
            Tag::Arg => "arg",
            Tag::Begin => "begin",
            Tag::Str => "str",
            Tag::Dstr => "dstr",
            Tag::Embed => "embed",
            Tag::Sym => "sym",
            Tag::Int => "int",
            Tag::Float => "float",
            Tag::True => "true",
            Tag::False => "false",
            Tag::Nil => "nil",
            Tag::Const => "const",
            Tag::Lvar => "lvar",
            Tag::Pair => "pair",
            Tag::Hash => "hash",
            Tag::Array => "array",
        }
    }

    pub fn from_name(name: &str) -> Option<Tag> {
        Some(match name {
            "send" => Tag::Send,
            "block" => Tag::Block,
            "args" => Tag::Args,
            "arg" => Tag::Arg,
            "begin" => Tag::Begin,
            "str" => Tag::Str,
            "dstr" => Tag::Dstr,
            "embed" => Tag::Embed,
            "sym" => Tag::Sym,
            "int" => Tag::Int,
            "float" => Tag::Float,
            "true" => Tag::True,
            "false" => Tag::False,
            "nil" => Tag::Nil,
            "const" => Tag::Const,
            "lvar" => Tag::Lvar,
            "pair" => Tag::Pair,
            "hash" => Tag::Hash,
            "array" => Tag::Array,
            _ => return None,
        })
    }

    /// Leaf tags carry a [`Value`] and never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Tag::Str | Tag::Sym | Tag::Int | Tag::Float | Tag::Lvar | Tag::Arg
        )
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal payload of a leaf node.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Value {
    Str(String),
    Sym(String),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn sym(name: impl Into<String>) -> Self {
        Value::Sym(name.into())
    }

    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    /// The textual payload of a `Str`/`Sym`/`Lvar`/`Arg` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// Index of a node within its [`Tree`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct NodeData {
    tag: Tag,
    range: SourceRange,
    value: Option<Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable arena tree for one analysis unit.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tag(&self, id: NodeId) -> Tag {
        self.nodes[id.index()].tag
    }

    pub fn range(&self, id: NodeId) -> SourceRange {
        self.nodes[id.index()].range
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.nodes[id.index()].value.as_ref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Walk parent links from `id` towards the root, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.parent(id);
        std::iter::from_fn(move || {
            let next = cur?;
            cur = self.parent(next);
            Some(next)
        })
    }

    /// The symbol/string/name text of a leaf node, if it has one.
    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        self.value(id).and_then(Value::as_text)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("child range {child_start}..{child_end} escapes parent range {parent_start}..{parent_end}")]
    RangeOutsideParent {
        parent_start: usize,
        parent_end: usize,
        child_start: usize,
        child_end: usize,
    },
    #[error("node claimed by two parents")]
    ChildClaimedTwice,
    #[error("leaf tag `{0}` given children")]
    LeafWithChildren(Tag),
}

/// Failure surface of the external parser boundary.
#[derive(Debug, Error)]
#[error("syntax error at byte {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

/// The boundary the engine consumes: something that turns source text into a
/// tree. The engine itself never implements parsing.
pub trait Parser {
    fn parse(&self, source: &SourceBuffer) -> Result<Tree, ParseError>;
}

/// Bottom-up tree construction with containment validation.
///
/// Children are created first and handed to their parent; [`TreeBuilder::build`]
/// wires parent links and checks the range-containment invariant.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A leaf node holding a literal value.
    pub fn leaf(&mut self, tag: Tag, range: SourceRange, value: Value) -> NodeId {
        self.push(tag, range, Some(value), Vec::new())
    }

    /// A childless, valueless node (`Nil`, `True`, empty `Args`, ...).
    pub fn token(&mut self, tag: Tag, range: SourceRange) -> NodeId {
        self.push(tag, range, None, Vec::new())
    }

    /// An interior node over already-built children.
    pub fn node(&mut self, tag: Tag, range: SourceRange, children: Vec<NodeId>) -> NodeId {
        self.push(tag, range, None, children)
    }

    /// The range a node was created with. Useful while the tree is still
    /// under construction (e.g. to start a parent at a child's offset).
    pub fn range_of(&self, id: NodeId) -> SourceRange {
        self.nodes[id.index()].range
    }

    fn push(
        &mut self,
        tag: Tag,
        range: SourceRange,
        value: Option<Value>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag,
            range,
            value,
            parent: None,
            children,
        });
        id
    }

    /// Finish the tree rooted at `root`, wiring parent links and validating
    /// that every parent's range contains its children's ranges and that no
    /// node has two parents.
    pub fn build(mut self, root: NodeId) -> Result<Tree, TreeError> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let data = &self.nodes[id.index()];
            if data.tag.is_leaf() && !data.children.is_empty() {
                return Err(TreeError::LeafWithChildren(data.tag));
            }
            let parent_range = data.range;
            let children = data.children.clone();
            for child in children {
                let child_data = &mut self.nodes[child.index()];
                if child_data.parent.is_some() {
                    return Err(TreeError::ChildClaimedTwice);
                }
                if !parent_range.contains(child_data.range) {
                    return Err(TreeError::RangeOutsideParent {
                        parent_start: parent_range.start,
                        parent_end: parent_range.end,
                        child_start: child_data.range.start,
                        child_end: child_data.range.end,
                    });
                }
                child_data.parent = Some(id);
                stack.push(child);
            }
        }
        Ok(Tree {
            nodes: self.nodes,
            root,
        })
    }
}
