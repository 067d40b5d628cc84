//! Test support: build source text and its tree in lockstep.
//!
//! [`TreeWriter`] appends source text as it creates nodes, so every node's
//! range is correct by construction and assertions never hand-count byte
//! offsets. Rule tests in this crate use it in place of an external parser;
//! out-of-tree rule authors can do the same.

use crate::source::SourceBuffer;
use crate::tree::{NodeId, SourceRange, Tag, Tree, TreeBuilder, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// ` { |p| body }`
    Brace,
    /// ` do |p| body end` (the writer inserts no newlines; emit them in the
    /// body closure with [`TreeWriter::raw`])
    DoEnd,
}

#[derive(Default)]
pub struct TreeWriter {
    src: String,
    builder: TreeBuilder,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current byte offset; the next emitted token starts here.
    pub fn pos(&self) -> usize {
        self.src.len()
    }

    /// Emit text that belongs to no node (whitespace, separators, newlines).
    pub fn raw(&mut self, text: &str) {
        self.src.push_str(text);
    }

    /// Emit `", "` between sibling arguments or pairs.
    pub fn sep(&mut self) {
        self.raw(", ");
    }

    pub fn finish(self, root: NodeId) -> (SourceBuffer, Tree) {
        let tree = self.builder.build(root).expect("writer built invalid tree");
        (SourceBuffer::from_string("test.src", self.src), tree)
    }

    fn span_from(&self, start: usize) -> SourceRange {
        SourceRange::new(start, self.pos())
    }

    /// Zero-width token node at the current offset (`Nil`, empty `Args`).
    pub fn zero(&mut self, tag: Tag) -> NodeId {
        let here = self.pos();
        self.builder.token(tag, SourceRange::new(here, here))
    }

    /// `:name`
    pub fn sym(&mut self, name: &str) -> NodeId {
        let start = self.pos();
        self.raw(":");
        self.raw(name);
        self.builder
            .leaf(Tag::Sym, self.span_from(start), Value::sym(name))
    }

    /// `3`
    pub fn int(&mut self, value: i64) -> NodeId {
        let start = self.pos();
        self.raw(&value.to_string());
        self.builder
            .leaf(Tag::Int, self.span_from(start), Value::Int(value))
    }

    /// A bare identifier read, `doe`.
    pub fn lvar(&mut self, name: &str) -> NodeId {
        let start = self.pos();
        self.raw(name);
        self.builder
            .leaf(Tag::Lvar, self.span_from(start), Value::str(name))
    }

    /// `'text'` (no escape handling; the value is the text between quotes)
    pub fn str_lit(&mut self, text: &str) -> NodeId {
        let start = self.pos();
        self.raw("'");
        self.raw(text);
        self.raw("'");
        self.builder
            .leaf(Tag::Str, self.span_from(start), Value::str(text))
    }

    /// A literal fragment inside a `dstr` (no quotes of its own).
    pub fn str_frag(&mut self, text: &str) -> NodeId {
        let start = self.pos();
        self.raw(text);
        self.builder
            .leaf(Tag::Str, self.span_from(start), Value::str(text))
    }

    /// `#{inner}` interpolation fragment inside a `dstr`.
    pub fn embed(&mut self, inner: &str) -> NodeId {
        let start = self.pos();
        self.raw("#{");
        self.raw(inner);
        self.raw("}");
        self.builder.token(Tag::Embed, self.span_from(start))
    }

    /// `"<fragments>"` composite string; the closure emits the fragments.
    pub fn dstr(&mut self, fragments: impl FnOnce(&mut Self) -> Vec<NodeId>) -> NodeId {
        let start = self.pos();
        self.raw("\"");
        let parts = fragments(self);
        self.raw("\"");
        self.builder.node(Tag::Dstr, self.span_from(start), parts)
    }

    /// A `begin` statement sequence spanning already-emitted statements.
    pub fn begin(&mut self, stmts: Vec<NodeId>) -> NodeId {
        let range = match (stmts.first(), stmts.last()) {
            (Some(&first), Some(&last)) => SourceRange::new(
                self.builder.range_of(first).start,
                self.builder.range_of(last).end,
            ),
            _ => SourceRange::new(self.pos(), self.pos()),
        };
        self.builder.node(Tag::Begin, range, stmts)
    }

    /// `Name` constant reference with empty scope.
    pub fn const_ref(&mut self, name: &str) -> NodeId {
        let start = self.pos();
        let scope = self.zero(Tag::Nil);
        self.raw(name);
        let name_node = self
            .builder
            .leaf(Tag::Sym, self.span_from(start), Value::sym(name));
        self.builder
            .node(Tag::Const, self.span_from(start), vec![scope, name_node])
    }

    /// `[elem, elem]`
    pub fn array(&mut self, elements: impl FnOnce(&mut Self) -> Vec<NodeId>) -> NodeId {
        let start = self.pos();
        self.raw("[");
        let elems = elements(self);
        self.raw("]");
        self.builder.node(Tag::Array, self.span_from(start), elems)
    }

    /// `key: <value>` keyword pair.
    pub fn pair(&mut self, key: &str, value: impl FnOnce(&mut Self) -> NodeId) -> NodeId {
        let start = self.pos();
        let key_node =
            self.builder
                .leaf(Tag::Sym, SourceRange::new(start, start + key.len()), Value::sym(key));
        self.raw(key);
        self.raw(": ");
        let value_node = value(self);
        self.builder
            .node(Tag::Pair, self.span_from(start), vec![key_node, value_node])
    }

    /// A keyword-hash argument spanning the pairs the closure emits.
    pub fn kwargs(&mut self, pairs: impl FnOnce(&mut Self) -> Vec<NodeId>) -> NodeId {
        let start = self.pos();
        let pair_nodes = pairs(self);
        self.builder
            .node(Tag::Hash, self.span_from(start), pair_nodes)
    }

    /// `name args` / `name(args)` / `Namespace.name(args)` message send.
    /// The closure emits the arguments (separated with [`TreeWriter::sep`]).
    pub fn call(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        parens: bool,
        args: impl FnOnce(&mut Self) -> Vec<NodeId>,
    ) -> NodeId {
        let start = self.pos();
        let recv = match namespace {
            Some(ns) => {
                let c = self.const_ref(ns);
                self.raw(".");
                c
            }
            None => self.zero(Tag::Nil),
        };
        let sel = self.write_selector(name);
        self.raw(if parens { "(" } else { " " });
        let mut children = vec![recv, sel];
        children.extend(args(self));
        if parens {
            self.raw(")");
        }
        self.builder
            .node(Tag::Send, self.span_from(start), children)
    }

    /// An argument-less call: `name` or `name()`.
    pub fn call_noargs(&mut self, namespace: Option<&str>, name: &str, parens: bool) -> NodeId {
        let start = self.pos();
        let recv = match namespace {
            Some(ns) => {
                let c = self.const_ref(ns);
                self.raw(".");
                c
            }
            None => self.zero(Tag::Nil),
        };
        let sel = self.write_selector(name);
        if parens {
            self.raw("()");
        }
        self.builder
            .node(Tag::Send, self.span_from(start), vec![recv, sel])
    }

    /// `<recv>.name(args)` with an already-emitted receiver node.
    pub fn method_on(
        &mut self,
        recv: NodeId,
        name: &str,
        parens: bool,
        args: impl FnOnce(&mut Self) -> Vec<NodeId>,
    ) -> NodeId {
        let start = self.builder.range_of(recv).start;
        self.raw(".");
        let sel = self.write_selector(name);
        self.raw(if parens { "(" } else { " " });
        let mut children = vec![recv, sel];
        children.extend(args(self));
        if parens {
            self.raw(")");
        }
        self.builder
            .node(Tag::Send, self.span_from(start), children)
    }

    /// `<recv>.name` with no arguments.
    pub fn method_on_noargs(&mut self, recv: NodeId, name: &str) -> NodeId {
        let start = self.builder.range_of(recv).start;
        self.raw(".");
        let sel = self.write_selector(name);
        self.builder
            .node(Tag::Send, self.span_from(start), vec![recv, sel])
    }

    fn write_selector(&mut self, name: &str) -> NodeId {
        let start = self.pos();
        self.raw(name);
        self.builder
            .leaf(Tag::Sym, self.span_from(start), Value::sym(name))
    }

    /// Attach a block to a call. Params become an `args` node of `arg`
    /// leaves; a multi-statement body is wrapped in `begin`, an empty body
    /// becomes a zero-width `nil` node.
    pub fn block(
        &mut self,
        call: NodeId,
        params: &[&str],
        style: BlockStyle,
        body: impl FnOnce(&mut Self) -> Vec<NodeId>,
    ) -> NodeId {
        let start = self.builder.range_of(call).start;
        match style {
            BlockStyle::Brace => self.raw(" { "),
            BlockStyle::DoEnd => self.raw(" do"),
        }

        let params_node = if params.is_empty() {
            self.zero(Tag::Args)
        } else {
            if style == BlockStyle::DoEnd {
                self.raw(" ");
            }
            let p_start = self.pos();
            self.raw("|");
            let mut leaves = Vec::new();
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    self.sep();
                }
                let a_start = self.pos();
                self.raw(p);
                let leaf = self
                    .builder
                    .leaf(Tag::Arg, self.span_from(a_start), Value::str(*p));
                leaves.push(leaf);
            }
            self.raw("|");
            let node = self.builder.node(Tag::Args, self.span_from(p_start), leaves);
            if style == BlockStyle::Brace {
                self.raw(" ");
            }
            node
        };

        let stmts = body(self);
        let body_node = match stmts.len() {
            0 => self.zero(Tag::Nil),
            1 => stmts[0],
            _ => {
                let first = self.builder.range_of(stmts[0]).start;
                let last = self.builder.range_of(*stmts.last().unwrap()).end;
                self.builder
                    .node(Tag::Begin, SourceRange::new(first, last), stmts)
            }
        };

        match style {
            BlockStyle::Brace => self.raw(" }"),
            BlockStyle::DoEnd => self.raw(" end"),
        }

        self.builder
            .node(Tag::Block, self.span_from(start), vec![call, params_node, body_node])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_bare_call() {
        let mut w = TreeWriter::new();
        let call = w.call(None, "create", false, |w| vec![w.sym("user")]);
        let (source, tree) = w.finish(call);

        assert_eq!(source.as_str(), "create :user");
        assert_eq!(tree.range(call), SourceRange::new(0, 12));
        let children = tree.children(call);
        assert_eq!(tree.tag(children[0]), Tag::Nil);
        assert_eq!(tree.range(children[1]), SourceRange::new(0, 6));
        assert_eq!(tree.range(children[2]), SourceRange::new(7, 12));
    }

    #[test]
    fn writes_namespaced_paren_call() {
        let mut w = TreeWriter::new();
        let call = w.call(Some("FactoryBot"), "create", true, |w| {
            let a = w.sym("user");
            w.sep();
            let b = w.pair("name", |w| w.str_lit("x"));
            vec![a, b]
        });
        let (source, tree) = w.finish(call);

        assert_eq!(source.as_str(), "FactoryBot.create(:user, name: 'x')");
        let children = tree.children(call);
        assert_eq!(tree.tag(children[0]), Tag::Const);
        // selector covers just the method name
        assert_eq!(source.text(tree.range(children[1])), "create");
        assert_eq!(source.text(tree.range(children[3])), "name: 'x'");
    }

    #[test]
    fn writes_block_with_params() {
        let mut w = TreeWriter::new();
        let three = w.int(3);
        let times = w.method_on_noargs(three, "times");
        let blk = w.block(times, &["i"], BlockStyle::Brace, |w| {
            vec![w.call(None, "create", false, |w| vec![w.sym("user")])]
        });
        let (source, tree) = w.finish(blk);

        assert_eq!(source.as_str(), "3.times { |i| create :user }");
        let children = tree.children(blk);
        assert_eq!(tree.tag(children[0]), Tag::Send);
        assert_eq!(source.text(tree.range(children[0])), "3.times");
        assert_eq!(source.text(tree.range(children[1])), "|i|");
        assert_eq!(source.text(tree.range(children[2])), "create :user");
    }

    #[test]
    fn writes_do_end_block_without_body() {
        let mut w = TreeWriter::new();
        let call = w.call(None, "describe", false, |w| vec![w.str_lit("  #m")]);
        let blk = w.block(call, &[], BlockStyle::DoEnd, |_| Vec::new());
        let (source, tree) = w.finish(blk);

        assert_eq!(source.as_str(), "describe '  #m' do end");
        assert_eq!(tree.tag(tree.children(blk)[2]), Tag::Nil);
    }

    #[test]
    fn writes_dstr_with_embed() {
        let mut w = TreeWriter::new();
        let d = w.dstr(|w| {
            let a = w.str_frag("  #");
            let e = w.embed(":stuff");
            vec![a, e]
        });
        let (source, tree) = w.finish(d);

        assert_eq!(source.as_str(), "\"  ##{:stuff}\"");
        let parts = tree.children(d);
        assert_eq!(source.text(tree.range(parts[1])), "#{:stuff}");
    }

    #[test]
    fn writes_array_of_calls() {
        let mut w = TreeWriter::new();
        let arr = w.array(|w| {
            let a = w.call(None, "create", true, |w| vec![w.sym("user")]);
            w.sep();
            let b = w.call(None, "create", true, |w| vec![w.sym("user")]);
            vec![a, b]
        });
        let (source, _tree) = w.finish(arr);
        assert_eq!(source.as_str(), "[create(:user), create(:user)]");
    }

    #[test]
    fn multi_statement_body_wrapped_in_begin() {
        let mut w = TreeWriter::new();
        let call = w.call_noargs(None, "setup", false);
        let blk = w.block(call, &[], BlockStyle::Brace, |w| {
            let a = w.lvar("x");
            w.raw("; ");
            let b = w.lvar("y");
            vec![a, b]
        });
        let (source, tree) = w.finish(blk);

        assert_eq!(source.as_str(), "setup { x; y }");
        let body = tree.children(blk)[2];
        assert_eq!(tree.tag(body), Tag::Begin);
        assert_eq!(source.text(tree.range(body)), "x; y");
    }
}
