//! Converts between repeated factory calls and bulk list construction.
//!
//! `prefer_list_method` rewrites `N.times { create :thing, ... }` (and the
//! `.times.map` variant) into a single `create_list` call, hoisting
//! literal-valued keywords inline and moving dynamic ones into a block that
//! assigns them on the yielded item. `prefer_repeated_call` rewrites
//! `create_list :thing, N, ...` back into an `N.times` block.

use crate::finding::Finding;
use crate::pattern::{CaptureSet, Pattern};
use crate::rewrite::Edit;
use crate::rule::{Rule, RuleContext};
use crate::rules::{has_parens, is_factory_receiver, receiver, receiver_prefix, selector};
use crate::tree::{NodeId, Tag, Tree};

pub struct ListConstruction {
    repetition: Pattern,
    list_call: Pattern,
}

impl ListConstruction {
    pub fn new() -> Self {
        let repetition = Pattern::compile(
            "{(block $rep:(send $count:int :times) $params:args $body:_) \
              (block $rep:(send (send $count:int :times) :map) $params:args $body:_)}",
        )
        .expect("repetition pattern");
        let list_call =
            Pattern::compile("(send $recv:_ :create_list $args:...)").expect("list call pattern");
        Self {
            repetition,
            list_call,
        }
    }
}

impl Default for ListConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ListConstruction {
    fn name(&self) -> &'static str {
        "Factory/ListConstruction"
    }

    fn suppress_nested(&self) -> bool {
        true
    }

    fn check_node(&self, ctx: &RuleContext<'_>, node: NodeId) -> Vec<Finding> {
        match ctx.config.policy_or("prefer_list_method") {
            "prefer_list_method" => match ctx.tree.tag(node) {
                Tag::Block => self
                    .repetition
                    .match_at(ctx.tree, node)
                    .map(|caps| self.check_repetition(ctx, node, &caps))
                    .unwrap_or_default(),
                Tag::Array => self.check_array_literal(ctx, node),
                _ => Vec::new(),
            },
            "prefer_repeated_call" => {
                if ctx.tree.tag(node) != Tag::Send {
                    return Vec::new();
                }
                self.list_call
                    .match_at(ctx.tree, node)
                    .map(|caps| self.check_list_call(ctx, node, &caps))
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }
}

impl ListConstruction {
    /// `N.times { create ... }` under `prefer_list_method`.
    fn check_repetition(
        &self,
        ctx: &RuleContext<'_>,
        block: NodeId,
        caps: &CaptureSet,
    ) -> Vec<Finding> {
        let tree = ctx.tree;
        let source = ctx.source;

        let count = caps.node("count").expect("pattern binds count");
        match tree.value(count).and_then(crate::tree::Value::as_int) {
            Some(n) if n > 1 => {}
            _ => return Vec::new(),
        }

        // A block parameter that the body actually reads means each
        // iteration differs; leave it alone.
        let params = caps.node("params").expect("pattern binds params");
        let body = caps.node("body").expect("pattern binds body");
        let param_names: Vec<&str> = tree
            .children(params)
            .iter()
            .filter_map(|&p| tree.leaf_text(p))
            .collect();
        if !param_names.is_empty() && reads_any(tree, body, &param_names) {
            return Vec::new();
        }

        // The body must be exactly one factory create call, optionally
        // carrying its own trailing block.
        let stmt = match tree.tag(body) {
            Tag::Nil => return Vec::new(),
            Tag::Begin => {
                let children = tree.children(body);
                if children.len() != 1 {
                    return Vec::new();
                }
                children[0]
            }
            _ => body,
        };
        let (create_send, trailing) = match tree.tag(stmt) {
            Tag::Send => (stmt, None),
            Tag::Block => {
                let call = tree.children(stmt)[0];
                if tree.tag(call) != Tag::Send {
                    return Vec::new();
                }
                (call, Some(stmt))
            }
            _ => return Vec::new(),
        };

        if selector(tree, create_send).and_then(|s| tree.leaf_text(s)) != Some("create") {
            return Vec::new();
        }
        let Some(recv) = receiver(tree, create_send) else {
            return Vec::new();
        };
        if !is_factory_receiver(tree, recv) {
            return Vec::new();
        }
        let args = crate::rules::call_args(tree, create_send);
        let Some(&factory) = args.first() else {
            return Vec::new();
        };
        if tree.tag(factory) != Tag::Sym {
            return Vec::new();
        }

        // Split the remaining arguments: positional and literal-valued
        // keywords stay inline, dynamic keywords become block assignments.
        let mut inline: Vec<String> = vec![
            source.text(tree.range(factory)).to_string(),
            source.text(tree.range(count)).to_string(),
        ];
        let mut dynamic: Vec<(String, String)> = Vec::new();
        for &arg in &args[1..] {
            if tree.tag(arg) == Tag::Hash {
                for &pair in tree.children(arg) {
                    let key = tree.children(pair)[0];
                    let value = tree.children(pair)[1];
                    if is_static_value(tree, value) {
                        inline.push(source.text(tree.range(pair)).to_string());
                    } else {
                        dynamic.push((
                            tree.leaf_text(key).unwrap_or_default().to_string(),
                            source.text(tree.range(value)).to_string(),
                        ));
                    }
                }
            } else {
                inline.push(source.text(tree.range(arg)).to_string());
            }
        }

        let block_text = if dynamic.is_empty() {
            trailing
                .map(|tb| {
                    let start = tree.range(create_send).end;
                    let end = tree.range(tb).end;
                    source.as_str()[start..end].to_string()
                })
                .unwrap_or_default()
        } else {
            let param = trailing
                .and_then(|tb| {
                    let tb_params = tree.children(tb)[1];
                    tree.children(tb_params)
                        .first()
                        .and_then(|&p| tree.leaf_text(p))
                })
                .unwrap_or(tree.leaf_text(factory).unwrap_or("item"))
                .to_string();

            let mut lines: Vec<String> = dynamic
                .iter()
                .map(|(key, value)| format!("{param}.{key} = {value}"))
                .collect();
            if let Some(tb) = trailing {
                lines.extend(trailing_statements(tree, source, tb));
            }

            let indent = source.line_indent(tree.range(block).start);
            let body_indent = format!("{indent}  ");
            let body_lines: Vec<String> = lines
                .into_iter()
                .map(|line| format!("{body_indent}{line}"))
                .collect();
            format!(" do |{param}|\n{}\n{indent}end", body_lines.join("\n"))
        };

        let prefix = receiver_prefix(source, tree, create_send);
        let list_args = inline.join(", ");
        let core = if has_parens(source, tree, create_send) || !block_text.is_empty() {
            format!("{prefix}create_list({list_args})")
        } else {
            format!("{prefix}create_list {list_args}")
        };

        let rep = caps.node("rep").expect("pattern binds rep");
        let block_range = tree.range(block);
        vec![self.finding(
            ctx,
            tree.range(rep),
            "Prefer create_list.",
            vec![Edit::replace(block_range, format!("{core}{block_text}"))],
        )]
    }

    /// `create_list :thing, N, ...` under `prefer_repeated_call`.
    fn check_list_call(
        &self,
        ctx: &RuleContext<'_>,
        send: NodeId,
        caps: &CaptureSet,
    ) -> Vec<Finding> {
        let tree = ctx.tree;
        let source = ctx.source;

        let recv = caps.node("recv").expect("pattern binds recv");
        if !is_factory_receiver(tree, recv) {
            return Vec::new();
        }
        let args = caps.nodes("args").expect("pattern binds args");
        if args.len() < 2 {
            return Vec::new();
        }
        if !matches!(tree.tag(args[0]), Tag::Sym | Tag::Str) {
            return Vec::new();
        }
        if tree.tag(args[1]) != Tag::Int {
            return Vec::new();
        }
        match tree.value(args[1]).and_then(crate::tree::Value::as_int) {
            Some(n) if n > 1 => {}
            _ => return Vec::new(),
        }

        let count_src = source.text(tree.range(args[1]));
        let mut inner_args: Vec<&str> = vec![source.text(tree.range(args[0]))];
        inner_args.extend(args[2..].iter().map(|&a| source.text(tree.range(a))));
        let joined = inner_args.join(", ");

        let prefix = receiver_prefix(source, tree, send);
        let inner = if has_parens(source, tree, send) {
            format!("{prefix}create({joined})")
        } else {
            format!("{prefix}create {joined}")
        };

        let sel = selector(tree, send).expect("send has selector");
        vec![self.finding(
            ctx,
            tree.range(sel),
            format!("Prefer {count_src}.times."),
            vec![Edit::replace(
                tree.range(send),
                format!("{count_src}.times {{ {inner} }}"),
            )],
        )]
    }

    /// An array literal of repeated identical factory calls. Detection
    /// only; no correction is proposed for array literals.
    fn check_array_literal(&self, ctx: &RuleContext<'_>, array: NodeId) -> Vec<Finding> {
        let tree = ctx.tree;
        let source = ctx.source;

        let elements = tree.children(array);
        if elements.len() < 2 {
            return Vec::new();
        }

        let mut args_sources: Vec<&str> = Vec::new();
        let mut any_dynamic = false;
        for &elem in elements {
            if tree.tag(elem) != Tag::Send {
                return Vec::new();
            }
            if selector(tree, elem).and_then(|s| tree.leaf_text(s)) != Some("create") {
                return Vec::new();
            }
            let Some(recv) = receiver(tree, elem) else {
                return Vec::new();
            };
            if !is_factory_receiver(tree, recv) {
                return Vec::new();
            }
            let args = crate::rules::call_args(tree, elem);
            args_sources.push(span_text(tree, source, args));
            if args.iter().any(|&a| !is_static_value(tree, a)) {
                any_dynamic = true;
            }
        }
        if args_sources.windows(2).any(|w| w[0] != w[1]) {
            return Vec::new();
        }

        let message = if any_dynamic {
            format!("Prefer {}.times.map.", elements.len())
        } else {
            "Prefer create_list.".to_string()
        };
        vec![self.finding(ctx, tree.range(array), message, Vec::new())]
    }
}

/// Whether a keyword value can be hoisted inline: literals, and containers
/// of literals. This predicate is the single seam for the literal-detection
/// heuristic; everything else in the rule treats values opaquely.
fn is_static_value(tree: &Tree, node: NodeId) -> bool {
    match tree.tag(node) {
        Tag::Str | Tag::Sym | Tag::Int | Tag::Float | Tag::True | Tag::False | Tag::Nil => true,
        Tag::Array | Tag::Hash | Tag::Pair => tree
            .children(node)
            .iter()
            .all(|&c| is_static_value(tree, c)),
        _ => false,
    }
}

/// Whether any local-variable read of one of `names` occurs under `node`.
fn reads_any(tree: &Tree, node: NodeId, names: &[&str]) -> bool {
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if tree.tag(id) == Tag::Lvar && tree.leaf_text(id).is_some_and(|n| names.contains(&n)) {
            return true;
        }
        stack.extend(tree.children(id));
    }
    false
}

/// The verbatim source of each statement in a trailing block's body.
fn trailing_statements(
    tree: &Tree,
    source: &crate::source::SourceBuffer,
    trailing: NodeId,
) -> Vec<String> {
    let body = tree.children(trailing)[2];
    match tree.tag(body) {
        Tag::Nil => Vec::new(),
        Tag::Begin => tree
            .children(body)
            .iter()
            .map(|&s| source.text(tree.range(s)).to_string())
            .collect(),
        _ => vec![source.text(tree.range(body)).to_string()],
    }
}

/// The source text spanning a node slice (empty slice renders empty).
fn span_text<'a>(
    tree: &Tree,
    source: &'a crate::source::SourceBuffer,
    nodes: &[NodeId],
) -> &'a str {
    match (nodes.first(), nodes.last()) {
        (Some(&first), Some(&last)) => {
            let start = tree.range(first).start;
            let end = tree.range(last).end;
            &source.as_str()[start..end]
        }
        _ => "",
    }
}
