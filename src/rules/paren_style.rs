//! Enforces one parenthesization style for factory calls.

use crate::finding::Finding;
use crate::pattern::Pattern;
use crate::rewrite::Edit;
use crate::rule::{Rule, RuleContext};
use crate::rules::{FACTORY_METHODS, has_parens, symbol_set};
use crate::tree::{NodeId, SourceRange, Tag};

const MSG_REQUIRE: &str = "Prefer method call with parentheses";
const MSG_OMIT: &str = "Prefer method call without parentheses";

pub struct ParenStyle {
    pattern: Pattern,
}

impl ParenStyle {
    pub fn new() -> Self {
        let spec = format!(
            "(send $recv:{{(const nil :FactoryBot) (const nil :FactoryGirl) nil}} $name:{{{}}} $args:...)",
            symbol_set(FACTORY_METHODS),
        );
        Self {
            pattern: Pattern::compile(&spec).expect("paren style pattern"),
        }
    }
}

impl Default for ParenStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ParenStyle {
    fn name(&self) -> &'static str {
        "Factory/ConsistentParentheses"
    }

    fn suppress_nested(&self) -> bool {
        true
    }

    fn check_node(&self, ctx: &RuleContext<'_>, node: NodeId) -> Vec<Finding> {
        if ctx.tree.tag(node) != Tag::Send {
            return Vec::new();
        }
        // A call nested directly inside another call is the outer call's
        // concern; flagging both would produce conflicting paren edits.
        if ctx
            .tree
            .parent(node)
            .is_some_and(|p| ctx.tree.tag(p) == Tag::Send)
        {
            return Vec::new();
        }
        let Some(caps) = self.pattern.match_at(ctx.tree, node) else {
            return Vec::new();
        };

        let args = caps.nodes("args").expect("pattern binds args");
        if args.is_empty() {
            return Vec::new();
        }

        let first = args[0];
        let valid_first = matches!(
            ctx.tree.tag(first),
            Tag::Sym | Tag::Str | Tag::Send | Tag::Lvar
        );
        if !valid_first {
            return Vec::new();
        }

        let name_node = caps.node("name").expect("pattern binds name");
        let method_name = ctx.tree.leaf_text(name_node).unwrap_or_default();
        if method_name == "generate" && args.len() > 1 {
            return Vec::new();
        }

        let selector_range = ctx.tree.range(name_node);
        let style = ctx.config.policy_or("require_parentheses");
        let parenthesized = has_parens(ctx.source, ctx.tree, node);

        if style == "require_parentheses" && !parenthesized {
            let first_range = ctx.tree.range(first);
            let last_range = ctx.tree.range(*args.last().expect("args nonempty"));
            let edits = vec![
                Edit::replace(
                    SourceRange::new(selector_range.end, first_range.start),
                    "(",
                ),
                Edit::insert(last_range.end, ")"),
            ];
            return vec![self.finding(ctx, selector_range, MSG_REQUIRE, edits)];
        }

        if style == "omit_parentheses" && parenthesized {
            let call_range = ctx.tree.range(node);
            let first_range = ctx.tree.range(first);
            // Removing parens from a multiline call would change its parse.
            if ctx.source.line_of(call_range.start) != ctx.source.line_of(first_range.start) {
                return Vec::new();
            }
            let edits = vec![
                Edit::replace(
                    SourceRange::new(selector_range.end, selector_range.end + 1),
                    " ",
                ),
                Edit::delete(SourceRange::new(call_range.end - 1, call_range.end)),
            ];
            return vec![self.finding(ctx, selector_range, MSG_OMIT, edits)];
        }

        Vec::new()
    }
}
