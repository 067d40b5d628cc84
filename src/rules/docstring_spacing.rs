//! Flags excessive whitespace in test-group and example descriptions.

use std::sync::LazyLock;

use regex::Regex;

use crate::finding::Finding;
use crate::pattern::Pattern;
use crate::rewrite::Edit;
use crate::rule::{Rule, RuleContext};
use crate::rules::{EXAMPLE_METHODS, GROUP_METHODS, symbol_set};
use crate::tree::render::{Fragment, fragments};
use crate::tree::{NodeId, Tag};

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new("  +").unwrap());

pub struct DocstringSpacing {
    pattern: Pattern,
}

impl DocstringSpacing {
    pub fn new() -> Self {
        let spec = format!(
            "(block (send _ {{{} {}}} $desc:{{str dstr}} ...) ...)",
            symbol_set(GROUP_METHODS),
            symbol_set(EXAMPLE_METHODS),
        );
        Self {
            pattern: Pattern::compile(&spec).expect("docstring pattern"),
        }
    }
}

impl Default for DocstringSpacing {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DocstringSpacing {
    fn name(&self) -> &'static str {
        "Docstring/ExcessiveSpacing"
    }

    fn check_node(&self, ctx: &RuleContext<'_>, node: NodeId) -> Vec<Finding> {
        if ctx.tree.tag(node) != Tag::Block {
            return Vec::new();
        }
        let Some(caps) = self.pattern.match_at(ctx.tree, node) else {
            return Vec::new();
        };
        let desc = caps.node("desc").expect("pattern binds desc");

        // Exotic description shapes are skipped, never fatal.
        let Ok(parts) = fragments(ctx.tree, ctx.source, desc) else {
            return Vec::new();
        };

        let current: String = parts.iter().map(Fragment::text).collect();
        let corrected = strip_excessive_whitespace(&parts);
        if current == corrected {
            return Vec::new();
        }

        let range = ctx.tree.range(desc);
        if range.len() < 2 {
            return Vec::new();
        }
        let interior = range.interior();
        vec![self.finding(
            ctx,
            interior,
            "Excessive whitespace.",
            vec![Edit::replace(interior, corrected)],
        )]
    }
}

/// Trim the whole description and collapse runs of two or more spaces, but
/// only inside literal fragments: embedded-expression source is carried
/// through byte-for-byte and in order.
fn strip_excessive_whitespace(parts: &[Fragment]) -> String {
    let mut out = String::new();
    for part in parts {
        match part {
            Fragment::Literal(text) => {
                let collapsed = SPACE_RUNS.replace_all(text, " ");
                // A literal fragment starting with a space right after one
                // that ended with a space would re-create a run at the seam.
                let piece: &str = if out.ends_with(' ') {
                    collapsed.trim_start_matches(' ')
                } else {
                    collapsed.as_ref()
                };
                out.push_str(piece);
            }
            Fragment::Verbatim(text) => out.push_str(text),
        }
    }
    out.trim().to_string()
}
