pub mod registry;

use crate::config::RuleConfig;
use crate::finding::{Finding, Severity};
use crate::rewrite::Edit;
use crate::source::SourceBuffer;
use crate::tree::{NodeId, SourceRange, Tree};

/// Everything a rule sees for one node visit. All references are read-only;
/// rules hold no per-unit state.
pub struct RuleContext<'a> {
    pub source: &'a SourceBuffer,
    pub tree: &'a Tree,
    pub config: &'a RuleConfig,
}

/// A style rule. Implementations must be `Send + Sync` so they can be
/// shared across worker threads processing independent units.
pub trait Rule: Send + Sync {
    /// The fully-qualified rule name, e.g. "Factory/ConsistentParentheses".
    fn name(&self) -> &'static str;

    fn default_severity(&self) -> Severity {
        Severity::Convention
    }

    /// When true, the runner will not re-invoke this rule on descendants of
    /// a node it already produced findings for.
    fn suppress_nested(&self) -> bool {
        false
    }

    /// Called for every node during traversal. Returns this node's findings;
    /// an empty vec means no match. Must never panic on unexpected shapes.
    fn check_node(&self, ctx: &RuleContext<'_>, node: NodeId) -> Vec<Finding>;

    /// Build a finding flagging `range` with this rule's name and severity.
    fn finding(
        &self,
        ctx: &RuleContext<'_>,
        range: SourceRange,
        message: impl Into<String>,
        edits: Vec<Edit>,
    ) -> Finding
    where
        Self: Sized,
    {
        Finding {
            rule_name: self.name().to_string(),
            severity: self.default_severity(),
            range,
            location: ctx.source.location(range.start),
            message: message.into(),
            edits,
        }
    }
}
