//! Flattening of composite string nodes to their displayed text.
//!
//! A description argument may be a plain literal or a composite of literal
//! fragments and embedded-expression fragments. Rendering concatenates
//! literal fragment values and embeds by their exact original source text,
//! never evaluating anything.

use thiserror::Error;

use crate::source::SourceBuffer;
use crate::tree::{NodeId, Tag, Tree};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render `{tag}` node as text")]
    UnsupportedShape { tag: Tag },
}

/// One piece of a flattened composite string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text, eligible for normalization.
    Literal(String),
    /// Embedded-expression source text, preserved byte-for-byte.
    Verbatim(String),
}

impl Fragment {
    pub fn text(&self) -> &str {
        match self {
            Fragment::Literal(s) | Fragment::Verbatim(s) => s,
        }
    }
}

/// The displayed text of a string-like node.
///
/// `str` and `sym` leaves render as their value; `dstr` composites as the
/// in-order concatenation of their parts; `embed` fragments as their exact
/// source text. Any other shape is an [`RenderError::UnsupportedShape`],
/// which callers treat as "skip this node", never as a failed run.
pub fn render_text(
    tree: &Tree,
    source: &SourceBuffer,
    node: NodeId,
) -> Result<String, RenderError> {
    let mut out = String::new();
    for fragment in fragments(tree, source, node)? {
        out.push_str(fragment.text());
    }
    Ok(out)
}

/// The flattened fragment sequence of a string-like node, distinguishing
/// literal from verbatim (embedded-expression) parts.
pub fn fragments(
    tree: &Tree,
    source: &SourceBuffer,
    node: NodeId,
) -> Result<Vec<Fragment>, RenderError> {
    let mut out = Vec::new();
    collect(tree, source, node, &mut out)?;
    Ok(out)
}

fn collect(
    tree: &Tree,
    source: &SourceBuffer,
    node: NodeId,
    out: &mut Vec<Fragment>,
) -> Result<(), RenderError> {
    match tree.tag(node) {
        Tag::Str | Tag::Sym => {
            let text = tree.leaf_text(node).unwrap_or_default();
            out.push(Fragment::Literal(text.to_string()));
            Ok(())
        }
        Tag::Dstr => {
            for &child in tree.children(node) {
                collect(tree, source, child, out)?;
            }
            Ok(())
        }
        Tag::Embed => {
            out.push(Fragment::Verbatim(
                source.text(tree.range(node)).to_string(),
            ));
            Ok(())
        }
        tag => Err(RenderError::UnsupportedShape { tag }),
    }
}
