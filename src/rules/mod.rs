//! Built-in rules and the vocabulary they share.

pub mod docstring_spacing;
pub mod list_construction;
pub mod paren_style;

use crate::rule::registry::RuleRegistry;
use crate::source::SourceBuffer;
use crate::tree::{NodeId, Tag, Tree};

/// Test-group constructs that take a description argument.
pub const GROUP_METHODS: &[&str] = &[
    "describe",
    "context",
    "feature",
    "example_group",
    "fdescribe",
    "xdescribe",
    "fcontext",
    "xcontext",
];

/// Example constructs that take a description argument.
pub const EXAMPLE_METHODS: &[&str] = &[
    "it", "specify", "example", "scenario", "its", "fit", "xit", "skip", "pending",
];

/// Factory DSL method names recognized in test code.
pub const FACTORY_METHODS: &[&str] = &[
    "attributes_for",
    "attributes_for_list",
    "attributes_for_pair",
    "build",
    "build_list",
    "build_pair",
    "build_stubbed",
    "build_stubbed_list",
    "build_stubbed_pair",
    "create",
    "create_list",
    "create_pair",
    "generate",
];

/// Namespace constants that may prefix a factory call.
pub const FACTORY_NAMESPACES: &[&str] = &["FactoryBot", "FactoryGirl"];

/// Render a method-name slice as a pattern alternation body, `:a :b :c`.
pub(crate) fn symbol_set(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!(":{n}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The selector (method name) child of a send node.
pub(crate) fn selector(tree: &Tree, send: NodeId) -> Option<NodeId> {
    tree.children(send).get(1).copied()
}

/// The receiver child of a send node.
pub(crate) fn receiver(tree: &Tree, send: NodeId) -> Option<NodeId> {
    tree.children(send).first().copied()
}

/// The argument children of a send node.
pub(crate) fn call_args(tree: &Tree, send: NodeId) -> &[NodeId] {
    let children = tree.children(send);
    if children.len() > 2 { &children[2..] } else { &[] }
}

/// Whether a receiver node is a recognized factory namespace (or absent).
pub(crate) fn is_factory_receiver(tree: &Tree, recv: NodeId) -> bool {
    match tree.tag(recv) {
        Tag::Nil => true,
        Tag::Const => {
            let children = tree.children(recv);
            let unscoped = children
                .first()
                .is_some_and(|&scope| tree.tag(scope) == Tag::Nil);
            let name = children.get(1).and_then(|&n| tree.leaf_text(n));
            unscoped && name.is_some_and(|n| FACTORY_NAMESPACES.contains(&n))
        }
        _ => false,
    }
}

/// The textual receiver prefix to carry into a rewritten call:
/// `"FactoryBot."` for a namespaced call, empty otherwise.
pub(crate) fn receiver_prefix(source: &SourceBuffer, tree: &Tree, send: NodeId) -> String {
    match receiver(tree, send) {
        Some(recv) if tree.tag(recv) == Tag::Const => {
            format!("{}.", source.text(tree.range(recv)))
        }
        _ => String::new(),
    }
}

/// Parenthesization is a source property, not a tree one: a call is
/// parenthesized iff the byte immediately after its selector is `(`.
pub(crate) fn has_parens(source: &SourceBuffer, tree: &Tree, send: NodeId) -> bool {
    selector(tree, send)
        .map(|sel| tree.range(sel).end)
        .and_then(|end| source.byte_at(end))
        == Some(b'(')
}

pub fn register_all(registry: &mut RuleRegistry) {
    registry.register(Box::new(docstring_spacing::DocstringSpacing::new()));
    registry.register(Box::new(paren_style::ParenStyle::new()));
    registry.register(Box::new(list_construction::ListConstruction::new()));
}
