//! Compiled pattern representation and the structural matching algorithm.
//!
//! Lowering turns the parsed AST into [`Step`]s: tag names are resolved
//! against the closed [`Tag`] enumeration, symbol-only alternations become
//! set-membership tests, and child sequences are split around their rest
//! marker for both-ends matching.

use std::collections::HashSet;

use super::PatternError;
use super::parser::Ast;
use crate::pattern::Capture;
use crate::tree::{NodeId, Tag, Tree, Value};

#[derive(Debug)]
pub(crate) enum Step {
    /// Node of a given tag; children constrained when a sequence is present.
    Tag { tag: Tag, children: Option<Seq> },
    /// Leaf of a given tag with an exact value.
    ValueIs { tag: Tag, value: Value },
    /// Sym leaf whose value is a member of the set.
    SymIn(HashSet<String>),
    /// Any single node.
    Any,
    /// First branch to match wins.
    AnyOf(Vec<Step>),
    /// Record the matched node under a name.
    Capture { name: String, inner: Box<Step> },
}

/// An ordered child-list pattern: fixed positions before the rest marker
/// bind from the front, fixed positions after it from the back, the rest
/// absorbs the middle.
#[derive(Debug)]
pub(crate) struct Seq {
    pre: Vec<Step>,
    /// `None` = no rest marker (exact arity); `Some(name)` = rest present,
    /// captured when named.
    rest: Option<Option<String>>,
    post: Vec<Step>,
}

pub(crate) fn lower(ast: &Ast) -> Result<Step, PatternError> {
    match ast {
        Ast::Node { tag, children } => {
            let tag = Tag::from_name(tag).ok_or_else(|| PatternError::UnknownTag(tag.clone()))?;
            if tag.is_leaf() {
                lower_leaf(tag, children)
            } else {
                Ok(Step::Tag {
                    tag,
                    children: Some(lower_seq(children)?),
                })
            }
        }
        Ast::BareTag(name) => {
            let tag = Tag::from_name(name).ok_or_else(|| PatternError::UnknownTag(name.clone()))?;
            Ok(Step::Tag {
                tag,
                children: None,
            })
        }
        Ast::Alt(branches) => {
            if branches.iter().all(|b| matches!(b, Ast::Sym(_))) {
                let set = branches
                    .iter()
                    .filter_map(|b| match b {
                        Ast::Sym(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect();
                return Ok(Step::SymIn(set));
            }
            let lowered = branches.iter().map(lower).collect::<Result<_, _>>()?;
            Ok(Step::AnyOf(lowered))
        }
        Ast::Capture { name, inner } => {
            if matches!(**inner, Ast::Rest) {
                return Err(PatternError::MisplacedRest);
            }
            Ok(Step::Capture {
                name: name.clone(),
                inner: Box::new(lower(inner)?),
            })
        }
        Ast::Wildcard => Ok(Step::Any),
        Ast::Rest => Err(PatternError::MisplacedRest),
        Ast::Sym(s) => Ok(Step::ValueIs {
            tag: Tag::Sym,
            value: Value::Sym(s.clone()),
        }),
        Ast::Int(n) => Ok(Step::ValueIs {
            tag: Tag::Int,
            value: Value::Int(*n),
        }),
        Ast::Str(s) => Ok(Step::ValueIs {
            tag: Tag::Str,
            value: Value::Str(s.clone()),
        }),
    }
}

/// A leaf tag takes at most one child position, constraining its value:
/// `(int 3)`, `(sym _)`, `(str "x")`.
fn lower_leaf(tag: Tag, children: &[Ast]) -> Result<Step, PatternError> {
    match children {
        [] | [Ast::Wildcard] => Ok(Step::Tag {
            tag,
            children: None,
        }),
        [Ast::Sym(s)] if tag == Tag::Sym => Ok(Step::ValueIs {
            tag,
            value: Value::Sym(s.clone()),
        }),
        [Ast::Int(n)] if tag == Tag::Int => Ok(Step::ValueIs {
            tag,
            value: Value::Int(*n),
        }),
        [Ast::Str(s)] if matches!(tag, Tag::Str | Tag::Lvar | Tag::Arg) => Ok(Step::ValueIs {
            tag,
            value: Value::Str(s.clone()),
        }),
        _ => Err(PatternError::InvalidLeafPattern(tag.name().to_string())),
    }
}

fn lower_seq(children: &[Ast]) -> Result<Seq, PatternError> {
    let mut pre = Vec::new();
    let mut rest: Option<Option<String>> = None;
    let mut post = Vec::new();

    for child in children {
        let rest_name = match child {
            Ast::Rest => Some(None),
            Ast::Capture { name, inner } if matches!(**inner, Ast::Rest) => {
                Some(Some(name.clone()))
            }
            _ => None,
        };
        if let Some(name) = rest_name {
            if rest.is_some() {
                return Err(PatternError::DuplicateRest);
            }
            rest = Some(name);
            continue;
        }
        let step = lower(child)?;
        if rest.is_some() {
            post.push(step);
        } else {
            pre.push(step);
        }
    }

    Ok(Seq { pre, rest, post })
}

impl Step {
    pub(crate) fn matches(
        &self,
        tree: &Tree,
        node: NodeId,
        log: &mut Vec<(String, Capture)>,
    ) -> bool {
        match self {
            Step::Any => true,
            Step::Tag { tag, children } => {
                tree.tag(node) == *tag
                    && children
                        .as_ref()
                        .is_none_or(|seq| seq.matches(tree, tree.children(node), log))
            }
            Step::ValueIs { tag, value } => {
                tree.tag(node) == *tag && tree.value(node) == Some(value)
            }
            Step::SymIn(set) => {
                tree.tag(node) == Tag::Sym
                    && tree.leaf_text(node).is_some_and(|s| set.contains(s))
            }
            Step::AnyOf(branches) => {
                for branch in branches {
                    let mark = log.len();
                    if branch.matches(tree, node, log) {
                        return true;
                    }
                    log.truncate(mark);
                }
                false
            }
            Step::Capture { name, inner } => {
                if inner.matches(tree, node, log) {
                    log.push((name.clone(), Capture::One(node)));
                    true
                } else {
                    false
                }
            }
        }
    }
}

impl Seq {
    fn matches(&self, tree: &Tree, children: &[NodeId], log: &mut Vec<(String, Capture)>) -> bool {
        match &self.rest {
            None => {
                children.len() == self.pre.len()
                    && self
                        .pre
                        .iter()
                        .zip(children)
                        .all(|(step, &child)| step.matches(tree, child, log))
            }
            Some(name) => {
                if children.len() < self.pre.len() + self.post.len() {
                    return false;
                }
                let front = &children[..self.pre.len()];
                let back = &children[children.len() - self.post.len()..];
                let middle = &children[self.pre.len()..children.len() - self.post.len()];

                let front_ok = self
                    .pre
                    .iter()
                    .zip(front)
                    .all(|(step, &child)| step.matches(tree, child, log));
                if !front_ok {
                    return false;
                }
                let back_ok = self
                    .post
                    .iter()
                    .zip(back)
                    .all(|(step, &child)| step.matches(tree, child, log));
                if !back_ok {
                    return false;
                }
                if let Some(name) = name {
                    log.push((name.clone(), Capture::Many(middle.to_vec())));
                }
                true
            }
        }
    }
}
