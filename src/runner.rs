//! Rule execution over one unit's tree, and the parallel batch driver.
//!
//! Traversal is pre-order depth-first with children visited in source
//! order, so findings come out in a stable order (traversal position, then
//! rule registration order) and nested constructs are corrected outermost
//! first. Analysis of one unit is strictly single-threaded; independent
//! units are embarrassingly parallel.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::finding::Finding;
use crate::rewrite::{Edit, EditSet, OverlappingEditsError};
use crate::rule::registry::RuleRegistry;
use crate::rule::{Rule, RuleContext};
use crate::source::SourceBuffer;
use crate::tree::{NodeId, Tree};

/// Run every enabled rule over every node of the tree, pre-order.
pub fn analyze(
    source: &SourceBuffer,
    tree: &Tree,
    registry: &RuleRegistry,
    settings: &Settings,
) -> Vec<Finding> {
    let active: Vec<(&dyn Rule, crate::config::RuleConfig)> = registry
        .rules()
        .iter()
        .map(|r| (r.as_ref(), settings.rule(r.name())))
        .filter(|(_, config)| config.enabled)
        .collect();

    // Per-rule set of nodes the rule already fired on, for nesting
    // suppression of descendants.
    let mut flagged: Vec<HashSet<NodeId>> = vec![HashSet::new(); active.len()];
    let mut findings = Vec::new();

    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        for (idx, (rule, config)) in active.iter().enumerate() {
            if rule.suppress_nested()
                && tree.ancestors(node).any(|a| flagged[idx].contains(&a))
            {
                continue;
            }
            let ctx = RuleContext {
                source,
                tree,
                config,
            };
            let produced = rule.check_node(&ctx, node);
            if !produced.is_empty() {
                flagged[idx].insert(node);
                findings.extend(produced);
            }
        }
        for &child in tree.children(node).iter().rev() {
            stack.push(child);
        }
    }

    debug!(
        unit = source.path_str(),
        findings = findings.len(),
        "analyzed unit"
    );
    findings
}

/// Apply all of the findings' proposed edits to the source text.
///
/// Fails with [`OverlappingEditsError`] when two edits intersect; the
/// findings themselves remain valid and reportable in that case.
pub fn correct(
    source: &SourceBuffer,
    findings: &[Finding],
) -> Result<String, OverlappingEditsError> {
    let edits: Vec<Edit> = findings.iter().flat_map(|f| f.edits.clone()).collect();
    let set = EditSet::from_vec(edits)?;
    Ok(set.apply(source.as_str()))
}

/// The result of analyzing (and best-effort correcting) one unit.
#[derive(Debug)]
pub struct UnitOutcome {
    pub findings: Vec<Finding>,
    /// Corrected source, present when at least one edit applied cleanly.
    /// `None` when there was nothing to correct or the unit's edits
    /// conflicted (detection degrades gracefully before correction does).
    pub corrected: Option<String>,
}

/// Analyze one unit and apply its corrections.
pub fn check_unit(
    source: &SourceBuffer,
    tree: &Tree,
    registry: &RuleRegistry,
    settings: &Settings,
) -> UnitOutcome {
    let findings = analyze(source, tree, registry, settings);
    if findings.iter().all(|f| f.edits.is_empty()) {
        return UnitOutcome {
            findings,
            corrected: None,
        };
    }
    match correct(source, &findings) {
        Ok(text) => UnitOutcome {
            findings,
            corrected: Some(text),
        },
        Err(e) => {
            warn!(
                unit = source.path_str(),
                error = %e,
                "conflicting edits; reporting findings without correction"
            );
            UnitOutcome {
                findings,
                corrected: None,
            }
        }
    }
}

/// Process independent units in parallel. Registry, settings, and compiled
/// patterns are shared read-only; results come back in input order.
pub fn check_units(
    units: &[(SourceBuffer, Tree)],
    registry: &RuleRegistry,
    settings: &Settings,
) -> Vec<UnitOutcome> {
    units
        .par_iter()
        .map(|(source, tree)| check_unit(source, tree, registry, settings))
        .collect()
}
