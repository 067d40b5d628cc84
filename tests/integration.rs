//! End-to-end runs through the public API: build a unit, analyze it with
//! the default registry, apply corrections, and check the reported output.

use treecop::testutil::{BlockStyle, TreeWriter};
use treecop::{
    RuleRegistry, Settings, SourceBuffer, Tree, analyze, check_unit, check_units, correct,
};

fn registry() -> RuleRegistry {
    RuleRegistry::default_registry()
}

/// Settings with everything but the named rule disabled, optionally setting
/// its policy. Hosts do the same thing through YAML.
fn only(rule: &str, policy: Option<&str>) -> Settings {
    let mut settings = Settings::new();
    for name in registry().names() {
        if name != rule {
            settings.disable(name);
        }
    }
    if let Some(policy) = policy {
        settings.set_policy(rule, policy);
    }
    settings
}

#[test]
fn docstring_spacing_end_to_end() {
    // describe '  #mymethod' do end
    let mut w = TreeWriter::new();
    let call = w.call(None, "describe", false, |w| vec![w.str_lit("  #mymethod")]);
    let blk = w.block(call, &[], BlockStyle::DoEnd, |_| Vec::new());
    let (source, tree) = w.finish(blk);
    assert_eq!(source.as_str(), "describe '  #mymethod' do end");

    let settings = only("Docstring/ExcessiveSpacing", None);
    let findings = analyze(&source, &tree, &registry(), &settings);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule_name, "Docstring/ExcessiveSpacing");
    assert_eq!(findings[0].message, "Excessive whitespace.");
    assert_eq!(source.text(findings[0].range), "  #mymethod");

    let corrected = correct(&source, &findings).unwrap();
    assert_eq!(corrected, "describe '#mymethod' do end");
}

#[test]
fn all_whitespace_docstring_corrects_to_empty() {
    // it '   ' do end
    let mut w = TreeWriter::new();
    let call = w.call(None, "it", false, |w| vec![w.str_lit("   ")]);
    let blk = w.block(call, &[], BlockStyle::DoEnd, |_| Vec::new());
    let (source, tree) = w.finish(blk);

    let settings = only("Docstring/ExcessiveSpacing", None);
    let outcome = check_unit(&source, &tree, &registry(), &settings);
    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.corrected.as_deref(), Some("it '' do end"));
}

#[test]
fn paren_style_end_to_end() {
    // create(:user) under omit_parentheses
    let mut w = TreeWriter::new();
    let call = w.call(None, "create", true, |w| vec![w.sym("user")]);
    let (source, tree) = w.finish(call);
    assert_eq!(source.as_str(), "create(:user)");

    let settings = only("Factory/ConsistentParentheses", Some("omit_parentheses"));
    let findings = analyze(&source, &tree, &registry(), &settings);
    assert_eq!(findings.len(), 1);
    assert_eq!(source.text(findings[0].range), "create");

    let corrected = correct(&source, &findings).unwrap();
    assert_eq!(corrected, "create :user");
}

#[test]
fn list_construction_end_to_end() {
    // 3.times { create :user, foo: rand(2), bar: 'baz' }
    let mut w = TreeWriter::new();
    let n = w.int(3);
    let times = w.method_on_noargs(n, "times");
    let blk = w.block(times, &[], BlockStyle::Brace, |w| {
        vec![w.call(None, "create", false, |w| {
            let a = w.sym("user");
            w.sep();
            let kw = w.kwargs(|w| {
                let p1 = w.pair("foo", |w| w.call(None, "rand", true, |w| vec![w.int(2)]));
                w.sep();
                let p2 = w.pair("bar", |w| w.str_lit("baz"));
                vec![p1, p2]
            });
            vec![a, kw]
        })]
    });
    let (source, tree) = w.finish(blk);
    assert_eq!(
        source.as_str(),
        "3.times { create :user, foo: rand(2), bar: 'baz' }"
    );

    let settings = only("Factory/ListConstruction", Some("prefer_list_method"));
    let findings = analyze(&source, &tree, &registry(), &settings);
    assert_eq!(findings.len(), 1);
    assert_eq!(source.text(findings[0].range), "3.times");

    let corrected = correct(&source, &findings).unwrap();
    assert_eq!(
        corrected,
        "create_list(:user, 3, bar: 'baz') do |user|\n  user.foo = rand(2)\nend"
    );
}

#[test]
fn nesting_suppression_flags_only_outer_call() {
    // create(:user, build(:account)) under omit_parentheses
    let mut w = TreeWriter::new();
    let call = w.call(None, "create", true, |w| {
        let a = w.sym("user");
        w.sep();
        let inner = w.call(None, "build", true, |w| vec![w.sym("account")]);
        vec![a, inner]
    });
    let (source, tree) = w.finish(call);

    let settings = only("Factory/ConsistentParentheses", Some("omit_parentheses"));
    let findings = analyze(&source, &tree, &registry(), &settings);
    assert_eq!(findings.len(), 1);
    assert_eq!(source.text(findings[0].range), "create");
}

#[test]
fn zero_findings_means_correction_is_identity() {
    let mut w = TreeWriter::new();
    let call = w.call(None, "create", true, |w| vec![w.sym("user")]);
    let blk = w.block(call, &[], BlockStyle::DoEnd, |_| Vec::new());
    let (source, tree) = w.finish(blk);

    // Default policies: require_parentheses, prefer_list_method.
    let findings = analyze(&source, &tree, &registry(), &Settings::new());
    assert!(findings.is_empty());
    assert_eq!(correct(&source, &findings).unwrap(), source.as_str());
}

#[test]
fn conflicting_rules_degrade_to_detection_only() {
    // Under default settings both rules fire on this unit: the list rule
    // replaces the whole block while the paren rule edits inside it. The
    // unit still reports all findings, just without corrected text.
    let mut w = TreeWriter::new();
    let n = w.int(3);
    let times = w.method_on_noargs(n, "times");
    let blk = w.block(times, &[], BlockStyle::Brace, |w| {
        vec![w.call(None, "create", false, |w| vec![w.sym("user")])]
    });
    let (source, tree) = w.finish(blk);

    let outcome = check_unit(&source, &tree, &registry(), &Settings::new());
    let rule_names: Vec<&str> = outcome
        .findings
        .iter()
        .map(|f| f.rule_name.as_str())
        .collect();
    assert!(rule_names.contains(&"Factory/ConsistentParentheses"));
    assert!(rule_names.contains(&"Factory/ListConstruction"));
    assert!(outcome.corrected.is_none());
}

#[test]
fn settings_load_from_yaml() {
    let settings = Settings::from_yaml(
        "Factory/ConsistentParentheses:\n  policy: omit_parentheses\nFactory/ListConstruction:\n  enabled: false\nDocstring/ExcessiveSpacing:\n  enabled: false\n",
    )
    .unwrap();

    let mut w = TreeWriter::new();
    let call = w.call(None, "build", true, |w| vec![w.sym("user")]);
    let (source, tree) = w.finish(call);

    let findings = analyze(&source, &tree, &registry(), &settings);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].message, "Prefer method call without parentheses");
}

#[test]
fn batch_processes_units_in_parallel() {
    let units: Vec<(SourceBuffer, Tree)> = (0..6)
        .map(|_| {
            let mut w = TreeWriter::new();
            let call = w.call(None, "create", true, |w| vec![w.sym("user")]);
            w.finish(call)
        })
        .collect();

    let registry = registry();
    let settings = only("Factory/ConsistentParentheses", Some("omit_parentheses"));
    let outcomes = check_units(&units, &registry, &settings);
    assert_eq!(outcomes.len(), 6);
    for outcome in &outcomes {
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.corrected.as_deref(), Some("create :user"));
    }
}

#[test]
fn findings_serialize_for_the_reporting_sink() {
    let mut w = TreeWriter::new();
    let call = w.call(None, "create", false, |w| vec![w.sym("user")]);
    let (source, tree) = w.finish(call);

    let settings = only("Factory/ConsistentParentheses", None);
    let findings = analyze(&source, &tree, &registry(), &settings);
    assert_eq!(findings.len(), 1);

    let json = serde_json::to_value(&findings).unwrap();
    assert_eq!(json[0]["rule_name"], "Factory/ConsistentParentheses");
    assert_eq!(json[0]["message"], "Prefer method call with parentheses");
    assert_eq!(json[0]["edits"][0]["replacement"], "(");
}
